//! Core tenancy types, request contracts, and collaborator traits.

pub mod auth;
pub mod caller;
pub mod error;
pub mod identifier;
pub mod limits;
pub mod request;
pub mod resources;
pub mod services;
pub mod tenant;

pub use auth::*;
pub use caller::*;
pub use error::{Error, Result, TenancyErrorCode};
pub use identifier::*;
pub use request::*;
pub use services::*;
pub use tenant::*;
