//! Telemetry for the tenancy host: structured logging, collaborator health,
//! and in-process counters for tenancy outcomes.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
