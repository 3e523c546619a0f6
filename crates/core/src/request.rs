//! Request contracts and the route table.
//!
//! Every operation is described by a request contract type. The route table
//! records, per method and path, whether that contract needs a tenant. A
//! descriptor can only be marked tenant-requiring through
//! [`RouteDescriptor::tenanted`], which is bounded on [`TenantedRequest`].

use http::Method;
use serde::Serialize;

use crate::error::{Error, Result};

/// HTTP method of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl OperationMethod {
    pub fn as_method(&self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Patch => Method::PATCH,
            Self::Delete => Method::DELETE,
        }
    }
}

/// Who may call an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    /// No credentials needed
    Anonymous,
    /// Requires an authenticated caller
    Token,
}

/// A request contract bound to one route.
pub trait WebRequest {
    type Response: Serialize;

    const ROUTE: &'static str;
    const METHOD: OperationMethod;
    const ACCESS: AccessType = AccessType::Token;
    /// Only registered in builds with testing endpoints
    const TESTING_ONLY: bool = false;
}

/// A request contract that operates within an organization.
pub trait TenantedRequest: WebRequest {
    /// Organization id carried in the contract itself, if any.
    fn organization_id(&self) -> Option<&str>;
}

/// Metadata for one registered route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    /// Contract type name, for logs
    pub operation: &'static str,
    pub method: Method,
    pub path: &'static str,
    pub access: AccessType,
    pub requires_tenant: bool,
    pub testing_only: bool,
}

impl RouteDescriptor {
    pub fn untenanted<R: WebRequest>() -> Self {
        Self::describe::<R>(false)
    }

    pub fn tenanted<R: TenantedRequest>() -> Self {
        Self::describe::<R>(true)
    }

    fn describe<R: WebRequest>(requires_tenant: bool) -> Self {
        Self {
            operation: short_type_name::<R>(),
            method: R::METHOD.as_method(),
            path: R::ROUTE,
            access: R::ACCESS,
            requires_tenant,
            testing_only: R::TESTING_ONLY,
        }
    }
}

fn short_type_name<T>() -> &'static str {
    let name = std::any::type_name::<T>();
    name.rsplit("::").next().unwrap_or(name)
}

/// All registered routes, resolved at startup.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route. Each method and path pair may be registered once.
    pub fn insert(&mut self, descriptor: RouteDescriptor) -> Result<()> {
        if self.find(&descriptor.method, descriptor.path).is_some() {
            return Err(Error::internal(format!(
                "route {} {} is already registered",
                descriptor.method, descriptor.path
            )));
        }

        self.routes.push(descriptor);
        Ok(())
    }

    /// Look up a route by method and matched path template.
    ///
    /// `HEAD` resolves to the `GET` route, since axum serves it with the
    /// `GET` handler.
    pub fn find(&self, method: &Method, path: &str) -> Option<&RouteDescriptor> {
        let method = if *method == Method::HEAD {
            Method::GET
        } else {
            method.clone()
        };
        self.routes
            .iter()
            .find(|route| route.method == method && route.path == path)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteDescriptor> {
        self.routes.iter()
    }
}
