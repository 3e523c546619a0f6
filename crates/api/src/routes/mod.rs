//! API routes.
//!
//! Operations are registered through [`OperationRouter`], which records each
//! request contract in the [`RouteTable`] the middleware consults. Only
//! [`OperationRouter::tenanted`] can mark a route as needing a tenant.

pub mod health;
pub mod operations;

use std::sync::Arc;

use axum::{
    handler::Handler,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, on, MethodFilter},
    Router,
};
use host_core::{OperationMethod, Result, RouteDescriptor, RouteTable, TenantedRequest, WebRequest};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info};

use crate::middleware::{authenticate, authorize, multi_tenancy, request_cancellation};
use crate::state::AppState;
use operations::{
    AuthorizeByNothingTestingOnlyRequest, GetOrganizationSettingsRequest,
    GetTenancyTestingOnlyRequest, RecordCrashRequest,
};

/// Builds the operation routes together with their route table.
pub struct OperationRouter {
    router: Router<AppState>,
    routes: RouteTable,
}

impl OperationRouter {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            routes: RouteTable::new(),
        }
    }

    /// Register an operation that never requires a tenant.
    pub fn untenanted<R, H, T>(self, handler: H) -> Result<Self>
    where
        R: WebRequest,
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.register(RouteDescriptor::untenanted::<R>(), R::METHOD, handler)
    }

    /// Register an operation that requires a tenant.
    pub fn tenanted<R, H, T>(self, handler: H) -> Result<Self>
    where
        R: TenantedRequest,
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.register(RouteDescriptor::tenanted::<R>(), R::METHOD, handler)
    }

    fn register<H, T>(
        mut self,
        descriptor: RouteDescriptor,
        method: OperationMethod,
        handler: H,
    ) -> Result<Self>
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        if descriptor.testing_only && !cfg!(feature = "testing-only") {
            debug!(operation = descriptor.operation, "Skipping testing-only operation");
            return Ok(self);
        }

        let path = descriptor.path;
        self.routes.insert(descriptor)?;
        self.router = self.router.route(path, on(method_filter(method), handler));
        Ok(self)
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn into_parts(self) -> (Router<AppState>, RouteTable) {
        (self.router, self.routes)
    }
}

impl Default for OperationRouter {
    fn default() -> Self {
        Self::new()
    }
}

fn method_filter(method: OperationMethod) -> MethodFilter {
    match method {
        OperationMethod::Get => MethodFilter::GET,
        OperationMethod::Post => MethodFilter::POST,
        OperationMethod::Put => MethodFilter::PUT,
        OperationMethod::Patch => MethodFilter::PATCH,
        OperationMethod::Delete => MethodFilter::DELETE,
    }
}

/// Every operation the host serves.
pub fn operation_routes() -> Result<OperationRouter> {
    OperationRouter::new()
        .untenanted::<RecordCrashRequest, _, _>(operations::record_crash)?
        .tenanted::<GetOrganizationSettingsRequest, _, _>(operations::get_organization_settings)?
        .untenanted::<AuthorizeByNothingTestingOnlyRequest, _, _>(operations::authorize_by_nothing)?
        .tenanted::<GetTenancyTestingOnlyRequest, _, _>(operations::get_tenancy)
}

/// Creates the API router.
///
/// Operation routes run cancellation, authentication, access, and
/// multi-tenancy in that order. Health routes skip all of them.
pub fn router(mut state: AppState) -> Result<Router> {
    let (operations, routes) = operation_routes()?.into_parts();
    info!(operations = routes.len(), "Registered operations");
    state.routes = Arc::new(routes);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Route layers run last-added first
    let operations = operations
        .route_layer(from_fn_with_state(state.clone(), multi_tenancy))
        .route_layer(from_fn_with_state(state.clone(), authorize))
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    let health = Router::new()
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .route("/metrics", get(health::metrics_handler));

    Ok(Router::new()
        .merge(operations)
        .merge(health)
        .layer(from_fn(request_cancellation))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}
