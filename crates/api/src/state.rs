//! Application state shared across handlers and middleware.

use std::sync::Arc;
use std::time::Duration;

use host_core::{
    CallerContextFactory, EndUsersService, Error, IdentifierFactory, IntrospectionRequest,
    IntrospectionResponse, OrganizationsService, PrefixedIdentifierFactory, RouteTable,
};
use moka::future::Cache;
use tracing::{debug, warn};

use crate::detector::{RequestTenantDetective, TenantDetective};
use crate::middleware::auth::ExtensionCallerContextFactory;
use crate::middleware::tenancy::TenancyResolver;

/// Cache TTL for token introspection (30 seconds).
const AUTH_CACHE_TTL: Duration = Duration::from_secs(30);

/// Maximum cache entries.
const AUTH_CACHE_MAX_CAPACITY: u64 = 10_000;

/// Identity service client.
///
/// Calls `/tokens/introspect` to turn a bearer token into a caller id.
/// Caches verdicts for 30 seconds to reduce load on the identity service.
#[derive(Clone)]
pub struct AuthClient {
    /// Identity service URL (e.g., "http://identity:8080")
    base_url: String,
    http_client: reqwest::Client,
    /// Token -> verdict
    cache: Cache<String, IntrospectionResponse>,
    /// Whether to use mock mode (for development and tests)
    mock_mode: bool,
}

impl AuthClient {
    /// Creates a new auth client. An empty URL or `mock` enables mock mode.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, Error> {
        let base_url = base_url.into();
        let mock_mode = base_url.is_empty() || base_url == "mock";

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| Error::internal(format!("Failed to create HTTP client: {}", e)))?,
            cache: Cache::builder()
                .max_capacity(AUTH_CACHE_MAX_CAPACITY)
                .time_to_live(AUTH_CACHE_TTL)
                .build(),
            mock_mode,
        })
    }

    /// A client that trusts every token as its own caller id.
    pub fn mock() -> Self {
        Self {
            base_url: String::new(),
            http_client: reqwest::Client::new(),
            cache: Cache::builder()
                .max_capacity(AUTH_CACHE_MAX_CAPACITY)
                .time_to_live(AUTH_CACHE_TTL)
                .build(),
            mock_mode: true,
        }
    }

    pub fn is_mock(&self) -> bool {
        self.mock_mode
    }

    /// Introspect a bearer token.
    ///
    /// Returns the cached verdict if available, otherwise calls the identity service.
    pub async fn introspect(&self, token: &str) -> Result<IntrospectionResponse, Error> {
        if let Some(cached) = self.cache.get(token).await {
            debug!("Auth cache hit");
            return Ok(cached);
        }

        let response = if self.mock_mode {
            debug!("Using mock token introspection");
            IntrospectionResponse::active(token)
        } else {
            self.remote_introspect(token).await?
        };

        self.cache.insert(token.to_string(), response.clone()).await;

        Ok(response)
    }

    async fn remote_introspect(&self, token: &str) -> Result<IntrospectionResponse, Error> {
        let url = format!("{}/tokens/introspect", self.base_url);

        debug!(url = %url, "Calling identity service");

        let response = self
            .http_client
            .post(&url)
            .json(&IntrospectionRequest::new(token))
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Identity service request failed");
                Error::service_unavailable(format!("Identity service unavailable: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Identity service returned error");
            return Err(Error::service_unavailable(format!(
                "Identity service returned {}",
                status
            )));
        }

        response.json().await.map_err(|e| {
            warn!(error = %e, "Failed to parse introspection response");
            Error::service_unavailable(format!("Invalid introspection response: {}", e))
        })
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Tenancy decisions over the collaborators
    pub tenancy: TenancyResolver,
    pub caller_factory: Arc<dyn CallerContextFactory>,
    pub tenant_detective: Arc<dyn TenantDetective>,
    /// Filled in by [`crate::router`] once every operation is registered
    pub routes: Arc<RouteTable>,
    pub auth_client: AuthClient,
}

impl AppState {
    /// State with the default detective, identifier format, and caller factory.
    pub fn new(
        end_users: Arc<dyn EndUsersService>,
        organizations: Arc<dyn OrganizationsService>,
        auth_client: AuthClient,
    ) -> Self {
        Self::with_collaborators(
            Arc::new(PrefixedIdentifierFactory::new()),
            end_users,
            organizations,
            Arc::new(ExtensionCallerContextFactory),
            Arc::new(RequestTenantDetective::new()),
            auth_client,
        )
    }

    pub fn with_collaborators(
        identifiers: Arc<dyn IdentifierFactory>,
        end_users: Arc<dyn EndUsersService>,
        organizations: Arc<dyn OrganizationsService>,
        caller_factory: Arc<dyn CallerContextFactory>,
        tenant_detective: Arc<dyn TenantDetective>,
        auth_client: AuthClient,
    ) -> Self {
        Self {
            tenancy: TenancyResolver::new(identifiers, end_users, organizations),
            caller_factory,
            tenant_detective,
            routes: Arc::new(RouteTable::new()),
            auth_client,
        }
    }
}
