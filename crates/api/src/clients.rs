//! HTTP clients for the end-users and organizations services.
//!
//! Every call is raced against the request's cancellation token. A 404 maps
//! to [`Error::NotFound`]; any other failure maps to
//! [`Error::ServiceUnavailable`]. Nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use host_core::{
    CallerContext, EndUserWithMemberships, EndUsersService, Error, OrganizationsService, Result,
    TenantSettings,
};
use moka::future::Cache;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// Header forwarding the caller id to upstream services.
pub const CALLER_ID_HEADER: &str = "X-Caller-Id";

/// Maximum cached tenant settings.
const SETTINGS_CACHE_MAX_CAPACITY: u64 = 10_000;

/// JSON client for one upstream service.
#[derive(Clone)]
pub struct ServiceClient {
    /// Service name, for logs and errors
    name: &'static str,
    base_url: Url,
    http_client: reqwest::Client,
    /// Host credential sent on every call
    service_token: Option<String>,
}

impl ServiceClient {
    pub fn new(
        name: &'static str,
        base_url: &str,
        service_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::internal(format!("Invalid {} URL '{}': {}", name, base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::internal(format!(
                "{} URL '{}' cannot be a base",
                name, base_url
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            name,
            base_url,
            http_client,
            service_token,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Append path segments to the base URL. Segments are percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// GET a JSON resource on behalf of `caller`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        caller: &CallerContext,
        segments: &[&str],
        cancellation: &CancellationToken,
    ) -> Result<T> {
        let url = self.endpoint(segments);

        let mut request = self.http_client.get(url.clone());
        if let Some(token) = &self.service_token {
            request = request.bearer_auth(token);
        }
        if let Some(caller_id) = caller.caller_id() {
            request = request.header(CALLER_ID_HEADER, caller_id);
        }

        debug!(service = self.name, url = %url, "Calling service");

        let response = tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(Error::Cancelled),
            response = request.send() => response.map_err(|e| {
                warn!(service = self.name, error = %e, "Service request failed");
                Error::service_unavailable(format!("{} unavailable: {}", self.name, e))
            })?,
        };

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::not_found(format!("{} has no resource at {}", self.name, url.path())));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(service = self.name, status = %status, body = %body, "Service returned error");
            return Err(Error::service_unavailable(format!(
                "{} returned {}",
                self.name, status
            )));
        }

        tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(Error::Cancelled),
            body = response.json::<T>() => body.map_err(|e| {
                warn!(service = self.name, error = %e, "Failed to parse service response");
                Error::service_unavailable(format!("Invalid {} response: {}", self.name, e))
            }),
        }
    }

    /// Probe `GET {base}/health`.
    pub async fn check_health(&self) -> Result<()> {
        let url = self.endpoint(&["health"]);
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::service_unavailable(format!("{}: {}", self.name, e)))?;

        if !response.status().is_success() {
            return Err(Error::service_unavailable(format!(
                "{} health returned {}",
                self.name,
                response.status()
            )));
        }
        Ok(())
    }
}

/// End-users service over HTTP.
///
/// `GET /private/users/{id}/memberships`. Not cached: membership changes must
/// take effect on the next request.
#[derive(Clone)]
pub struct HttpEndUsersService {
    client: ServiceClient,
}

impl HttpEndUsersService {
    pub fn new(base_url: &str, service_token: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: ServiceClient::new("end-users", base_url, service_token, timeout)?,
        })
    }

    pub async fn check_health(&self) -> Result<()> {
        self.client.check_health().await
    }
}

#[async_trait]
impl EndUsersService for HttpEndUsersService {
    async fn get_memberships(
        &self,
        caller: &CallerContext,
        user_id: &str,
        cancellation: &CancellationToken,
    ) -> Result<EndUserWithMemberships> {
        self.client
            .get_json(
                caller,
                &["private", "users", user_id, "memberships"],
                cancellation,
            )
            .await
    }
}

/// Organizations service over HTTP.
///
/// `GET /private/organizations/{id}/settings`, cached per tenant.
#[derive(Clone)]
pub struct HttpOrganizationsService {
    client: ServiceClient,
    cache: Cache<String, TenantSettings>,
}

impl HttpOrganizationsService {
    pub fn new(
        base_url: &str,
        service_token: Option<String>,
        timeout: Duration,
        cache_ttl: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: ServiceClient::new("organizations", base_url, service_token, timeout)?,
            cache: Cache::builder()
                .max_capacity(SETTINGS_CACHE_MAX_CAPACITY)
                .time_to_live(cache_ttl)
                .build(),
        })
    }

    pub async fn check_health(&self) -> Result<()> {
        self.client.check_health().await
    }
}

#[async_trait]
impl OrganizationsService for HttpOrganizationsService {
    async fn get_settings(
        &self,
        caller: &CallerContext,
        tenant_id: &str,
        cancellation: &CancellationToken,
    ) -> Result<TenantSettings> {
        if let Some(cached) = self.cache.get(tenant_id).await {
            debug!(tenant_id = %tenant_id, "Settings cache hit");
            return Ok(cached);
        }

        let settings: TenantSettings = self
            .client
            .get_json(
                caller,
                &["private", "organizations", tenant_id, "settings"],
                cancellation,
            )
            .await?;

        self.cache
            .insert(tenant_id.to_string(), settings.clone())
            .await;

        Ok(settings)
    }
}
