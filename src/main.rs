//! Tenancy Host
//!
//! Multi-tenant API host. Every operation request is authenticated, checked
//! against the operation's access type, and assigned a tenant before it
//! reaches its handler.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use api::{
    router, AppState, AuthClient, HttpEndUsersService, HttpOrganizationsService,
    InMemoryDirectory,
};
use host_core::{EndUsersService, OrganizationsService};
use telemetry::{health, init_tracing_from_env};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    /// Identity service URL for token introspection (`mock` to trust tokens)
    #[serde(default = "default_auth_url")]
    auth_url: String,

    /// End-users service URL (`mock` for the in-memory directory)
    #[serde(default = "default_end_users_url")]
    end_users_url: String,

    /// Organizations service URL (`mock` for the in-memory directory)
    #[serde(default = "default_organizations_url")]
    organizations_url: String,

    /// Credential the host presents to upstream services
    #[serde(default)]
    service_token: Option<String>,

    #[serde(default = "default_settings_cache_ttl_secs")]
    settings_cache_ttl_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_auth_url() -> String {
    "http://identity:8080".to_string()
}

fn default_end_users_url() -> String {
    "http://end-users:8080".to_string()
}

fn default_organizations_url() -> String {
    "http://organizations:8080".to_string()
}

fn default_settings_cache_ttl_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            auth_url: default_auth_url(),
            end_users_url: default_end_users_url(),
            organizations_url: default_organizations_url(),
            service_token: None,
            settings_cache_ttl_secs: default_settings_cache_ttl_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn is_mock(url: &str) -> bool {
    url.is_empty() || url == "mock"
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting Tenancy Host v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    info!(
        auth_url = %config.auth_url,
        end_users_url = %config.end_users_url,
        organizations_url = %config.organizations_url,
        "Loaded configuration"
    );

    let (end_users, organizations) = connect_services(&config).await?;

    let auth_client = AuthClient::new(config.auth_url.clone(), config.request_timeout())
        .context("Failed to create auth client")?;
    if auth_client.is_mock() {
        warn!("Auth client in mock mode: every bearer token is trusted as its caller id");
    }

    let state = AppState::new(end_users, organizations, auth_client);
    let app = router(state).context("Failed to register operations")?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // e.g. TENANCY__END_USERS_URL
        .add_source(
            config::Environment::with_prefix("TENANCY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Build the collaborators and record their health.
async fn connect_services(
    config: &Config,
) -> Result<(Arc<dyn EndUsersService>, Arc<dyn OrganizationsService>)> {
    let directory = Arc::new(InMemoryDirectory::new());

    let end_users: Arc<dyn EndUsersService> = if is_mock(&config.end_users_url) {
        warn!("End-users service in mock mode");
        health().end_users.set_healthy();
        directory.clone()
    } else {
        let service = HttpEndUsersService::new(
            &config.end_users_url,
            config.service_token.clone(),
            config.request_timeout(),
        )
        .context("Failed to create end-users client")?;

        match service.check_health().await {
            Ok(()) => {
                health().end_users.set_healthy();
                info!("End-users service: healthy");
            }
            Err(e) => {
                health().end_users.set_unhealthy(e.to_string());
                error!(error = %e, "End-users service: unhealthy");
            }
        }
        Arc::new(service)
    };

    let organizations: Arc<dyn OrganizationsService> = if is_mock(&config.organizations_url) {
        warn!("Organizations service in mock mode");
        health().organizations.set_healthy();
        directory
    } else {
        let service = HttpOrganizationsService::new(
            &config.organizations_url,
            config.service_token.clone(),
            config.request_timeout(),
            Duration::from_secs(config.settings_cache_ttl_secs),
        )
        .context("Failed to create organizations client")?;

        match service.check_health().await {
            Ok(()) => {
                health().organizations.set_healthy();
                info!("Organizations service: healthy");
            }
            Err(e) => {
                health().organizations.set_unhealthy(e.to_string());
                error!(error = %e, "Organizations service: unhealthy");
            }
        }
        Arc::new(service)
    };

    Ok((end_users, organizations))
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
