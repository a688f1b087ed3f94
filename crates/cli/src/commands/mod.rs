//! CLI subcommands.

pub mod check;
pub mod profile;
pub mod seed;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use branchline_dashboard::backend::BackendClient;
use branchline_dashboard::config::BackendConfig;

/// Errors shared by the CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid {0}: {1}")]
    Invalid(&'static str, String),
}

/// Service-authenticated connection to the hosted backend.
///
/// The service key bypasses row-level security, which is exactly what
/// provisioning and seeding need - and why it must never be configured
/// for the dashboard process itself.
pub struct ServiceConnection {
    pub client: BackendClient,
    service_key: SecretString,
}

impl ServiceConnection {
    /// Build the connection from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `CliError::MissingEnvVar` when the backend URL, the
    /// publishable key, or the service key is absent.
    pub fn from_env() -> Result<Self, CliError> {
        let _ = dotenvy::dotenv();

        let url = require_env("BRANCHLINE_BACKEND_URL")?;
        let publishable_key = require_env("BRANCHLINE_PUBLISHABLE_KEY")?;
        let service_key = SecretString::from(require_env("BRANCHLINE_SERVICE_KEY")?);

        let config = BackendConfig {
            url,
            publishable_key,
            request_timeout_secs: 10,
        };

        Ok(Self {
            client: BackendClient::new(&config),
            service_key,
        })
    }

    /// The bearer token for service-authenticated requests.
    #[must_use]
    pub fn token(&self) -> &str {
        self.service_key.expose_secret()
    }
}

fn require_env(key: &str) -> Result<String, CliError> {
    std::env::var(key).map_err(|_| CliError::MissingEnvVar(key.to_string()))
}
