//! Dashboard configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BRANCHLINE_BACKEND_URL` - Base URL of the hosted backend project
//! - `BRANCHLINE_PUBLISHABLE_KEY` - Publishable (anon) API key
//! - `BRANCHLINE_BASE_URL` - Public URL of the dashboard
//!
//! ## Optional
//! - `BRANCHLINE_HOST` - Bind address (default: 127.0.0.1)
//! - `BRANCHLINE_PORT` - Listen port (default: 3000)
//! - `BRANCHLINE_DEFAULT_ROLE` - Role given to lazily-created profiles
//!   (default: `branch_manager`; set to `admin` only with sign-off)
//! - `BRANCHLINE_RESOLVE_TIMEOUT_SECS` - Upper bound before a pending
//!   session resolution is forced to settle (default: 5)
//! - `BRANCHLINE_BACKEND_TIMEOUT_SECS` - Per-request backend timeout
//!   (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

use branchline_core::Role;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure key in {0}: {1}")]
    InsecureKey(String, String),
}

/// Dashboard application configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the dashboard
    pub base_url: String,
    /// Hosted backend configuration
    pub backend: BackendConfig,
    /// Session/profile reconciliation tuning
    pub auth: AuthConfig,
    /// Sentry error tracking configuration
    pub sentry: SentryConfig,
}

/// Hosted backend connection configuration.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the backend project (e.g. `https://proj.example.io`)
    pub url: String,
    /// Publishable API key; identifies the project, safe to expose
    pub publishable_key: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Reconciliation controller tuning.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Role assigned when a signed-in user has no profile row yet.
    ///
    /// Defaults to the least-privileged role; see DESIGN.md for why
    /// default-to-admin was rejected.
    pub default_role: Role,
    /// Upper bound before a pending resolution is forced to settle.
    pub resolve_timeout: Duration,
    /// Maximum profile resolution attempts for transient failures.
    pub resolve_attempts: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            default_role: Role::BranchManager,
            resolve_timeout: Duration::from_secs(5),
            resolve_attempts: 3,
        }
    }
}

/// Sentry error tracking configuration.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl DashboardConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid,
    /// or if the publishable key fails validation (placeholder
    /// detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("BRANCHLINE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BRANCHLINE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("BRANCHLINE_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("BRANCHLINE_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("BRANCHLINE_BASE_URL")?;

        let backend = BackendConfig::from_env()?;
        let auth = AuthConfig::from_env()?;
        let sentry = SentryConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            backend,
            auth,
            sentry,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = get_required_env("BRANCHLINE_BACKEND_URL")?;
        let publishable_key = get_required_env("BRANCHLINE_PUBLISHABLE_KEY")?;
        validate_key_strength(&publishable_key, "BRANCHLINE_PUBLISHABLE_KEY")?;

        let request_timeout_secs = get_env_or_default("BRANCHLINE_BACKEND_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar(
                    "BRANCHLINE_BACKEND_TIMEOUT_SECS".to_string(),
                    e.to_string(),
                )
            })?;

        Ok(Self {
            url,
            publishable_key,
            request_timeout_secs,
        })
    }
}

impl AuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let default_role = get_env_or_default("BRANCHLINE_DEFAULT_ROLE", "branch_manager")
            .parse::<Role>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("BRANCHLINE_DEFAULT_ROLE".to_string(), e.to_string())
            })?;

        let resolve_timeout_secs = get_env_or_default("BRANCHLINE_RESOLVE_TIMEOUT_SECS", "5")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar(
                    "BRANCHLINE_RESOLVE_TIMEOUT_SECS".to_string(),
                    e.to_string(),
                )
            })?;

        Ok(Self {
            default_role,
            resolve_timeout: Duration::from_secs(resolve_timeout_secs),
            ..Self::default()
        })
    }
}

impl SentryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let sample_rate = get_env_or_default("SENTRY_SAMPLE_RATE", "1.0")
            .parse::<f32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SENTRY_SAMPLE_RATE".to_string(), e.to_string())
            })?;
        let traces_sample_rate = get_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")
            .parse::<f32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SENTRY_TRACES_SAMPLE_RATE".to_string(), e.to_string())
            })?;

        Ok(Self {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate,
            traces_sample_rate,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that an API key is not a placeholder and has real entropy.
///
/// The publishable key is not a secret, but a placeholder value means
/// the deployment is pointed at nothing - fail fast at startup instead
/// of failing on the first backend call.
pub(crate) fn validate_key_strength(key: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = key.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureKey(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(key);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureKey(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Copy the key from the backend project settings."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_key_placeholder() {
        let result = validate_key_strength("your-publishable-key", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureKey(_, _))));
    }

    #[test]
    fn test_validate_key_low_entropy() {
        let result = validate_key_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureKey(_, _))));
    }

    #[test]
    fn test_validate_key_valid() {
        // JWT-shaped high-entropy value
        let result = validate_key_strength("eyJhbGciOiJIUzI1NiJ9.x7Kq2mNfR8vLw3ZpYdTb", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = DashboardConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            backend: BackendConfig {
                url: "https://proj.test.io".to_string(),
                publishable_key: "eyJhbGciOiJIUzI1NiJ9.k3yM4t3r14l".to_string(),
                request_timeout_secs: 10,
            },
            auth: AuthConfig::default(),
            sentry: SentryConfig::default(),
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_auth_defaults_are_conservative() {
        let auth = AuthConfig::default();
        assert_eq!(auth.default_role, Role::BranchManager);
        assert_eq!(auth.resolve_timeout, Duration::from_secs(5));
        assert_eq!(auth.resolve_attempts, 3);
    }
}
