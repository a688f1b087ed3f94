//! Client for the hosted backend-as-a-service.
//!
//! The hosted service owns authentication (email/password, sessions),
//! row storage, and row-level security. This module is the only place
//! that knows its wire dialect; everything above it talks to the two
//! capability traits so tests can substitute an in-process fake.
//!
//! # Capability surface
//!
//! - [`AuthApi`] - session issuance and revocation
//! - [`TableApi`] - row reads and writes against named tables
//!
//! Every data request carries two credentials: the project's
//! publishable key (`apikey` header, identifies the project) and a
//! bearer token (the signed-in user's access token, or the service key
//! in operational tooling). Row-level security is evaluated against the
//! bearer token, which is why the token is a per-call argument rather
//! than client state.

mod auth;
mod error;
mod tables;
mod types;

pub use error::BackendError;
pub use tables::Query;
pub use types::{AuthUser, BackendSession, SignUpOutcome};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::BackendConfig;

/// Tables the dashboard reads and writes.
pub mod table {
    pub const USER_PROFILES: &str = "user_profiles";
    pub const BRANCHES: &str = "branches";
    pub const EMPLOYEES: &str = "employees";
    pub const INVENTORY: &str = "inventory";
    pub const SALES: &str = "sales";
}

/// Session issuance and revocation.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange a stored refresh token for a live session.
    ///
    /// Returns `Ok(None)` when the token is rejected (expired, revoked,
    /// already rotated) - that is a signed-out state, not a fault.
    ///
    /// # Errors
    ///
    /// Returns an error only for transport failures or unexpected
    /// backend responses.
    async fn get_session(
        &self,
        refresh_token: &str,
    ) -> Result<Option<BackendSession>, BackendError>;

    /// Password grant.
    ///
    /// # Errors
    ///
    /// `BackendError::Auth` for bad credentials,
    /// `BackendError::EmailNotConfirmed` for unverified accounts.
    async fn sign_in(&self, email: &str, password: &str) -> Result<BackendSession, BackendError>;

    /// Register a new account. The outcome's session is absent while
    /// email verification is pending.
    ///
    /// # Errors
    ///
    /// `BackendError::Auth` when the address is already registered or
    /// the password is rejected.
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, BackendError>;

    /// Revoke the session behind an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the revocation for any
    /// reason other than the token already being dead.
    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError>;

    /// Readiness probe against the auth endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend is unreachable or unhealthy.
    async fn health(&self) -> Result<(), BackendError>;
}

/// Row reads and writes against named tables.
///
/// Rows cross this boundary as [`serde_json::Value`]; the typed
/// repositories in [`crate::data`] deserialize on top. Keeping the trait
/// untyped keeps it dyn-safe, which is what lets a fake backend be
/// injected wholesale.
#[async_trait]
pub trait TableApi: Send + Sync {
    /// Fetch all rows matching `query`.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the request or decode fails.
    async fn select(
        &self,
        token: &str,
        table: &str,
        query: Query,
    ) -> Result<Vec<Value>, BackendError>;

    /// Fetch exactly one row.
    ///
    /// # Errors
    ///
    /// `BackendError::NotFound` (explicit backend code) when no row
    /// matches; other [`BackendError`] variants for everything else.
    async fn select_one(
        &self,
        token: &str,
        table: &str,
        query: Query,
    ) -> Result<Value, BackendError>;

    /// Insert a row and return the stored representation.
    ///
    /// # Errors
    ///
    /// `BackendError::Conflict` on unique-key violations; other
    /// [`BackendError`] variants for everything else.
    async fn insert(&self, token: &str, table: &str, row: Value) -> Result<Value, BackendError>;

    /// Patch the rows matching `query` and return the representation.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the request or decode fails.
    async fn update(
        &self,
        token: &str,
        table: &str,
        query: Query,
        patch: Value,
    ) -> Result<Value, BackendError>;

    /// Delete the rows matching `query`.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the request fails.
    async fn delete(&self, token: &str, table: &str, query: Query) -> Result<(), BackendError>;
}

// =============================================================================
// BackendClient
// =============================================================================

/// HTTP client for the hosted backend.
///
/// Cheaply cloneable via `Arc`. Implements both capability traits.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
    publishable_key: String,
}

impl BackendClient {
    /// Create a new client from backend configuration.
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialized, which only
    /// happens in broken build environments.
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("reqwest client construction is infallible with default TLS");

        Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.url.trim_end_matches('/').to_owned(),
                publishable_key: config.publishable_key.clone(),
            }),
        }
    }

    /// Build a request against the auth endpoint (`/auth/v1/...`).
    fn auth_request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/auth/v1/{path}", self.inner.base_url);
        self.inner
            .client
            .request(method, url)
            .header("apikey", &self.inner.publishable_key)
    }

    /// Build a request against the data endpoint (`/rest/v1/<table>`),
    /// authorized as `token`.
    fn data_request(
        &self,
        method: reqwest::Method,
        table: &str,
        token: &str,
    ) -> reqwest::RequestBuilder {
        let url = format!("{}/rest/v1/{table}", self.inner.base_url);
        self.inner
            .client
            .request(method, url)
            .header("apikey", &self.inner.publishable_key)
            .bearer_auth(token)
    }
}
