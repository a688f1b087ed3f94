//! Session-stored types.
//!
//! The cookie session stores only what is needed to reattach to a
//! reconciliation controller after an eviction or restart: the
//! controller key and the latest refresh token. Access tokens stay in
//! the controller's published state and never touch the session store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The per-login record kept in the cookie session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    /// Key of this login's reconciliation controller in the registry.
    pub controller_key: Uuid,
    /// Latest known refresh token; rotated copies are written back by
    /// the auth extractor as the controller advances.
    pub refresh_token: String,
}

impl StoredSession {
    /// Mint a session record for a fresh sign-in.
    #[must_use]
    pub fn new(refresh_token: String) -> Self {
        Self {
            controller_key: Uuid::new_v4(),
            refresh_token,
        }
    }
}

/// Session keys for authentication data.
pub mod session_keys {
    /// Key for the stored login record.
    pub const BACKEND_SESSION: &str = "backend_session";
}
