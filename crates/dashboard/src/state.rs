//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::{AuthApi, BackendClient, TableApi};
use crate::config::DashboardConfig;
use crate::services::{ControllerRegistry, ControllerSettings};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The backend capabilities are held as
/// trait objects so tests can construct the whole application around an
/// in-process fake backend.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DashboardConfig,
    auth: Arc<dyn AuthApi>,
    tables: Arc<dyn TableApi>,
    sessions: ControllerRegistry,
}

impl AppState {
    /// Create application state backed by the real hosted backend.
    #[must_use]
    pub fn new(config: DashboardConfig) -> Self {
        let client = BackendClient::new(&config.backend);
        Self::with_backend(config, Arc::new(client.clone()), Arc::new(client))
    }

    /// Create application state with injected backend capabilities.
    ///
    /// This is the seam the integration tests use to run the full
    /// application against a fake backend.
    #[must_use]
    pub fn with_backend(
        config: DashboardConfig,
        auth: Arc<dyn AuthApi>,
        tables: Arc<dyn TableApi>,
    ) -> Self {
        let settings = ControllerSettings::from(&config.auth);
        let sessions = ControllerRegistry::new(Arc::clone(&auth), Arc::clone(&tables), settings);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                auth,
                tables,
                sessions,
            }),
        }
    }

    /// Get a reference to the dashboard configuration.
    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    /// Get the auth capability of the hosted backend.
    #[must_use]
    pub fn auth(&self) -> &Arc<dyn AuthApi> {
        &self.inner.auth
    }

    /// Get the table capability of the hosted backend.
    #[must_use]
    pub fn tables(&self) -> &Arc<dyn TableApi> {
        &self.inner.tables
    }

    /// Get the per-login controller registry.
    #[must_use]
    pub fn sessions(&self) -> &ControllerRegistry {
        &self.inner.sessions
    }
}
