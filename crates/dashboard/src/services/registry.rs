//! Per-login controller registry.
//!
//! Each login session owns one [`SessionController`]; the registry maps
//! the controller key stored in the cookie session to the live
//! controller instance. Entries are capacity- and idle-bounded: an
//! evicted controller is rebuilt from the session's stored refresh
//! token on the next request, which re-runs the bootstrap pipeline.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use uuid::Uuid;

use crate::backend::{AuthApi, TableApi};

use super::auth::{ControllerSettings, SessionController};

/// Idle lifetime of a cached controller.
const CONTROLLER_IDLE_TTL: Duration = Duration::from_secs(30 * 60);
/// Upper bound on concurrently cached logins.
const CONTROLLER_CAPACITY: u64 = 10_000;

/// Registry of live reconciliation controllers.
#[derive(Clone)]
pub struct ControllerRegistry {
    controllers: Cache<Uuid, SessionController>,
    auth: Arc<dyn AuthApi>,
    tables: Arc<dyn TableApi>,
    settings: ControllerSettings,
}

impl ControllerRegistry {
    #[must_use]
    pub fn new(
        auth: Arc<dyn AuthApi>,
        tables: Arc<dyn TableApi>,
        settings: ControllerSettings,
    ) -> Self {
        let controllers = Cache::builder()
            .max_capacity(CONTROLLER_CAPACITY)
            .time_to_idle(CONTROLLER_IDLE_TTL)
            .build();

        Self {
            controllers,
            auth,
            tables,
            settings,
        }
    }

    /// Fetch the controller for a login, rebuilding and re-initializing
    /// it from the stored refresh token when absent.
    pub async fn controller_for(
        &self,
        key: Uuid,
        stored_refresh_token: Option<String>,
    ) -> SessionController {
        self.controllers
            .get_with(key, async {
                let controller = SessionController::new(
                    Arc::clone(&self.auth),
                    Arc::clone(&self.tables),
                    self.settings.clone(),
                );
                controller.initialize(stored_refresh_token);
                controller
            })
            .await
    }

    /// Register a freshly signed-in controller under a new key.
    pub async fn insert(&self, key: Uuid, controller: SessionController) {
        self.controllers.insert(key, controller).await;
    }

    /// Build a controller without caching it (sign-in flow, before the
    /// session cookie exists).
    #[must_use]
    pub fn build_controller(&self) -> SessionController {
        SessionController::new(
            Arc::clone(&self.auth),
            Arc::clone(&self.tables),
            self.settings.clone(),
        )
    }

    /// Drop a login's controller (logout).
    pub async fn remove(&self, key: Uuid) {
        self.controllers.invalidate(&key).await;
    }
}
