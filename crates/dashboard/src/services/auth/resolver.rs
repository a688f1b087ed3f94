//! Idempotent profile get-or-create.
//!
//! The resolver is invoked from the session bootstrap and from every
//! auth event, so it must tolerate being run repeatedly and
//! concurrently for the same user:
//!
//! 1. Fetch the profile row; a hit is the common case.
//! 2. On the backend's explicit not-found code, insert the default
//!    profile for the deployment's configured default role.
//! 3. If that insert loses a creation race (unique-key conflict), the
//!    other writer's row is the answer - re-fetch and return it.
//!
//! Transient failures are retried with linear backoff up to a capped
//! attempt count; anything else fails terminally and the caller settles
//! the published state with the error.

use std::sync::Arc;
use std::time::Duration;

use branchline_core::{Role, UserId};

use crate::backend::{BackendError, TableApi};
use crate::data::ProfileRepository;
use crate::models::Profile;

use super::ResolveError;

/// Profile get-or-create with race recovery and capped retries.
#[derive(Clone)]
pub struct ProfileResolver {
    tables: Arc<dyn TableApi>,
    default_role: Role,
    max_attempts: u32,
    backoff: Duration,
}

impl ProfileResolver {
    /// Backoff unit between attempts; attempt `n` waits `n * BACKOFF`.
    const BACKOFF: Duration = Duration::from_millis(200);

    #[must_use]
    pub fn new(tables: Arc<dyn TableApi>, default_role: Role, max_attempts: u32) -> Self {
        Self {
            tables,
            default_role,
            max_attempts: max_attempts.max(1),
            backoff: Self::BACKOFF,
        }
    }

    /// Resolve the profile for `user_id`, creating the default row if
    /// none exists.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] once retries are exhausted or a
    /// non-transient backend failure occurs.
    pub async fn resolve(&self, token: &str, user_id: UserId) -> Result<Profile, ResolveError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_resolve(token, user_id).await {
                Ok(profile) => return Ok(profile),
                Err(source) if source.is_transient() && attempt < self.max_attempts => {
                    tracing::warn!(
                        %user_id,
                        attempt,
                        error = %source,
                        "transient profile resolution failure, retrying"
                    );
                    tokio::time::sleep(self.backoff * attempt).await;
                }
                Err(source) => {
                    return Err(ResolveError {
                        attempts: attempt,
                        source,
                    });
                }
            }
        }
    }

    /// One fetch / create / conflict-recover pass.
    async fn try_resolve(&self, token: &str, user_id: UserId) -> Result<Profile, BackendError> {
        let repo = ProfileRepository::new(self.tables.as_ref(), token);

        match repo.find(user_id).await {
            Ok(profile) => Ok(profile),
            Err(BackendError::NotFound) => {
                let fresh = Profile::new_default(user_id, self.default_role);
                match repo.create(&fresh).await {
                    Ok(profile) => {
                        tracing::info!(%user_id, role = %fresh.role, "created default profile");
                        Ok(profile)
                    }
                    // A concurrent resolution created the row between our
                    // fetch and insert; theirs is authoritative.
                    Err(BackendError::Conflict(_)) => repo.find(user_id).await,
                    Err(other) => Err(other),
                }
            }
            Err(other) => Err(other),
        }
    }
}

impl std::fmt::Debug for ProfileResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileResolver")
            .field("default_role", &self.default_role)
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}
