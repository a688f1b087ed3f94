//! Profile row access.

use branchline_core::{BranchCode, Role, UserId};
use serde_json::json;

use crate::backend::{BackendError, Query, TableApi, table};
use crate::models::Profile;

use super::{decode, encode};

/// Repository for the `user_profiles` table.
pub struct ProfileRepository<'a> {
    api: &'a dyn TableApi,
    token: &'a str,
}

impl<'a> ProfileRepository<'a> {
    #[must_use]
    pub const fn new(api: &'a dyn TableApi, token: &'a str) -> Self {
        Self { api, token }
    }

    /// Fetch the profile for a user identifier.
    ///
    /// # Errors
    ///
    /// `BackendError::NotFound` when no profile row exists (the signal
    /// that triggers default-profile creation); other variants for
    /// genuine failures.
    pub async fn find(&self, id: UserId) -> Result<Profile, BackendError> {
        let row = self
            .api
            .select_one(self.token, table::USER_PROFILES, Query::new().eq("id", id))
            .await?;
        decode(row)
    }

    /// Insert a profile row.
    ///
    /// # Errors
    ///
    /// `BackendError::Conflict` when a concurrent writer created the
    /// row first; other variants for genuine failures.
    pub async fn create(&self, profile: &Profile) -> Result<Profile, BackendError> {
        let row = self
            .api
            .insert(self.token, table::USER_PROFILES, encode(profile)?)
            .await?;
        decode(row)
    }

    /// Overwrite a profile's role and branch assignment.
    ///
    /// Administrative path (CLI provisioning), not part of the
    /// reconciliation flow.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the patch fails.
    pub async fn set_role(
        &self,
        id: UserId,
        role: Role,
        branch: Option<&BranchCode>,
    ) -> Result<Profile, BackendError> {
        let patch = json!({
            "role": role,
            "branch_id": branch,
        });
        let row = self
            .api
            .update(
                self.token,
                table::USER_PROFILES,
                Query::new().eq("id", id),
                patch,
            )
            .await?;
        decode(row)
    }
}
