//! Branch row access.

use branchline_core::{BranchCode, BranchId};

use crate::backend::{BackendError, Query, TableApi, table};
use crate::models::{Branch, NewBranch};

use super::{decode, decode_rows, encode};

/// Repository for the `branches` table.
pub struct BranchRepository<'a> {
    api: &'a dyn TableApi,
    token: &'a str,
}

impl<'a> BranchRepository<'a> {
    #[must_use]
    pub const fn new(api: &'a dyn TableApi, token: &'a str) -> Self {
        Self { api, token }
    }

    /// List branches, name-ordered. `scope` restricts to one code.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the query fails.
    pub async fn list(&self, scope: Option<&BranchCode>) -> Result<Vec<Branch>, BackendError> {
        let mut query = Query::new().order_asc("name");
        if let Some(code) = scope {
            query = query.eq("branch_code", code);
        }
        let rows = self.api.select(self.token, table::BRANCHES, query).await?;
        decode_rows(rows)
    }

    /// Create a branch.
    ///
    /// # Errors
    ///
    /// `BackendError::Conflict` when the branch code is taken.
    pub async fn create(&self, branch: &NewBranch) -> Result<Branch, BackendError> {
        let row = self
            .api
            .insert(self.token, table::BRANCHES, encode(branch)?)
            .await?;
        decode(row)
    }

    /// Update a branch's editable fields.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the patch fails.
    pub async fn update(&self, id: BranchId, branch: &NewBranch) -> Result<Branch, BackendError> {
        let row = self
            .api
            .update(
                self.token,
                table::BRANCHES,
                Query::new().eq("id", id),
                encode(branch)?,
            )
            .await?;
        decode(row)
    }

    /// Delete a branch.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the delete fails.
    pub async fn delete(&self, id: BranchId) -> Result<(), BackendError> {
        self.api
            .delete(self.token, table::BRANCHES, Query::new().eq("id", id))
            .await
    }
}
