//! Inventory row access.

use branchline_core::{BranchCode, ItemId};

use crate::backend::{BackendError, Query, TableApi, table};
use crate::models::{InventoryItem, NewInventoryItem};

use super::{decode, decode_rows, encode};

/// Repository for the `inventory` table.
pub struct InventoryRepository<'a> {
    api: &'a dyn TableApi,
    token: &'a str,
}

impl<'a> InventoryRepository<'a> {
    #[must_use]
    pub const fn new(api: &'a dyn TableApi, token: &'a str) -> Self {
        Self { api, token }
    }

    /// List items, newest first. `scope` restricts to one branch.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the query fails.
    pub async fn list(
        &self,
        scope: Option<&BranchCode>,
    ) -> Result<Vec<InventoryItem>, BackendError> {
        let mut query = Query::new().order_desc("created_at");
        if let Some(code) = scope {
            query = query.eq("branch_id", code);
        }
        let rows = self.api.select(self.token, table::INVENTORY, query).await?;
        decode_rows(rows)
    }

    /// Fetch one item by id.
    ///
    /// # Errors
    ///
    /// `BackendError::NotFound` when the id is unknown.
    pub async fn find(&self, id: ItemId) -> Result<InventoryItem, BackendError> {
        let row = self
            .api
            .select_one(self.token, table::INVENTORY, Query::new().eq("id", id))
            .await?;
        decode(row)
    }

    /// Create an item.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the insert fails.
    pub async fn create(&self, item: &NewInventoryItem) -> Result<InventoryItem, BackendError> {
        let row = self
            .api
            .insert(self.token, table::INVENTORY, encode(item)?)
            .await?;
        decode(row)
    }

    /// Update an item's editable fields.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the patch fails.
    pub async fn update(
        &self,
        id: ItemId,
        item: &NewInventoryItem,
    ) -> Result<InventoryItem, BackendError> {
        let row = self
            .api
            .update(
                self.token,
                table::INVENTORY,
                Query::new().eq("id", id),
                encode(item)?,
            )
            .await?;
        decode(row)
    }

    /// Delete an item.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the delete fails.
    pub async fn delete(&self, id: ItemId) -> Result<(), BackendError> {
        self.api
            .delete(self.token, table::INVENTORY, Query::new().eq("id", id))
            .await
    }
}
