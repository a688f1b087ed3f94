//! Sale row access.

use branchline_core::BranchCode;

use crate::backend::{BackendError, Query, TableApi, table};
use crate::models::{NewSale, Sale};

use super::{decode, decode_rows, encode};

/// Repository for the `sales` table.
pub struct SaleRepository<'a> {
    api: &'a dyn TableApi,
    token: &'a str,
}

impl<'a> SaleRepository<'a> {
    #[must_use]
    pub const fn new(api: &'a dyn TableApi, token: &'a str) -> Self {
        Self { api, token }
    }

    /// List the most recent sales. `scope` restricts to one branch.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the query fails.
    pub async fn recent(
        &self,
        scope: Option<&BranchCode>,
        limit: u32,
    ) -> Result<Vec<Sale>, BackendError> {
        let mut query = Query::new().order_desc("created_at").limit(limit);
        if let Some(code) = scope {
            query = query.eq("branch_id", code);
        }
        let rows = self.api.select(self.token, table::SALES, query).await?;
        decode_rows(rows)
    }

    /// Record a sale.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the insert fails.
    pub async fn create(&self, sale: &NewSale) -> Result<Sale, BackendError> {
        let row = self
            .api
            .insert(self.token, table::SALES, encode(sale)?)
            .await?;
        decode(row)
    }
}
