//! Employee row access.

use branchline_core::{BranchCode, EmployeeId};

use crate::backend::{BackendError, Query, TableApi, table};
use crate::models::{Employee, NewEmployee};

use super::{decode, decode_rows, encode};

/// Repository for the `employees` table.
pub struct EmployeeRepository<'a> {
    api: &'a dyn TableApi,
    token: &'a str,
}

impl<'a> EmployeeRepository<'a> {
    #[must_use]
    pub const fn new(api: &'a dyn TableApi, token: &'a str) -> Self {
        Self { api, token }
    }

    /// List employees, newest first. `scope` restricts to one branch.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the query fails.
    pub async fn list(&self, scope: Option<&BranchCode>) -> Result<Vec<Employee>, BackendError> {
        let mut query = Query::new().order_desc("created_at");
        if let Some(code) = scope {
            query = query.eq("branch_id", code);
        }
        let rows = self.api.select(self.token, table::EMPLOYEES, query).await?;
        decode_rows(rows)
    }

    /// Create an employee.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the insert fails.
    pub async fn create(&self, employee: &NewEmployee) -> Result<Employee, BackendError> {
        let row = self
            .api
            .insert(self.token, table::EMPLOYEES, encode(employee)?)
            .await?;
        decode(row)
    }

    /// Update an employee's editable fields.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the patch fails.
    pub async fn update(
        &self,
        id: EmployeeId,
        employee: &NewEmployee,
    ) -> Result<Employee, BackendError> {
        let row = self
            .api
            .update(
                self.token,
                table::EMPLOYEES,
                Query::new().eq("id", id),
                encode(employee)?,
            )
            .await?;
        decode(row)
    }

    /// Delete an employee.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the delete fails.
    pub async fn delete(&self, id: EmployeeId) -> Result<(), BackendError> {
        self.api
            .delete(self.token, table::EMPLOYEES, Query::new().eq("id", id))
            .await
    }
}
