//! Row access against the hosted data endpoint.
//!
//! The data endpoint speaks a PostgREST-style dialect: filters are query
//! parameters (`branch_id=eq.NYC01`), writes return representations when
//! asked, and a single-object read reports a miss with an explicit error
//! code rather than an empty body.

use async_trait::async_trait;
use serde_json::Value;

use super::error::data_error;
use super::{BackendClient, BackendError, TableApi};

/// Media type that makes a select return exactly one object, with an
/// explicit error code when zero or several rows match.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

// =============================================================================
// Query builder
// =============================================================================

/// A small builder for row filters, ordering, and limits.
///
/// Only the operators the dashboard needs are modeled. The encoded form
/// matches the data endpoint's parameter dialect.
#[derive(Debug, Clone, Default)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `column = value`.
    #[must_use]
    pub fn eq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.params.push((column.to_owned(), format!("eq.{value}")));
        self
    }

    /// Sort ascending by `column`.
    #[must_use]
    pub fn order_asc(mut self, column: &str) -> Self {
        self.params
            .push(("order".to_owned(), format!("{column}.asc")));
        self
    }

    /// Sort descending by `column`.
    #[must_use]
    pub fn order_desc(mut self, column: &str) -> Self {
        self.params
            .push(("order".to_owned(), format!("{column}.desc")));
        self
    }

    /// Cap the number of returned rows.
    #[must_use]
    pub fn limit(mut self, n: u32) -> Self {
        self.params.push(("limit".to_owned(), n.to_string()));
        self
    }

    /// The encoded `(key, value)` parameter pairs.
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Whether a JSON row satisfies every equality filter.
    ///
    /// Shared with the in-process fake backend so tests filter rows with
    /// exactly the semantics the real client encodes.
    #[must_use]
    pub fn matches(&self, row: &Value) -> bool {
        self.params.iter().all(|(column, param)| {
            let Some(expected) = param.strip_prefix("eq.") else {
                // order/limit parameters do not constrain rows
                return true;
            };
            match row.get(column) {
                Some(Value::String(s)) => s == expected,
                Some(Value::Number(n)) => n.to_string() == expected,
                Some(Value::Bool(b)) => b.to_string() == expected,
                Some(Value::Null) | None => false,
                Some(other) => other.to_string() == expected,
            }
        })
    }
}

// =============================================================================
// TableApi implementation
// =============================================================================

#[async_trait]
impl TableApi for BackendClient {
    async fn select(
        &self,
        token: &str,
        table: &str,
        query: Query,
    ) -> Result<Vec<Value>, BackendError> {
        let response = self
            .data_request(reqwest::Method::GET, table, token)
            .query(query.params())
            .query(&[("select", "*")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(data_error(status.as_u16(), &body));
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn select_one(
        &self,
        token: &str,
        table: &str,
        query: Query,
    ) -> Result<Value, BackendError> {
        let response = self
            .data_request(reqwest::Method::GET, table, token)
            .query(query.params())
            .query(&[("select", "*")])
            .header("Accept", SINGLE_OBJECT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(data_error(status.as_u16(), &body));
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn insert(&self, token: &str, table: &str, row: Value) -> Result<Value, BackendError> {
        let response = self
            .data_request(reqwest::Method::POST, table, token)
            .header("Prefer", "return=representation")
            .header("Accept", SINGLE_OBJECT)
            .json(&row)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(data_error(status.as_u16(), &body));
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn update(
        &self,
        token: &str,
        table: &str,
        query: Query,
        patch: Value,
    ) -> Result<Value, BackendError> {
        let response = self
            .data_request(reqwest::Method::PATCH, table, token)
            .query(query.params())
            .header("Prefer", "return=representation")
            .header("Accept", SINGLE_OBJECT)
            .json(&patch)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(data_error(status.as_u16(), &body));
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn delete(&self, token: &str, table: &str, query: Query) -> Result<(), BackendError> {
        let response = self
            .data_request(reqwest::Method::DELETE, table, token)
            .query(query.params())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(data_error(status.as_u16(), &body));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_encoding() {
        let q = Query::new()
            .eq("branch_id", "NYC01")
            .order_desc("created_at")
            .limit(10);

        assert_eq!(
            q.params(),
            &[
                ("branch_id".to_owned(), "eq.NYC01".to_owned()),
                ("order".to_owned(), "created_at.desc".to_owned()),
                ("limit".to_owned(), "10".to_owned()),
            ]
        );
    }

    #[test]
    fn test_matches_string_and_number() {
        let row = json!({"branch_id": "NYC01", "quantity": 4});
        assert!(Query::new().eq("branch_id", "NYC01").matches(&row));
        assert!(Query::new().eq("quantity", 4).matches(&row));
        assert!(!Query::new().eq("branch_id", "SEA01").matches(&row));
    }

    #[test]
    fn test_matches_missing_column_is_false() {
        let row = json!({"name": "Widget"});
        assert!(!Query::new().eq("branch_id", "NYC01").matches(&row));
    }

    #[test]
    fn test_order_and_limit_do_not_constrain() {
        let row = json!({"name": "Widget"});
        assert!(Query::new().order_desc("created_at").limit(5).matches(&row));
    }
}
