//! Error taxonomy for the hosted backend.
//!
//! Every failure the rest of the application can react to is a distinct
//! variant: "row not found" and "unique-key conflict" are recoverable
//! signals for the profile resolver, authentication failures render
//! inline on the login form, and everything else is either transport or
//! a generic API error.

use serde::Deserialize;
use thiserror::Error;

/// Errors returned by the hosted auth/data service.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request never produced a backend response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The auth endpoint rejected the credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The account exists but the email address is not confirmed yet.
    #[error("email not confirmed")]
    EmailNotConfirmed,

    /// A single-object request matched no row.
    ///
    /// Only produced from the backend's explicit not-found code, never
    /// inferred from an empty result set.
    #[error("row not found")]
    NotFound,

    /// A unique-key violation (Postgres 23505) raised by a concurrent
    /// writer.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other error response from the backend.
    #[error("backend error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("invalid backend response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Whether retrying the same request may succeed.
    ///
    /// Transport failures and backend 5xx responses are transient;
    /// everything else is a definitive answer.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// PostgREST single-object miss, surfaced as code `PGRST116`.
const POSTGREST_NOT_FOUND: &str = "PGRST116";
/// Postgres unique-key violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

/// Error payload shape shared by the auth and data endpoints.
///
/// The two endpoint families use different field names across versions
/// (`msg` vs `message`, `error_code` vs `code`), so every field is
/// optional and resolution is tolerant.
#[derive(Debug, Default, Deserialize)]
struct WireError {
    code: Option<serde_json::Value>,
    error_code: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl WireError {
    fn code(&self) -> Option<String> {
        if let Some(code) = &self.error_code {
            return Some(code.clone());
        }
        match &self.code {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    fn message(&self) -> String {
        self.message
            .as_deref()
            .or(self.msg.as_deref())
            .or(self.error_description.as_deref())
            .or(self.error.as_deref())
            .unwrap_or("unknown backend error")
            .to_owned()
    }
}

/// Map a non-success data-endpoint response body to a [`BackendError`].
pub(crate) fn data_error(status: u16, body: &str) -> BackendError {
    let wire: WireError = serde_json::from_str(body).unwrap_or_default();
    let code = wire.code();
    let message = wire.message();

    match code.as_deref() {
        Some(POSTGREST_NOT_FOUND) => BackendError::NotFound,
        Some(UNIQUE_VIOLATION) => BackendError::Conflict(message),
        _ => {
            // Older deployments report conflicts with a bare 409.
            if status == 409 {
                return BackendError::Conflict(message);
            }
            BackendError::Api {
                status,
                code,
                message,
            }
        }
    }
}

/// Map a non-success auth-endpoint response body to a [`BackendError`].
pub(crate) fn auth_error(status: u16, body: &str) -> BackendError {
    let wire: WireError = serde_json::from_str(body).unwrap_or_default();
    let code = wire.code();
    let message = wire.message();

    match code.as_deref() {
        Some("email_not_confirmed") => BackendError::EmailNotConfirmed,
        Some(
            "invalid_credentials" | "invalid_grant" | "user_not_found" | "user_already_exists"
            | "weak_password",
        ) => BackendError::Auth(message),
        _ if status == 400 || status == 401 || status == 422 => BackendError::Auth(message),
        _ => BackendError::Api {
            status,
            code,
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_requires_explicit_code() {
        let err = data_error(406, r#"{"code":"PGRST116","message":"0 rows"}"#);
        assert!(matches!(err, BackendError::NotFound));

        // An error without the code is never treated as a miss.
        let err = data_error(406, r#"{"message":"not acceptable"}"#);
        assert!(matches!(err, BackendError::Api { .. }));
    }

    #[test]
    fn test_unique_violation_is_conflict() {
        let err = data_error(
            409,
            r#"{"code":"23505","message":"duplicate key value violates unique constraint"}"#,
        );
        assert!(matches!(err, BackendError::Conflict(_)));
    }

    #[test]
    fn test_bare_409_is_conflict() {
        let err = data_error(409, r#"{"message":"conflict"}"#);
        assert!(matches!(err, BackendError::Conflict(_)));
    }

    #[test]
    fn test_auth_error_variants() {
        let err = auth_error(
            400,
            r#"{"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#,
        );
        assert!(matches!(err, BackendError::Auth(_)));

        let err = auth_error(400, r#"{"error_code":"email_not_confirmed","msg":"..."}"#);
        assert!(matches!(err, BackendError::EmailNotConfirmed));
    }

    #[test]
    fn test_legacy_auth_payload_shape() {
        let err = auth_error(
            400,
            r#"{"error":"invalid_grant","error_description":"Invalid refresh token"}"#,
        );
        assert!(matches!(err, BackendError::Auth(_)));
    }

    #[test]
    fn test_unparseable_body_still_carries_status() {
        let err = data_error(503, "<html>bad gateway</html>");
        match err {
            BackendError::Api { status, .. } => assert_eq!(status, 503),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_transience() {
        assert!(
            data_error(500, r#"{"message":"oops"}"#).is_transient(),
            "5xx should be retryable"
        );
        assert!(!BackendError::NotFound.is_transient());
        assert!(!BackendError::Conflict("dup".into()).is_transient());
        assert!(!BackendError::Auth("nope".into()).is_transient());
    }
}
