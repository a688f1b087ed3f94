//! Wire and domain types for the hosted auth service.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use branchline_core::{Email, UserId};

/// The identity record embedded in every token response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Stable unique identifier issued by the auth service.
    pub id: UserId,
    /// The email the account was registered with.
    pub email: Email,
}

/// A live authenticated session against the hosted backend.
#[derive(Debug, Clone)]
pub struct BackendSession {
    /// Bearer token for data requests; subject to row-level security.
    pub access_token: String,
    /// Single-use token to mint the next session.
    pub refresh_token: String,
    /// When `access_token` stops being accepted.
    pub expires_at: DateTime<Utc>,
    /// The authenticated identity.
    pub user: AuthUser,
}

impl BackendSession {
    /// Whether the access token is past (or within a minute of) expiry.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() + Duration::seconds(60) >= self.expires_at
    }
}

/// Result of a sign-up request.
///
/// The session is absent when the deployment requires email
/// verification before the first sign-in.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: AuthUser,
    pub session: Option<BackendSession>,
}

// =============================================================================
// Wire shapes
// =============================================================================

/// Token endpoint response (password and refresh grants).
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: WireUser,
}

/// Sign-up endpoint response.
///
/// Depending on the deployment's confirmation settings this is either a
/// full token response or just the pending user record.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SignUpResponse {
    Session(TokenResponse),
    Pending(WireUser),
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireUser {
    pub id: UserId,
    pub email: String,
}

impl WireUser {
    pub(crate) fn into_auth_user(self) -> Result<AuthUser, super::BackendError> {
        let email = Email::parse(&self.email)
            .map_err(|e| super::BackendError::Decode(format!("user email: {e}")))?;
        Ok(AuthUser { id: self.id, email })
    }
}

impl TokenResponse {
    pub(crate) fn into_session(self) -> Result<BackendSession, super::BackendError> {
        let user = self.user.into_auth_user()?;
        Ok(BackendSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: Utc::now() + Duration::seconds(self.expires_in),
            user,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_to_session() {
        let raw = format!(
            r#"{{"access_token":"at","token_type":"bearer","expires_in":3600,
                "refresh_token":"rt","user":{{"id":"{}","email":"a@b.c"}}}}"#,
            uuid::Uuid::new_v4()
        );
        let resp: TokenResponse = serde_json::from_str(&raw).unwrap();
        let session = resp.into_session().unwrap();
        assert_eq!(session.user.email.as_str(), "a@b.c");
        assert!(!session.is_expired());
    }

    #[test]
    fn test_signup_response_pending_variant() {
        let raw = format!(
            r#"{{"id":"{}","email":"new@b.c","confirmation_sent_at":"2026-01-01T00:00:00Z"}}"#,
            uuid::Uuid::new_v4()
        );
        let resp: SignUpResponse = serde_json::from_str(&raw).unwrap();
        assert!(matches!(resp, SignUpResponse::Pending(_)));
    }

    #[test]
    fn test_bad_email_in_payload_is_decode_error() {
        let wire = WireUser {
            id: UserId::generate(),
            email: "not-an-email".into(),
        };
        assert!(matches!(
            wire.into_auth_user(),
            Err(super::super::BackendError::Decode(_))
        ));
    }
}
