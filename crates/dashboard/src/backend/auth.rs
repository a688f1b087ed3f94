//! Authentication against the hosted auth endpoint.
//!
//! The auth endpoint speaks a GoTrue-style REST dialect:
//! password/refresh grants on `/auth/v1/token`, registration on
//! `/auth/v1/signup`, revocation on `/auth/v1/logout`.

use async_trait::async_trait;
use serde_json::json;

use super::error::auth_error;
use super::types::{SignUpResponse, TokenResponse};
use super::{AuthApi, BackendClient, BackendError, BackendSession, SignUpOutcome};

#[async_trait]
impl AuthApi for BackendClient {
    async fn get_session(
        &self,
        refresh_token: &str,
    ) -> Result<Option<BackendSession>, BackendError> {
        let response = self
            .auth_request(reqwest::Method::POST, "token")
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return match auth_error(status.as_u16(), &body) {
                // A rejected refresh token is an expired session, not a
                // fault: there is simply no session anymore.
                BackendError::Auth(reason) => {
                    tracing::debug!(%reason, "stored refresh token rejected");
                    Ok(None)
                }
                other => Err(other),
            };
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(Some(token.into_session()?))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<BackendSession, BackendError> {
        let response = self
            .auth_request(reqwest::Method::POST, "token")
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(auth_error(status.as_u16(), &body));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        token.into_session()
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, BackendError> {
        let response = self
            .auth_request(reqwest::Method::POST, "signup")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(auth_error(status.as_u16(), &body));
        }

        let outcome: SignUpResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        match outcome {
            SignUpResponse::Session(token) => {
                let session = token.into_session()?;
                Ok(SignUpOutcome {
                    user: session.user.clone(),
                    session: Some(session),
                })
            }
            SignUpResponse::Pending(user) => Ok(SignUpOutcome {
                user: user.into_auth_user()?,
                session: None,
            }),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let response = self
            .auth_request(reqwest::Method::POST, "logout")
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        // Revoking an already-dead token is a no-op, not a failure.
        if !status.is_success() && status.as_u16() != 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(auth_error(status.as_u16(), &body));
        }

        Ok(())
    }

    async fn health(&self) -> Result<(), BackendError> {
        let response = self
            .auth_request(reqwest::Method::GET, "health")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(auth_error(status.as_u16(), &body));
        }

        Ok(())
    }
}
