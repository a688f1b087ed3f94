//! Authentication route handlers.
//!
//! Login, registration, logout, and the manual session reload. All
//! credential checking happens at the hosted auth service; these
//! handlers translate its answers into redirects and inline form
//! messages. Authentication failures never touch the reconciliation
//! state machine - only a successful sign-in emits an event.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::backend::BackendError;
use crate::models::{StoredSession, session_keys};
use crate::services::AuthEvent;
use crate::state::AppState;

/// Minimum password length enforced before calling the backend.
const MIN_PASSWORD_LENGTH: usize = 8;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
}

/// Registration success page (email verification pending).
#[derive(Template, WebTemplate)]
#[template(path = "auth/verify_email.html")]
pub struct VerifyEmailTemplate {
    pub email: String,
}

// =============================================================================
// Message mapping
// =============================================================================

fn login_error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Invalid email or password.",
        "unverified" => "Please verify your email address before signing in.",
        "backend" => "Sign-in is temporarily unavailable. Please try again.",
        "session" => "Could not start your session. Please try again.",
        "signout_failed" => "You were signed out locally, but the server could not be reached.",
        _ => "Sign-in failed.",
    }
}

fn login_success_message(code: &str) -> &'static str {
    match code {
        "signed_out" => "You have been signed out.",
        _ => "Done.",
    }
}

fn register_error_message(code: &str) -> &'static str {
    match code {
        "password_mismatch" => "Passwords do not match.",
        "password_too_short" => "Password must be at least 8 characters.",
        "email_taken" => "An account with this email already exists.",
        "invalid" => "Please check the details and try again.",
        _ => "Registration failed. Please try again.",
    }
}

// =============================================================================
// Login
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    LoginTemplate {
        error: query.error.as_deref().map(|c| login_error_message(c).to_owned()),
        success: query
            .success
            .as_deref()
            .map(|c| login_success_message(c).to_owned()),
    }
}

/// Handle login form submission.
///
/// On success, mints the login's controller, stores the controller key
/// and refresh token in the cookie session, and fires `SignedIn` so the
/// profile resolution starts before the redirect lands.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let backend_session = match state.auth().sign_in(&form.email, &form.password).await {
        Ok(s) => s,
        Err(BackendError::EmailNotConfirmed) => {
            return Redirect::to("/auth/login?error=unverified").into_response();
        }
        Err(BackendError::Auth(reason)) => {
            tracing::warn!(%reason, "login rejected");
            return Redirect::to("/auth/login?error=credentials").into_response();
        }
        Err(error) => {
            tracing::error!(%error, "login failed against backend");
            return Redirect::to("/auth/login?error=backend").into_response();
        }
    };

    let stored = StoredSession::new(backend_session.refresh_token.clone());
    if let Err(error) = session.insert(session_keys::BACKEND_SESSION, &stored).await {
        tracing::error!(%error, "failed to persist session");
        return Redirect::to("/auth/login?error=session").into_response();
    }

    let controller = state.sessions().build_controller();
    controller.handle_event(AuthEvent::SignedIn(backend_session));
    state
        .sessions()
        .insert(stored.controller_key, controller)
        .await;

    Redirect::to("/").into_response()
}

// =============================================================================
// Registration
// =============================================================================

/// Display the registration page.
pub async fn register_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    RegisterTemplate {
        error: query
            .error
            .as_deref()
            .map(|c| register_error_message(c).to_owned()),
    }
}

/// Handle registration form submission.
///
/// Deployments requiring email verification return no session; those
/// users land on a "check your email" page instead of being signed in.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    if form.password != form.password_confirm {
        return Redirect::to("/auth/register?error=password_mismatch").into_response();
    }

    if form.password.len() < MIN_PASSWORD_LENGTH {
        return Redirect::to("/auth/register?error=password_too_short").into_response();
    }

    let outcome = match state.auth().sign_up(&form.email, &form.password).await {
        Ok(outcome) => outcome,
        Err(BackendError::Auth(reason)) => {
            tracing::warn!(%reason, "registration rejected");
            let taken = reason.contains("already") || reason.contains("registered");
            let code = if taken { "email_taken" } else { "invalid" };
            return Redirect::to(&format!("/auth/register?error={code}")).into_response();
        }
        Err(error) => {
            tracing::error!(%error, "registration failed against backend");
            return Redirect::to("/auth/register?error=failed").into_response();
        }
    };

    let Some(backend_session) = outcome.session else {
        return VerifyEmailTemplate {
            email: outcome.user.email.to_string(),
        }
        .into_response();
    };

    // Verification is disabled on this deployment - sign straight in.
    let stored = StoredSession::new(backend_session.refresh_token.clone());
    if let Err(error) = session.insert(session_keys::BACKEND_SESSION, &stored).await {
        tracing::error!(%error, "failed to persist session");
        return Redirect::to("/auth/login?error=session").into_response();
    }

    let controller = state.sessions().build_controller();
    controller.handle_event(AuthEvent::SignedIn(backend_session));
    state
        .sessions()
        .insert(stored.controller_key, controller)
        .await;

    Redirect::to("/").into_response()
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
///
/// The remote sign-out may fail; the local session is cleared
/// regardless, and the failure surfaces as a message on the login page.
pub async fn logout(State(state): State<AppState>, session: Session) -> Response {
    let stored: Option<StoredSession> = session
        .get(session_keys::BACKEND_SESSION)
        .await
        .ok()
        .flatten();

    let mut remote_failed = false;
    if let Some(stored) = stored {
        let controller = state
            .sessions()
            .controller_for(stored.controller_key, Some(stored.refresh_token.clone()))
            .await;
        if let Err(error) = controller.logout().await {
            tracing::warn!(%error, "remote sign-out failed");
            remote_failed = true;
        }
        state.sessions().remove(stored.controller_key).await;
    }

    if let Err(error) = session.flush().await {
        tracing::error!(%error, "failed to flush session");
    }

    crate::error::clear_sentry_user();

    if remote_failed {
        Redirect::to("/auth/login?error=signout_failed").into_response()
    } else {
        Redirect::to("/auth/login?success=signed_out").into_response()
    }
}

// =============================================================================
// Manual reload
// =============================================================================

/// Re-run the session/profile pipeline for this login.
///
/// Recovery action offered by the "profile missing" page; the guard on
/// the next request awaits the fresh resolution.
pub async fn reload(State(state): State<AppState>, session: Session) -> Response {
    let stored: Option<StoredSession> = session
        .get(session_keys::BACKEND_SESSION)
        .await
        .ok()
        .flatten();

    let Some(stored) = stored else {
        return Redirect::to("/auth/login").into_response();
    };

    let controller = state
        .sessions()
        .controller_for(stored.controller_key, Some(stored.refresh_token.clone()))
        .await;
    controller.force_reload();

    Redirect::to("/").into_response()
}
