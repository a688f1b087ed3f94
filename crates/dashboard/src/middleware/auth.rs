//! Authentication extractors - the route-level guard.
//!
//! Every protected handler takes [`RequireAuth`] (or [`RequireAdmin`]).
//! The extractor reattaches to the login's reconciliation controller,
//! awaits a settled state (bounded by the controller's watchdog), and
//! maps the published tuple to exactly one of:
//!
//! - no stored session, or settled with no user -> redirect to login
//!   (401 for API paths)
//! - user settled but profile missing -> the terminal "profile missing"
//!   page with a manual retry action; deliberately NOT a login redirect
//!   and never an automatic reload loop
//! - user and profile settled -> the handler runs with [`CurrentUser`]
//!
//! Role flags on [`CurrentUser`] filter navigation and scope queries.
//! They are not an enforcement boundary - the hosted backend's
//! row-level security is.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use uuid::Uuid;

use branchline_core::{BranchCode, Role};

use crate::backend::AuthUser;
use crate::models::{Profile, StoredSession, session_keys};
use crate::state::AppState;

/// The authenticated request identity handed to protected handlers.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// The external identity record.
    pub user: AuthUser,
    /// The resolved application profile.
    pub profile: Profile,
    /// Bearer token for backend data requests on this user's behalf.
    pub access_token: String,
    /// Key of this login's controller in the registry.
    pub controller_key: Uuid,
}

/// What slice of branch-scoped data a user may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchScope {
    /// Admins see every branch.
    All,
    /// Branch managers see exactly their branch.
    Branch(BranchCode),
    /// A branch manager with no branch assigned yet sees nothing.
    Unassigned,
}

impl CurrentUser {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.profile.role == Role::Admin
    }

    #[must_use]
    pub fn is_branch_manager(&self) -> bool {
        self.profile.role == Role::BranchManager
    }

    /// The branch filter this user's queries must carry.
    #[must_use]
    pub fn scope(&self) -> BranchScope {
        match (&self.profile.role, &self.profile.branch_id) {
            (Role::Admin, _) => BranchScope::All,
            (Role::BranchManager, Some(code)) => BranchScope::Branch(code.clone()),
            (Role::BranchManager, None) => BranchScope::Unassigned,
        }
    }
}

/// Terminal "profile missing" page.
///
/// Rendered when the session settled with a user but no profile (the
/// resolution failed permanently). Offers a manual retry.
#[derive(Template, WebTemplate)]
#[template(path = "auth/profile_missing.html")]
pub struct ProfileMissingTemplate {
    pub error: Option<String>,
}

/// Extractor that requires a settled, fully-resolved login.
pub struct RequireAuth(pub CurrentUser);

/// Rejections from the auth guard.
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Settled with a user but no profile: terminal error affordance.
    ProfileMissing { error: Option<String> },
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::ProfileMissing { error } => ProfileMissingTemplate { error }.into_response(),
        }
    }
}

/// Redirect browsers to the login page; APIs get a bare 401.
fn reject_unauthenticated(parts: &Parts) -> AuthRejection {
    if parts.uri.path().starts_with("/api/") {
        AuthRejection::Unauthorized
    } else {
        AuthRejection::RedirectToLogin
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?
            .clone();

        let stored: StoredSession = session
            .get(session_keys::BACKEND_SESSION)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| reject_unauthenticated(parts))?;

        let controller = state
            .sessions()
            .controller_for(stored.controller_key, Some(stored.refresh_token.clone()))
            .await;

        let snapshot = controller.settled().await;

        // The backend rotates refresh tokens; persist the newest copy so
        // a rebuilt controller can still bootstrap.
        if let Some(current) = snapshot.refresh_token()
            && current != stored.refresh_token
        {
            let updated = StoredSession {
                controller_key: stored.controller_key,
                refresh_token: current.to_owned(),
            };
            if let Err(error) = session.insert(session_keys::BACKEND_SESSION, &updated).await {
                tracing::warn!(%error, "failed to persist rotated refresh token");
            }
        }

        match (snapshot.user.clone(), snapshot.profile.clone()) {
            (Some(user), Some(profile)) => {
                let access_token = snapshot
                    .access_token()
                    .map(str::to_owned)
                    .ok_or(AuthRejection::Unauthorized)?;

                crate::error::set_sentry_user(&user.id, Some(user.email.as_str()));

                Ok(Self(CurrentUser {
                    user,
                    profile,
                    access_token,
                    controller_key: stored.controller_key,
                }))
            }
            (Some(_), None) => Err(AuthRejection::ProfileMissing {
                error: snapshot.error.clone(),
            }),
            (None, _) => Err(reject_unauthenticated(parts)),
        }
    }
}

/// Extractor that additionally requires the admin role.
pub struct RequireAdmin(pub CurrentUser);

/// Rejections from the admin guard.
pub enum AdminRejection {
    /// Not authenticated (delegates to the auth guard's behavior).
    Auth(AuthRejection),
    /// Authenticated but not an admin.
    Forbidden,
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Auth(rejection) => rejection.into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "Only admins can access this resource",
            )
                .into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AdminRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(current) = RequireAuth::from_request_parts(parts, state)
            .await
            .map_err(AdminRejection::Auth)?;

        if !current.is_admin() {
            return Err(AdminRejection::Forbidden);
        }

        Ok(Self(current))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use branchline_core::{Email, UserId};
    use chrono::Utc;

    fn current_user(role: Role, branch: Option<&str>) -> CurrentUser {
        let id = UserId::generate();
        CurrentUser {
            user: AuthUser {
                id,
                email: Email::parse("a@b.c").unwrap(),
            },
            profile: Profile {
                id,
                role,
                branch_id: branch.map(|b| BranchCode::parse(b).unwrap()),
                created_at: Utc::now(),
            },
            access_token: "token".into(),
            controller_key: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_admin_scope_is_unrestricted() {
        let user = current_user(Role::Admin, None);
        assert!(user.is_admin());
        assert_eq!(user.scope(), BranchScope::All);
    }

    #[test]
    fn test_branch_manager_scope_is_pinned() {
        let user = current_user(Role::BranchManager, Some("NYC01"));
        assert!(user.is_branch_manager());
        assert_eq!(
            user.scope(),
            BranchScope::Branch(BranchCode::parse("NYC01").unwrap())
        );
    }

    #[test]
    fn test_unassigned_manager_sees_nothing() {
        let user = current_user(Role::BranchManager, None);
        assert_eq!(user.scope(), BranchScope::Unassigned);
    }
}
