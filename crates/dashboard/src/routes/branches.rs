//! Branch route handlers.
//!
//! Branch management (create/update/delete) is admin-only; branch
//! managers see their own branch read-only.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use branchline_core::{BranchCode, BranchId, UserId};

use crate::backend::BackendError;
use crate::data::BranchRepository;
use crate::filters;
use crate::error::{AppError, Result};
use crate::middleware::{BranchScope, RequireAdmin, RequireAuth};
use crate::models::{Branch, NewBranch};
use crate::state::AppState;

use super::NavContext;
use super::auth::MessageQuery;

// =============================================================================
// Forms & views
// =============================================================================

/// Branch create/update form data.
#[derive(Debug, Deserialize)]
pub struct BranchForm {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub branch_code: String,
    /// Optional manager user id; empty means unassigned.
    #[serde(default)]
    pub manager_id: String,
}

impl BranchForm {
    fn into_payload(self) -> std::result::Result<NewBranch, &'static str> {
        let branch_code = BranchCode::parse(&self.branch_code).map_err(|_| "invalid_code")?;

        let manager_id = if self.manager_id.trim().is_empty() {
            None
        } else {
            Some(
                self.manager_id
                    .trim()
                    .parse::<UserId>()
                    .map_err(|_| "invalid_manager")?,
            )
        };

        if self.name.trim().is_empty() {
            return Err("missing_name");
        }

        Ok(NewBranch {
            name: self.name.trim().to_owned(),
            address: self.address.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            manager_id,
            branch_code,
        })
    }
}

/// Branch row view for the template.
#[derive(Debug, Clone)]
pub struct BranchView {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub code: String,
    pub created_at: String,
}

impl From<&Branch> for BranchView {
    fn from(branch: &Branch) -> Self {
        Self {
            id: branch.id.to_string(),
            name: branch.name.clone(),
            address: branch.address.clone(),
            phone: branch.phone.clone(),
            code: branch.branch_code.to_string(),
            created_at: branch.created_at.to_rfc3339(),
        }
    }
}

/// Branch list page template.
#[derive(Template, WebTemplate)]
#[template(path = "branches.html")]
pub struct BranchesTemplate {
    pub nav: NavContext,
    pub branches: Vec<BranchView>,
    pub error: Option<String>,
    pub success: Option<String>,
}

fn error_message(code: &str) -> &'static str {
    match code {
        "invalid_code" => "Branch codes are up to 12 letters, digits, or dashes.",
        "invalid_manager" => "The manager id must be a user id.",
        "missing_name" => "The branch needs a name.",
        "code_taken" => "That branch code is already in use.",
        _ => "The branch could not be saved.",
    }
}

fn success_message(code: &str) -> &'static str {
    match code {
        "created" => "Branch created.",
        "updated" => "Branch updated.",
        "deleted" => "Branch deleted.",
        _ => "Done.",
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Branch list page.
#[instrument(skip(current, state, query))]
pub async fn index(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> Result<BranchesTemplate> {
    let nav = NavContext::new(&current, "/branches");

    let scope_code = match current.scope() {
        BranchScope::All => None,
        BranchScope::Branch(code) => Some(code),
        BranchScope::Unassigned => {
            return Ok(BranchesTemplate {
                nav,
                branches: vec![],
                error: None,
                success: None,
            });
        }
    };

    let repo = BranchRepository::new(state.tables().as_ref(), &current.access_token);
    let branches = repo.list(scope_code.as_ref()).await?;

    Ok(BranchesTemplate {
        nav,
        branches: branches.iter().map(BranchView::from).collect(),
        error: query.error.as_deref().map(|c| error_message(c).to_owned()),
        success: query
            .success
            .as_deref()
            .map(|c| success_message(c).to_owned()),
    })
}

/// Create a branch (admin only).
#[instrument(skip(admin, state, form))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Form(form): Form<BranchForm>,
) -> Response {
    let payload = match form.into_payload() {
        Ok(payload) => payload,
        Err(code) => return Redirect::to(&format!("/branches?error={code}")).into_response(),
    };

    let repo = BranchRepository::new(state.tables().as_ref(), &admin.access_token);
    match repo.create(&payload).await {
        Ok(branch) => {
            tracing::info!(code = %branch.branch_code, "branch created");
            Redirect::to("/branches?success=created").into_response()
        }
        Err(BackendError::Conflict(_)) => {
            Redirect::to("/branches?error=code_taken").into_response()
        }
        Err(error) => AppError::from(error).into_response(),
    }
}

/// Update a branch (admin only).
#[instrument(skip(admin, state, form))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<BranchId>,
    Form(form): Form<BranchForm>,
) -> Response {
    let payload = match form.into_payload() {
        Ok(payload) => payload,
        Err(code) => return Redirect::to(&format!("/branches?error={code}")).into_response(),
    };

    let repo = BranchRepository::new(state.tables().as_ref(), &admin.access_token);
    match repo.update(id, &payload).await {
        Ok(_) => Redirect::to("/branches?success=updated").into_response(),
        Err(BackendError::Conflict(_)) => {
            Redirect::to("/branches?error=code_taken").into_response()
        }
        Err(error) => AppError::from(error).into_response(),
    }
}

/// Delete a branch (admin only).
#[instrument(skip(admin, state))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<BranchId>,
) -> Result<Redirect> {
    let repo = BranchRepository::new(state.tables().as_ref(), &admin.access_token);
    repo.delete(id).await?;
    Ok(Redirect::to("/branches?success=deleted"))
}
