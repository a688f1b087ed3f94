//! Employee route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use branchline_core::{BranchCode, Email, EmployeeId, Money};

use crate::data::EmployeeRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{BranchScope, CurrentUser, RequireAuth};
use crate::models::{Employee, NewEmployee};
use crate::state::AppState;

use super::NavContext;
use super::auth::MessageQuery;

// =============================================================================
// Forms & views
// =============================================================================

/// Employee create/update form data.
#[derive(Debug, Deserialize)]
pub struct EmployeeForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: String,
    #[serde(default)]
    pub branch_id: String,
    pub salary: String,
}

impl EmployeeForm {
    /// Validate the form against the caller's branch scope.
    ///
    /// Branch managers cannot place employees outside their own branch;
    /// whatever the form says, the payload carries their branch.
    fn into_payload(self, current: &CurrentUser) -> std::result::Result<NewEmployee, &'static str> {
        let email = Email::parse(self.email.trim()).map_err(|_| "invalid_email")?;
        let salary = self
            .salary
            .trim()
            .parse::<Decimal>()
            .map_err(|_| "invalid_salary")?;

        let branch_id = match current.scope() {
            BranchScope::Branch(own) => own,
            BranchScope::All => BranchCode::parse(&self.branch_id).map_err(|_| "invalid_branch")?,
            BranchScope::Unassigned => return Err("no_branch"),
        };

        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err("missing_name");
        }

        Ok(NewEmployee {
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            email,
            position: self.position.trim().to_owned(),
            branch_id,
            salary: Money::new(salary),
        })
    }
}

/// Employee card view for the template.
#[derive(Debug, Clone)]
pub struct EmployeeView {
    pub id: String,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: String,
    pub branch: String,
    pub salary: String,
    pub salary_raw: String,
}

impl From<&Employee> for EmployeeView {
    fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id.to_string(),
            name: employee.full_name(),
            first_name: employee.first_name.clone(),
            last_name: employee.last_name.clone(),
            email: employee.email.to_string(),
            position: employee.position.clone(),
            branch: employee.branch_id.to_string(),
            salary: employee.salary.to_string(),
            salary_raw: employee.salary.amount().to_string(),
        }
    }
}

/// Employee list page template.
#[derive(Template, WebTemplate)]
#[template(path = "employees.html")]
pub struct EmployeesTemplate {
    pub nav: NavContext,
    pub employees: Vec<EmployeeView>,
    pub error: Option<String>,
    pub success: Option<String>,
}

fn error_message(code: &str) -> &'static str {
    match code {
        "invalid_email" => "That email address does not look valid.",
        "invalid_salary" => "Salary must be a number.",
        "invalid_branch" => "Unknown branch code.",
        "missing_name" => "First and last name are required.",
        "no_branch" => "You have no branch assigned; ask an admin.",
        _ => "The employee could not be saved.",
    }
}

fn success_message(code: &str) -> &'static str {
    match code {
        "created" => "Employee added.",
        "updated" => "Employee updated.",
        "deleted" => "Employee removed.",
        _ => "Done.",
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Employee list page.
#[instrument(skip(current, state, query))]
pub async fn index(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> Result<EmployeesTemplate> {
    let nav = NavContext::new(&current, "/employees");

    let scope_code = match current.scope() {
        BranchScope::All => None,
        BranchScope::Branch(code) => Some(code),
        BranchScope::Unassigned => {
            return Ok(EmployeesTemplate {
                nav,
                employees: vec![],
                error: None,
                success: None,
            });
        }
    };

    let repo = EmployeeRepository::new(state.tables().as_ref(), &current.access_token);
    let employees = repo.list(scope_code.as_ref()).await?;

    Ok(EmployeesTemplate {
        nav,
        employees: employees.iter().map(EmployeeView::from).collect(),
        error: query.error.as_deref().map(|c| error_message(c).to_owned()),
        success: query
            .success
            .as_deref()
            .map(|c| success_message(c).to_owned()),
    })
}

/// Create an employee.
#[instrument(skip(current, state, form))]
pub async fn create(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Form(form): Form<EmployeeForm>,
) -> Response {
    let payload = match form.into_payload(&current) {
        Ok(payload) => payload,
        Err(code) => return Redirect::to(&format!("/employees?error={code}")).into_response(),
    };

    let repo = EmployeeRepository::new(state.tables().as_ref(), &current.access_token);
    match repo.create(&payload).await {
        Ok(employee) => {
            tracing::info!(id = %employee.id, "employee created");
            Redirect::to("/employees?success=created").into_response()
        }
        Err(error) => AppError::from(error).into_response(),
    }
}

/// Update an employee.
#[instrument(skip(current, state, form))]
pub async fn update(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<EmployeeId>,
    Form(form): Form<EmployeeForm>,
) -> Response {
    let payload = match form.into_payload(&current) {
        Ok(payload) => payload,
        Err(code) => return Redirect::to(&format!("/employees?error={code}")).into_response(),
    };

    let repo = EmployeeRepository::new(state.tables().as_ref(), &current.access_token);
    match repo.update(id, &payload).await {
        Ok(_) => Redirect::to("/employees?success=updated").into_response(),
        Err(error) => AppError::from(error).into_response(),
    }
}

/// Delete an employee.
#[instrument(skip(current, state))]
pub async fn delete(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<EmployeeId>,
) -> Result<Redirect> {
    let repo = EmployeeRepository::new(state.tables().as_ref(), &current.access_token);
    repo.delete(id).await?;
    Ok(Redirect::to("/employees?success=deleted"))
}
