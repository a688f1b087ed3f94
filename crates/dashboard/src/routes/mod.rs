//! HTTP route handlers for the dashboard.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Dashboard (aggregate cards)
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (backend probe)
//!
//! # Auth
//! GET  /auth/login              - Login page
//! POST /auth/login              - Login action
//! GET  /auth/register           - Register page
//! POST /auth/register           - Register action
//! POST /auth/logout             - Logout action
//! POST /auth/reload             - Re-run session/profile resolution
//!
//! # Branches (management is admin-only)
//! GET  /branches                - Branch list
//! POST /branches                - Create branch
//! POST /branches/{id}           - Update branch
//! POST /branches/{id}/delete    - Delete branch
//!
//! # Employees (branch-scoped for managers)
//! GET  /employees               - Employee cards
//! POST /employees               - Create employee
//! POST /employees/{id}          - Update employee
//! POST /employees/{id}/delete   - Delete employee
//!
//! # Inventory (branch-scoped for managers)
//! GET  /inventory               - Item list with filters
//! POST /inventory               - Create item
//! POST /inventory/{id}          - Update item
//! POST /inventory/{id}/delete   - Delete item
//!
//! # Sales (branch-scoped for managers)
//! GET  /sales                   - Recent sales + record form
//! POST /sales                   - Record a sale
//! ```

pub mod auth;
pub mod branches;
pub mod dashboard;
pub mod employees;
pub mod inventory;
pub mod sales;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{BranchScope, CurrentUser, auth_rate_limiter};
use crate::state::AppState;

/// Navigation context shared by every signed-in page.
#[derive(Debug, Clone)]
pub struct NavContext {
    pub email: String,
    pub is_admin: bool,
    pub branch_label: String,
    pub current_path: String,
}

impl NavContext {
    #[must_use]
    pub fn new(current: &CurrentUser, current_path: &str) -> Self {
        let branch_label = match current.scope() {
            BranchScope::All => "All branches".to_owned(),
            BranchScope::Branch(code) => code.to_string(),
            BranchScope::Unassigned => "No branch assigned".to_owned(),
        };

        Self {
            email: current.user.email.to_string(),
            is_admin: current.is_admin(),
            branch_label,
            current_path: current_path.to_owned(),
        }
    }
}

/// Create the auth routes router (rate limited).
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/reload", post(auth::reload))
        .layer(auth_rate_limiter())
}

/// Create the branch routes router.
pub fn branch_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(branches::index).post(branches::create))
        .route("/{id}", post(branches::update))
        .route("/{id}/delete", post(branches::delete))
}

/// Create the employee routes router.
pub fn employee_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(employees::index).post(employees::create))
        .route("/{id}", post(employees::update))
        .route("/{id}/delete", post(employees::delete))
}

/// Create the inventory routes router.
pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(inventory::index).post(inventory::create))
        .route("/{id}", post(inventory::update))
        .route("/{id}/delete", post(inventory::delete))
}

/// Create the sales routes router.
pub fn sales_routes() -> Router<AppState> {
    Router::new().route("/", get(sales::index).post(sales::create))
}

/// Create all routes for the dashboard.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .nest("/branches", branch_routes())
        .nest("/employees", employee_routes())
        .nest("/inventory", inventory_routes())
        .nest("/sales", sales_routes())
        .nest("/auth", auth_routes())
}
