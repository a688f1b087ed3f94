//! Sales route handlers.
//!
//! Recording a sale computes the total server-side from the item's
//! current price; the form only submits the item, the seller, and a
//! quantity.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use branchline_core::{EmployeeId, ItemId};

use crate::backend::BackendError;
use crate::data::{EmployeeRepository, InventoryRepository, SaleRepository};
use crate::filters;
use crate::error::{AppError, Result};
use crate::middleware::{BranchScope, RequireAuth};
use crate::models::{NewSale, Sale};
use crate::state::AppState;

use super::NavContext;
use super::auth::MessageQuery;

/// How many sales the list page shows.
const SALES_PAGE_SIZE: u32 = 50;

// =============================================================================
// Forms & views
// =============================================================================

/// Record-sale form data.
#[derive(Debug, Deserialize)]
pub struct SaleForm {
    pub item_id: String,
    pub employee_id: String,
    pub quantity: String,
}

/// Sale row view for the template.
#[derive(Debug, Clone)]
pub struct SaleView {
    pub recorded_at: String,
    pub quantity: i64,
    pub total: String,
    pub branch: String,
}

impl From<&Sale> for SaleView {
    fn from(sale: &Sale) -> Self {
        Self {
            recorded_at: sale.created_at.to_rfc3339(),
            quantity: sale.quantity,
            total: sale.total_amount.to_string(),
            branch: sale.branch_id.to_string(),
        }
    }
}

/// Item option for the record-sale form.
#[derive(Debug, Clone)]
pub struct ItemOption {
    pub id: String,
    pub label: String,
}

/// Employee option for the record-sale form.
#[derive(Debug, Clone)]
pub struct EmployeeOption {
    pub id: String,
    pub label: String,
}

/// Sales page template.
#[derive(Template, WebTemplate)]
#[template(path = "sales.html")]
pub struct SalesTemplate {
    pub nav: NavContext,
    pub sales: Vec<SaleView>,
    pub item_options: Vec<ItemOption>,
    pub employee_options: Vec<EmployeeOption>,
    pub error: Option<String>,
    pub success: Option<String>,
}

fn error_message(code: &str) -> &'static str {
    match code {
        "invalid_item" => "Pick an item to sell.",
        "invalid_employee" => "Pick the employee who made the sale.",
        "invalid_quantity" => "Quantity must be a whole number above zero.",
        "wrong_branch" => "That item belongs to another branch.",
        "unknown_item" => "That item no longer exists.",
        _ => "The sale could not be recorded.",
    }
}

fn success_message(code: &str) -> &'static str {
    match code {
        "recorded" => "Sale recorded.",
        _ => "Done.",
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Sales page: recent sales plus the record form.
#[instrument(skip(current, state, query))]
pub async fn index(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> Result<SalesTemplate> {
    let nav = NavContext::new(&current, "/sales");

    let scope_code = match current.scope() {
        BranchScope::All => None,
        BranchScope::Branch(code) => Some(code),
        BranchScope::Unassigned => {
            return Ok(SalesTemplate {
                nav,
                sales: vec![],
                item_options: vec![],
                employee_options: vec![],
                error: None,
                success: None,
            });
        }
    };
    let scope = scope_code.as_ref();

    let tables = state.tables().as_ref();
    let sales = SaleRepository::new(tables, &current.access_token);
    let inventory = InventoryRepository::new(tables, &current.access_token);
    let employees = EmployeeRepository::new(tables, &current.access_token);

    let (sales_result, items_result, employees_result) = tokio::join!(
        sales.recent(scope, SALES_PAGE_SIZE),
        inventory.list(scope),
        employees.list(scope),
    );

    let sales = sales_result?;

    // The form selects degrade independently of the sales list.
    let item_options = items_result.map_or_else(
        |e| {
            tracing::warn!("Failed to fetch items for sale form: {e}");
            vec![]
        },
        |items| {
            items
                .iter()
                .map(|i| ItemOption {
                    id: i.id.to_string(),
                    label: format!("{} ({}, {})", i.name, i.branch_id, i.price),
                })
                .collect()
        },
    );

    let employee_options = employees_result.map_or_else(
        |e| {
            tracing::warn!("Failed to fetch employees for sale form: {e}");
            vec![]
        },
        |rows| {
            rows.iter()
                .map(|e| EmployeeOption {
                    id: e.id.to_string(),
                    label: e.full_name(),
                })
                .collect()
        },
    );

    Ok(SalesTemplate {
        nav,
        sales: sales.iter().map(SaleView::from).collect(),
        item_options,
        employee_options,
        error: query.error.as_deref().map(|c| error_message(c).to_owned()),
        success: query
            .success
            .as_deref()
            .map(|c| success_message(c).to_owned()),
    })
}

/// Record a sale.
#[instrument(skip(current, state, form))]
pub async fn create(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Form(form): Form<SaleForm>,
) -> Response {
    let Ok(item_id) = form.item_id.trim().parse::<ItemId>() else {
        return Redirect::to("/sales?error=invalid_item").into_response();
    };
    let Ok(employee_id) = form.employee_id.trim().parse::<EmployeeId>() else {
        return Redirect::to("/sales?error=invalid_employee").into_response();
    };
    let quantity = match form.quantity.trim().parse::<i64>() {
        Ok(q) if q > 0 => q,
        _ => return Redirect::to("/sales?error=invalid_quantity").into_response(),
    };

    let tables = state.tables().as_ref();
    let inventory = InventoryRepository::new(tables, &current.access_token);

    // The item row is the source of truth for price and branch.
    let item = match inventory.find(item_id).await {
        Ok(item) => item,
        Err(BackendError::NotFound) => {
            return Redirect::to("/sales?error=unknown_item").into_response();
        }
        Err(error) => return AppError::from(error).into_response(),
    };

    if let BranchScope::Branch(own) = current.scope()
        && own != item.branch_id
    {
        return Redirect::to("/sales?error=wrong_branch").into_response();
    }

    let sale = NewSale {
        item_id,
        quantity,
        total_amount: item.price.times(quantity),
        employee_id,
        branch_id: item.branch_id,
    };

    let repo = SaleRepository::new(tables, &current.access_token);
    match repo.create(&sale).await {
        Ok(recorded) => {
            tracing::info!(id = %recorded.id, total = %recorded.total_amount, "sale recorded");
            Redirect::to("/sales?success=recorded").into_response()
        }
        Err(error) => AppError::from(error).into_response(),
    }
}
