//! Inventory route handlers.
//!
//! The list page supports a text search, a low-stock filter, and (for
//! admins) a branch filter. Branch managers are pinned to their own
//! branch on both reads and writes.

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

use branchline_core::{BranchCode, ItemId, Money};

use crate::data::{BranchRepository, InventoryRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{BranchScope, CurrentUser, RequireAuth};
use crate::models::{InventoryItem, NewInventoryItem};
use crate::state::AppState;

use super::NavContext;

/// Reorder point applied when the form leaves it blank.
const DEFAULT_REORDER_POINT: i64 = 10;

// =============================================================================
// Forms & views
// =============================================================================

/// List page query: filters plus flash messages.
#[derive(Debug, Deserialize)]
pub struct InventoryQuery {
    /// Text search over name and description.
    #[serde(default)]
    pub q: String,
    /// `all` (default) or `low`.
    #[serde(default)]
    pub stock: String,
    /// Branch code filter (admins only; managers are pinned).
    #[serde(default)]
    pub branch: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Item create/update form data.
#[derive(Debug, Deserialize)]
pub struct InventoryForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub quantity: String,
    pub price: String,
    #[serde(default)]
    pub branch_id: String,
    #[serde(default)]
    pub reorder_point: String,
}

impl InventoryForm {
    fn into_payload(
        self,
        current: &CurrentUser,
    ) -> std::result::Result<NewInventoryItem, &'static str> {
        let quantity = self
            .quantity
            .trim()
            .parse::<i64>()
            .map_err(|_| "invalid_quantity")?;
        let price = self
            .price
            .trim()
            .parse::<Decimal>()
            .map_err(|_| "invalid_price")?;

        let reorder_point = if self.reorder_point.trim().is_empty() {
            DEFAULT_REORDER_POINT
        } else {
            self.reorder_point
                .trim()
                .parse::<i64>()
                .map_err(|_| "invalid_reorder_point")?
        };

        let branch_id = match current.scope() {
            BranchScope::Branch(own) => own,
            BranchScope::All => BranchCode::parse(&self.branch_id).map_err(|_| "invalid_branch")?,
            BranchScope::Unassigned => return Err("no_branch"),
        };

        if self.name.trim().is_empty() {
            return Err("missing_name");
        }
        if quantity < 0 {
            return Err("invalid_quantity");
        }

        Ok(NewInventoryItem {
            name: self.name.trim().to_owned(),
            description: self.description.trim().to_owned(),
            quantity,
            price: Money::new(price),
            branch_id,
            reorder_point,
        })
    }
}

/// Item card view for the template.
#[derive(Debug, Clone)]
pub struct ItemView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub quantity: i64,
    pub price: String,
    pub price_raw: String,
    pub branch: String,
    pub reorder_point: i64,
    pub low_stock: bool,
}

impl From<&InventoryItem> for ItemView {
    fn from(item: &InventoryItem) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            description: item.description.clone(),
            quantity: item.quantity,
            price: item.price.to_string(),
            price_raw: item.price.amount().to_string(),
            branch: item.branch_id.to_string(),
            reorder_point: item.reorder_point,
            low_stock: item.is_low_stock(),
        }
    }
}

/// Branch option for the admin filter/form selects.
#[derive(Debug, Clone)]
pub struct BranchOption {
    pub code: String,
    pub name: String,
}

/// Inventory list page template.
#[derive(Template, WebTemplate)]
#[template(path = "inventory.html")]
pub struct InventoryTemplate {
    pub nav: NavContext,
    pub items: Vec<ItemView>,
    pub branch_options: Vec<BranchOption>,
    pub search: String,
    pub stock_filter: String,
    pub branch_filter: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

fn error_message(code: &str) -> &'static str {
    match code {
        "invalid_quantity" => "Quantity must be a whole number of zero or more.",
        "invalid_price" => "Price must be a number.",
        "invalid_reorder_point" => "Reorder point must be a whole number.",
        "invalid_branch" => "Unknown branch code.",
        "missing_name" => "The item needs a name.",
        "no_branch" => "You have no branch assigned; ask an admin.",
        _ => "The item could not be saved.",
    }
}

fn success_message(code: &str) -> &'static str {
    match code {
        "created" => "Item added.",
        "updated" => "Item updated.",
        "deleted" => "Item deleted.",
        _ => "Done.",
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Inventory list page with filters.
#[instrument(skip(current, state, query))]
pub async fn index(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<InventoryQuery>,
) -> Result<InventoryTemplate> {
    let nav = NavContext::new(&current, "/inventory");

    let empty = |nav: NavContext, query: &InventoryQuery| InventoryTemplate {
        nav,
        items: vec![],
        branch_options: vec![],
        search: query.q.clone(),
        stock_filter: query.stock.clone(),
        branch_filter: query.branch.clone(),
        error: None,
        success: None,
    };

    // Managers are pinned to their branch; admins may narrow by query.
    let scope_code = match current.scope() {
        BranchScope::Branch(code) => Some(code),
        BranchScope::All => {
            if query.branch.trim().is_empty() {
                None
            } else {
                match BranchCode::parse(&query.branch) {
                    Ok(code) => Some(code),
                    Err(_) => return Ok(empty(nav, &query)),
                }
            }
        }
        BranchScope::Unassigned => return Ok(empty(nav, &query)),
    };

    let tables = state.tables().as_ref();
    let inventory = InventoryRepository::new(tables, &current.access_token);
    let branches = BranchRepository::new(tables, &current.access_token);

    let (items_result, branches_result) =
        tokio::join!(inventory.list(scope_code.as_ref()), branches.list(None));

    let items = items_result?;

    // The branch select is an admin affordance; a failed fetch only
    // degrades the filter, not the page.
    let branch_options = match branches_result {
        Ok(rows) => rows
            .iter()
            .map(|b| BranchOption {
                code: b.branch_code.to_string(),
                name: b.name.clone(),
            })
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to fetch branches for filter: {e}");
            vec![]
        }
    };

    let needle = query.q.trim().to_lowercase();
    let low_only = query.stock == "low";

    let items: Vec<ItemView> = items
        .iter()
        .filter(|item| {
            let matches_search = needle.is_empty()
                || item.name.to_lowercase().contains(&needle)
                || item.description.to_lowercase().contains(&needle);
            let matches_stock = !low_only || item.is_low_stock();
            matches_search && matches_stock
        })
        .map(ItemView::from)
        .collect();

    Ok(InventoryTemplate {
        nav,
        items,
        branch_options,
        search: query.q,
        stock_filter: query.stock,
        branch_filter: query.branch,
        error: query.error.as_deref().map(|c| error_message(c).to_owned()),
        success: query
            .success
            .as_deref()
            .map(|c| success_message(c).to_owned()),
    })
}

/// Create an item.
#[instrument(skip(current, state, form))]
pub async fn create(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Form(form): Form<InventoryForm>,
) -> Response {
    let payload = match form.into_payload(&current) {
        Ok(payload) => payload,
        Err(code) => return Redirect::to(&format!("/inventory?error={code}")).into_response(),
    };

    let repo = InventoryRepository::new(state.tables().as_ref(), &current.access_token);
    match repo.create(&payload).await {
        Ok(item) => {
            tracing::info!(id = %item.id, "inventory item created");
            Redirect::to("/inventory?success=created").into_response()
        }
        Err(error) => AppError::from(error).into_response(),
    }
}

/// Update an item.
#[instrument(skip(current, state, form))]
pub async fn update(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
    Form(form): Form<InventoryForm>,
) -> Response {
    let payload = match form.into_payload(&current) {
        Ok(payload) => payload,
        Err(code) => return Redirect::to(&format!("/inventory?error={code}")).into_response(),
    };

    let repo = InventoryRepository::new(state.tables().as_ref(), &current.access_token);
    match repo.update(id, &payload).await {
        Ok(_) => Redirect::to("/inventory?success=updated").into_response(),
        Err(error) => AppError::from(error).into_response(),
    }
}

/// Delete an item.
#[instrument(skip(current, state))]
pub async fn delete(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> Result<Redirect> {
    let repo = InventoryRepository::new(state.tables().as_ref(), &current.access_token);
    repo.delete(id).await?;
    Ok(Redirect::to("/inventory?success=deleted"))
}
