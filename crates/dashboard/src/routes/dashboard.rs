//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use branchline_core::Money;

use crate::data::{BranchRepository, EmployeeRepository, InventoryRepository, SaleRepository};
use crate::filters;
use crate::middleware::{BranchScope, RequireAuth};
use crate::models::{InventoryItem, Sale};
use crate::state::AppState;

use super::NavContext;

/// How many recent sales the dashboard shows.
const RECENT_SALES: u32 = 5;

/// Aggregate metric cards.
#[derive(Debug, Clone)]
pub struct DashboardMetrics {
    pub sales_total: String,
    pub employees: String,
    pub inventory_items: String,
    pub branches: String,
}

impl Default for DashboardMetrics {
    fn default() -> Self {
        Self {
            sales_total: "$0.00".to_string(),
            employees: "0".to_string(),
            inventory_items: "0".to_string(),
            branches: "0".to_string(),
        }
    }
}

/// Recent sale row for the activity list.
#[derive(Debug, Clone)]
pub struct RecentSaleView {
    pub branch: String,
    pub quantity: i64,
    pub total: String,
    pub recorded_at: String,
}

impl From<&Sale> for RecentSaleView {
    fn from(sale: &Sale) -> Self {
        Self {
            branch: sale.branch_id.to_string(),
            quantity: sale.quantity,
            total: sale.total_amount.to_string(),
            recorded_at: sale.created_at.to_rfc3339(),
        }
    }
}

/// Low-stock alert row.
#[derive(Debug, Clone)]
pub struct LowStockView {
    pub name: String,
    pub quantity: i64,
    pub reorder_point: i64,
    pub branch: String,
}

impl From<&InventoryItem> for LowStockView {
    fn from(item: &InventoryItem) -> Self {
        Self {
            name: item.name.clone(),
            quantity: item.quantity,
            reorder_point: item.reorder_point,
            branch: item.branch_id.to_string(),
        }
    }
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub nav: NavContext,
    pub metrics: DashboardMetrics,
    pub recent_sales: Vec<RecentSaleView>,
    pub low_stock: Vec<LowStockView>,
}

/// Dashboard page handler.
///
/// The four cards are independent; one failing fetch logs and renders
/// as its default rather than failing the page.
#[instrument(skip(current, state))]
pub async fn index(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
) -> DashboardTemplate {
    let nav = NavContext::new(&current, "/");

    let scope_code = match current.scope() {
        BranchScope::All => None,
        BranchScope::Branch(code) => Some(code),
        BranchScope::Unassigned => {
            // Nothing to aggregate until a branch is assigned.
            return DashboardTemplate {
                nav,
                metrics: DashboardMetrics::default(),
                recent_sales: vec![],
                low_stock: vec![],
            };
        }
    };
    let scope = scope_code.as_ref();

    let tables = state.tables().as_ref();
    let token = current.access_token.as_str();

    let branches = BranchRepository::new(tables, token);
    let employees = EmployeeRepository::new(tables, token);
    let inventory = InventoryRepository::new(tables, token);
    let sales = SaleRepository::new(tables, token);

    let (branches_result, employees_result, inventory_result, sales_result) = tokio::join!(
        branches.list(scope),
        employees.list(scope),
        inventory.list(scope),
        sales.recent(scope, 200),
    );

    let branch_count = match branches_result {
        Ok(rows) => rows.len().to_string(),
        Err(e) => {
            tracing::error!("Failed to fetch branches: {e}");
            "0".to_string()
        }
    };

    let employee_count = match employees_result {
        Ok(rows) => rows.len().to_string(),
        Err(e) => {
            tracing::error!("Failed to fetch employees: {e}");
            "0".to_string()
        }
    };

    let (item_count, low_stock) = match inventory_result {
        Ok(items) => {
            let low: Vec<LowStockView> = items
                .iter()
                .filter(|i| i.is_low_stock())
                .map(LowStockView::from)
                .collect();
            (items.len().to_string(), low)
        }
        Err(e) => {
            tracing::error!("Failed to fetch inventory: {e}");
            ("0".to_string(), vec![])
        }
    };

    let (sales_total, recent_sales) = match sales_result {
        Ok(rows) => {
            let total: Money = rows.iter().map(|s| s.total_amount).sum();
            let recent: Vec<RecentSaleView> = rows
                .iter()
                .take(RECENT_SALES as usize)
                .map(RecentSaleView::from)
                .collect();
            (total.to_string(), recent)
        }
        Err(e) => {
            tracing::error!("Failed to fetch sales: {e}");
            ("$0.00".to_string(), vec![])
        }
    };

    DashboardTemplate {
        nav,
        metrics: DashboardMetrics {
            sales_total,
            employees: employee_count,
            inventory_items: item_count,
            branches: branch_count,
        },
        recent_sales,
        low_stock,
    }
}
