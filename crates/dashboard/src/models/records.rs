//! Branch-scoped business records.
//!
//! Every record carries the branch code it belongs to plus a creation
//! timestamp assigned by the backend. The `New*` companions are the
//! insert payloads - the backend mints `id` and `created_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use branchline_core::{BranchCode, BranchId, Email, EmployeeId, ItemId, Money, SaleId, UserId};

/// A physical branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub address: String,
    pub phone: String,
    /// Auth user id of the branch's manager, once assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<UserId>,
    /// Short human-assigned code; the value every scoped row references.
    pub branch_code: BranchCode,
}

/// Insert payload for [`Branch`].
#[derive(Debug, Clone, Serialize)]
pub struct NewBranch {
    pub name: String,
    pub address: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<UserId>,
    pub branch_code: BranchCode,
}

/// An employee assigned to a branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub created_at: DateTime<Utc>,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub position: String,
    pub branch_id: BranchCode,
    pub salary: Money,
}

impl Employee {
    /// Display name, `first last`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Insert payload for [`Employee`].
#[derive(Debug, Clone, Serialize)]
pub struct NewEmployee {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub position: String,
    pub branch_id: BranchCode,
    pub salary: Money,
}

/// A stocked item at a branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub description: String,
    pub quantity: i64,
    pub price: Money,
    pub branch_id: BranchCode,
    /// Quantity at or below which the item counts as low stock.
    pub reorder_point: i64,
}

impl InventoryItem {
    /// Whether current stock is at or below the reorder point.
    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_point
    }
}

/// Insert payload for [`InventoryItem`].
#[derive(Debug, Clone, Serialize)]
pub struct NewInventoryItem {
    pub name: String,
    pub description: String,
    pub quantity: i64,
    pub price: Money,
    pub branch_id: BranchCode,
    pub reorder_point: i64,
}

/// A recorded sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub created_at: DateTime<Utc>,
    pub item_id: ItemId,
    pub quantity: i64,
    pub total_amount: Money,
    pub employee_id: EmployeeId,
    pub branch_id: BranchCode,
}

/// Insert payload for [`Sale`].
#[derive(Debug, Clone, Serialize)]
pub struct NewSale {
    pub item_id: ItemId,
    pub quantity: i64,
    pub total_amount: Money,
    pub employee_id: EmployeeId,
    pub branch_id: BranchCode,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_low_stock_boundary() {
        let mut item = InventoryItem {
            id: ItemId::generate(),
            created_at: Utc::now(),
            name: "Widget".into(),
            description: String::new(),
            quantity: 10,
            price: Money::from_major(5),
            branch_id: BranchCode::parse("NYC01").unwrap(),
            reorder_point: 10,
        };
        assert!(item.is_low_stock());

        item.quantity = 11;
        assert!(!item.is_low_stock());
    }

    #[test]
    fn test_new_branch_skips_absent_manager() {
        let payload = NewBranch {
            name: "Downtown".into(),
            address: "1 Main St".into(),
            phone: "555-0100".into(),
            manager_id: None,
            branch_code: BranchCode::parse("NYC01").unwrap(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("manager_id").is_none());
    }
}
