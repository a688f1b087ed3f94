//! Demo data seeding.

use rust_decimal::Decimal;

use branchline_core::{BranchCode, Email, Money};
use branchline_dashboard::backend::BackendError;
use branchline_dashboard::data::{BranchRepository, EmployeeRepository, InventoryRepository};
use branchline_dashboard::models::{NewBranch, NewEmployee, NewInventoryItem};

use super::ServiceConnection;

struct BranchSeed {
    code: &'static str,
    name: &'static str,
    address: &'static str,
    phone: &'static str,
}

struct EmployeeSeed {
    first: &'static str,
    last: &'static str,
    email: &'static str,
    position: &'static str,
    branch: &'static str,
    salary: Decimal,
}

struct ItemSeed {
    name: &'static str,
    description: &'static str,
    quantity: i64,
    price: Decimal,
    branch: &'static str,
    reorder_point: i64,
}

const BRANCHES: &[BranchSeed] = &[
    BranchSeed {
        code: "NYC01",
        name: "Manhattan Flagship",
        address: "350 5th Ave, New York, NY",
        phone: "212-555-0144",
    },
    BranchSeed {
        code: "SEA01",
        name: "Seattle Waterfront",
        address: "1916 Pike Pl, Seattle, WA",
        phone: "206-555-0127",
    },
    BranchSeed {
        code: "AUS01",
        name: "Austin Lamar",
        address: "1100 S Lamar Blvd, Austin, TX",
        phone: "512-555-0190",
    },
];

fn employees() -> Vec<EmployeeSeed> {
    vec![
        EmployeeSeed {
            first: "Maya",
            last: "Okafor",
            email: "maya.okafor@branchline.test",
            position: "Store Lead",
            branch: "NYC01",
            salary: Decimal::new(68_000, 0),
        },
        EmployeeSeed {
            first: "Daniel",
            last: "Reyes",
            email: "daniel.reyes@branchline.test",
            position: "Sales Associate",
            branch: "NYC01",
            salary: Decimal::new(46_500, 0),
        },
        EmployeeSeed {
            first: "Priya",
            last: "Raman",
            email: "priya.raman@branchline.test",
            position: "Store Lead",
            branch: "SEA01",
            salary: Decimal::new(64_000, 0),
        },
    ]
}

fn items() -> Vec<ItemSeed> {
    vec![
        ItemSeed {
            name: "Field Notebook",
            description: "A5 dotted, 120 pages",
            quantity: 42,
            price: Decimal::new(1299, 2),
            branch: "NYC01",
            reorder_point: 10,
        },
        ItemSeed {
            name: "Brass Pen",
            description: "Machined brass, fine nib",
            quantity: 7,
            price: Decimal::new(4500, 2),
            branch: "NYC01",
            reorder_point: 10,
        },
        ItemSeed {
            name: "Canvas Tote",
            description: "Waxed canvas, natural",
            quantity: 18,
            price: Decimal::new(3250, 2),
            branch: "SEA01",
            reorder_point: 5,
        },
    ]
}

/// Seed demo branches, employees, and inventory.
///
/// Safe to run repeatedly: rows that already exist (unique-key
/// conflicts) are skipped.
///
/// # Errors
///
/// Returns an error when the environment is incomplete or a
/// non-conflict backend failure occurs.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let connection = ServiceConnection::from_env()?;
    let token = connection.token();

    let branches = BranchRepository::new(&connection.client, token);
    for seed in BRANCHES {
        let payload = NewBranch {
            name: seed.name.to_owned(),
            address: seed.address.to_owned(),
            phone: seed.phone.to_owned(),
            manager_id: None,
            branch_code: BranchCode::parse(seed.code)?,
        };
        match branches.create(&payload).await {
            Ok(branch) => tracing::info!(code = %branch.branch_code, "branch seeded"),
            Err(BackendError::Conflict(_)) => {
                tracing::info!(code = seed.code, "branch already exists, skipping");
            }
            Err(other) => return Err(other.into()),
        }
    }

    let repo = EmployeeRepository::new(&connection.client, token);
    for seed in employees() {
        let payload = NewEmployee {
            first_name: seed.first.to_owned(),
            last_name: seed.last.to_owned(),
            email: Email::parse(seed.email)?,
            position: seed.position.to_owned(),
            branch_id: BranchCode::parse(seed.branch)?,
            salary: Money::new(seed.salary),
        };
        match repo.create(&payload).await {
            Ok(employee) => tracing::info!(id = %employee.id, "employee seeded"),
            Err(BackendError::Conflict(_)) => {
                tracing::info!(email = seed.email, "employee already exists, skipping");
            }
            Err(other) => return Err(other.into()),
        }
    }

    let repo = InventoryRepository::new(&connection.client, token);
    for seed in items() {
        let payload = NewInventoryItem {
            name: seed.name.to_owned(),
            description: seed.description.to_owned(),
            quantity: seed.quantity,
            price: Money::new(seed.price),
            branch_id: BranchCode::parse(seed.branch)?,
            reorder_point: seed.reorder_point,
        };
        match repo.create(&payload).await {
            Ok(item) => tracing::info!(id = %item.id, "inventory item seeded"),
            Err(BackendError::Conflict(_)) => {
                tracing::info!(name = seed.name, "item already exists, skipping");
            }
            Err(other) => return Err(other.into()),
        }
    }

    tracing::info!("seeding complete");
    Ok(())
}
