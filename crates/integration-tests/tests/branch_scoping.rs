//! Branch scoping of reads and writes.
//!
//! Admins see everything; branch managers are pinned to their branch on
//! both the query side and the write side, whatever their forms submit.

use branchline_core::Role;
use branchline_integration_tests::{
    TestApp, employee_row, inventory_row, location, profile_row,
};

async fn admin_app() -> TestApp {
    let app = TestApp::spawn().await;
    let id = app.backend.register_user("admin@branchline.test", "hunter22xyz");
    app.backend
        .seed_row("user_profiles", profile_row(id, Role::Admin, None));
    app.login("admin@branchline.test", "hunter22xyz").await;
    app
}

async fn manager_app(branch: &str) -> TestApp {
    let app = TestApp::spawn().await;
    let id = app.backend.register_user("mgr@branchline.test", "hunter22xyz");
    app.backend.seed_row(
        "user_profiles",
        profile_row(id, Role::BranchManager, Some(branch)),
    );
    app.login("mgr@branchline.test", "hunter22xyz").await;
    app
}

#[tokio::test]
async fn admin_sees_inventory_across_branches() {
    let app = admin_app().await;
    app.backend
        .seed_row("inventory", inventory_row("Brass Pen", "NYC01", 7, "45.00"));
    app.backend
        .seed_row("inventory", inventory_row("Canvas Tote", "SEA01", 18, "32.50"));

    let resp = app.get("/inventory").await;
    assert_eq!(resp.status(), 200);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Brass Pen"));
    assert!(body.contains("Canvas Tote"));
}

#[tokio::test]
async fn branch_manager_sees_only_their_branch() {
    let app = manager_app("NYC01").await;
    app.backend
        .seed_row("inventory", inventory_row("Brass Pen", "NYC01", 7, "45.00"));
    app.backend
        .seed_row("inventory", inventory_row("Canvas Tote", "SEA01", 18, "32.50"));
    app.backend
        .seed_row("employees", employee_row("Maya", "Okafor", "NYC01"));
    app.backend
        .seed_row("employees", employee_row("Priya", "Raman", "SEA01"));

    let resp = app.get("/inventory").await;
    let body = resp.text().await.unwrap();
    assert!(body.contains("Brass Pen"));
    assert!(!body.contains("Canvas Tote"));

    let resp = app.get("/employees").await;
    let body = resp.text().await.unwrap();
    assert!(body.contains("Maya Okafor"));
    assert!(!body.contains("Priya Raman"));
}

#[tokio::test]
async fn low_stock_filter_narrows_the_list() {
    let app = admin_app().await;
    app.backend
        .seed_row("inventory", inventory_row("Brass Pen", "NYC01", 7, "45.00"));
    app.backend
        .seed_row("inventory", inventory_row("Field Notebook", "NYC01", 42, "12.99"));

    let resp = app.get("/inventory?stock=low").await;
    let body = resp.text().await.unwrap();
    assert!(body.contains("Brass Pen"), "7 <= reorder point of 10");
    assert!(!body.contains("Field Notebook"));

    let resp = app.get("/inventory?q=notebook").await;
    let body = resp.text().await.unwrap();
    assert!(body.contains("Field Notebook"));
    assert!(!body.contains("Brass Pen"));
}

#[tokio::test]
async fn manager_created_items_are_pinned_to_their_branch() {
    let app = manager_app("NYC01").await;

    // The form submits a foreign branch; the server must ignore it.
    let resp = app
        .post_form(
            "/inventory",
            &[
                ("name", "Smuggled Item"),
                ("description", ""),
                ("quantity", "5"),
                ("price", "10.00"),
                ("branch_id", "SEA01"),
                ("reorder_point", ""),
            ],
        )
        .await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/inventory?success=created");

    let rows = app.backend.rows("inventory");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["branch_id"], "NYC01");
    assert_eq!(rows[0]["reorder_point"], 10, "blank reorder point defaults");
}

#[tokio::test]
async fn branch_management_is_admin_only() {
    let app = manager_app("NYC01").await;

    let resp = app
        .post_form(
            "/branches",
            &[
                ("name", "Rogue Branch"),
                ("address", ""),
                ("phone", ""),
                ("branch_code", "BAD01"),
            ],
        )
        .await;
    assert_eq!(resp.status(), 403);
    assert!(app.backend.rows("branches").is_empty());
}

#[tokio::test]
async fn admin_creates_updates_and_deletes_a_branch() {
    let app = admin_app().await;

    let resp = app
        .post_form(
            "/branches",
            &[
                ("name", "Manhattan Flagship"),
                ("address", "350 5th Ave"),
                ("phone", "212-555-0144"),
                ("branch_code", "nyc01"),
            ],
        )
        .await;
    assert_eq!(location(&resp), "/branches?success=created");

    let rows = app.backend.rows("branches");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["branch_code"], "NYC01", "codes are normalized");

    let id = rows[0]["id"].as_str().unwrap().to_owned();
    let resp = app
        .post_form(
            &format!("/branches/{id}"),
            &[
                ("name", "Manhattan"),
                ("address", "350 5th Ave"),
                ("phone", "212-555-0144"),
                ("branch_code", "NYC01"),
            ],
        )
        .await;
    assert_eq!(location(&resp), "/branches?success=updated");
    assert_eq!(app.backend.rows("branches")[0]["name"], "Manhattan");

    let resp = app.post_form(&format!("/branches/{id}/delete"), &[]).await;
    assert_eq!(location(&resp), "/branches?success=deleted");
    assert!(app.backend.rows("branches").is_empty());
}

#[tokio::test]
async fn sale_totals_are_computed_from_the_item_row() {
    let app = manager_app("NYC01").await;
    app.backend
        .seed_row("inventory", inventory_row("Brass Pen", "NYC01", 7, "45.00"));
    app.backend
        .seed_row("employees", employee_row("Maya", "Okafor", "NYC01"));

    let item_id = app.backend.rows("inventory")[0]["id"]
        .as_str()
        .unwrap()
        .to_owned();
    let employee_id = app.backend.rows("employees")[0]["id"]
        .as_str()
        .unwrap()
        .to_owned();

    let resp = app
        .post_form(
            "/sales",
            &[
                ("item_id", item_id.as_str()),
                ("employee_id", employee_id.as_str()),
                ("quantity", "3"),
            ],
        )
        .await;
    assert_eq!(location(&resp), "/sales?success=recorded");

    let sales = app.backend.rows("sales");
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0]["total_amount"], "135.00");
    assert_eq!(sales[0]["branch_id"], "NYC01");
}

#[tokio::test]
async fn sales_for_foreign_branch_items_are_rejected() {
    let app = manager_app("NYC01").await;
    app.backend
        .seed_row("inventory", inventory_row("Canvas Tote", "SEA01", 18, "32.50"));
    app.backend
        .seed_row("employees", employee_row("Maya", "Okafor", "NYC01"));

    let item_id = app.backend.rows("inventory")[0]["id"]
        .as_str()
        .unwrap()
        .to_owned();
    let employee_id = app.backend.rows("employees")[0]["id"]
        .as_str()
        .unwrap()
        .to_owned();

    let resp = app
        .post_form(
            "/sales",
            &[
                ("item_id", item_id.as_str()),
                ("employee_id", employee_id.as_str()),
                ("quantity", "1"),
            ],
        )
        .await;
    assert_eq!(location(&resp), "/sales?error=wrong_branch");
    assert!(app.backend.rows("sales").is_empty());
}
