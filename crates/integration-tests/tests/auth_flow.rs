//! End-to-end authentication flow tests.
//!
//! Each test spawns the full application on an ephemeral port, backed
//! by the in-process fake backend, and drives it with a cookie-holding
//! HTTP client.

use branchline_core::Role;
use branchline_integration_tests::{TestApp, location, profile_row};

#[tokio::test]
async fn health_endpoints_respond() {
    let app = TestApp::spawn().await;

    let resp = app.get("/health").await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = app.get("/health/ready").await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn unauthenticated_requests_redirect_to_login() {
    let app = TestApp::spawn().await;

    for path in ["/", "/employees", "/inventory", "/sales", "/branches"] {
        let resp = app.get(path).await;
        assert_eq!(resp.status(), 303, "{path} should redirect");
        assert_eq!(location(&resp), "/auth/login");
    }
}

#[tokio::test]
async fn login_page_renders() {
    let app = TestApp::spawn().await;

    let resp = app.get("/auth/login").await;
    assert_eq!(resp.status(), 200);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Sign in"));
    assert!(body.contains("/auth/register"));
}

#[tokio::test]
async fn bad_credentials_redirect_with_inline_error() {
    let app = TestApp::spawn().await;
    app.backend.register_user("maya@branchline.test", "hunter22xyz");

    let resp = app.login("maya@branchline.test", "wrong-password").await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/auth/login?error=credentials");

    // The error code renders as a human message
    let resp = app.get("/auth/login?error=credentials").await;
    let body = resp.text().await.unwrap();
    assert!(body.contains("Invalid email or password"));
}

#[tokio::test]
async fn unverified_email_gets_a_specific_error() {
    let app = TestApp::spawn().await;
    app.backend
        .register_unconfirmed_user("new@branchline.test", "hunter22xyz");

    let resp = app.login("new@branchline.test", "hunter22xyz").await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/auth/login?error=unverified");
}

#[tokio::test]
async fn admin_login_reaches_dashboard_with_admin_nav() {
    let app = TestApp::spawn().await;
    let admin_id = app.backend.register_user("admin@branchline.test", "hunter22xyz");
    app.backend
        .seed_row("user_profiles", profile_row(admin_id, Role::Admin, None));

    let resp = app.login("admin@branchline.test", "hunter22xyz").await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/");

    let resp = app.get("/").await;
    assert_eq!(resp.status(), 200);
    let body = resp.text().await.unwrap();
    assert!(body.contains("admin@branchline.test"));
    assert!(body.contains("Total Sales"));
    assert!(body.contains("/branches"), "admins see the Branches nav entry");
    assert!(body.contains("All branches"));
}

#[tokio::test]
async fn branch_manager_nav_is_filtered() {
    let app = TestApp::spawn().await;
    let manager_id = app.backend.register_user("mgr@branchline.test", "hunter22xyz");
    app.backend.seed_row(
        "user_profiles",
        profile_row(manager_id, Role::BranchManager, Some("NYC01")),
    );

    app.login("mgr@branchline.test", "hunter22xyz").await;

    let resp = app.get("/").await;
    assert_eq!(resp.status(), 200);
    let body = resp.text().await.unwrap();
    assert!(body.contains("NYC01"), "branch badge is shown");
    assert!(
        !body.contains("href=\"/branches\""),
        "managers do not get the Branches nav entry"
    );
}

#[tokio::test]
async fn logout_clears_the_session() {
    let app = TestApp::spawn().await;
    let id = app.backend.register_user("out@branchline.test", "hunter22xyz");
    app.backend
        .seed_row("user_profiles", profile_row(id, Role::Admin, None));

    app.login("out@branchline.test", "hunter22xyz").await;
    assert_eq!(app.get("/").await.status(), 200);

    let resp = app.post_form("/auth/logout", &[]).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/auth/login?success=signed_out");

    let resp = app.get("/").await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/auth/login");
}

#[tokio::test]
async fn profile_failure_shows_terminal_page_not_a_login_redirect() {
    let app = TestApp::spawn().await;
    app.backend.register_user("stuck@branchline.test", "hunter22xyz");
    app.backend.break_table("user_profiles");

    let resp = app.login("stuck@branchline.test", "hunter22xyz").await;
    assert_eq!(resp.status(), 303);

    // Settles as user-present/profile-missing: a real page with a retry
    // action, never a silent bounce to the login form.
    let resp = app.get("/").await;
    assert_eq!(resp.status(), 200);
    let body = resp.text().await.unwrap();
    assert!(body.contains("profile could not be loaded"));
    assert!(body.contains("/auth/reload"));
}

#[tokio::test]
async fn registration_signs_in_when_no_verification_is_required() {
    let app = TestApp::spawn().await;

    let resp = app
        .post_form(
            "/auth/register",
            &[
                ("email", "fresh@branchline.test"),
                ("password", "hunter22xyz"),
                ("password_confirm", "hunter22xyz"),
            ],
        )
        .await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/");

    let resp = app.get("/").await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn registration_validates_before_calling_the_backend() {
    let app = TestApp::spawn().await;

    let resp = app
        .post_form(
            "/auth/register",
            &[
                ("email", "fresh@branchline.test"),
                ("password", "hunter22xyz"),
                ("password_confirm", "different"),
            ],
        )
        .await;
    assert_eq!(location(&resp), "/auth/register?error=password_mismatch");

    let resp = app
        .post_form(
            "/auth/register",
            &[
                ("email", "fresh@branchline.test"),
                ("password", "short"),
                ("password_confirm", "short"),
            ],
        )
        .await;
    assert_eq!(location(&resp), "/auth/register?error=password_too_short");
}
