//! Integration test harness for Branchline.
//!
//! Spawns the full dashboard application (router, session layer, guard,
//! reconciliation controllers) on an ephemeral port, wired to an
//! in-process [`FakeBackend`] that implements the same capability
//! traits as the hosted service. Tests drive it over HTTP with a
//! cookie-holding `reqwest` client, exactly as a browser would.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)] // test harness: panics ARE the failure mode

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use uuid::Uuid;

use branchline_core::{Email, Role, UserId};
use branchline_dashboard::backend::{
    AuthApi, AuthUser, BackendError, BackendSession, Query, SignUpOutcome, TableApi,
};
use branchline_dashboard::config::{AuthConfig, BackendConfig, DashboardConfig, SentryConfig};
use branchline_dashboard::state::AppState;

// =============================================================================
// Fake backend
// =============================================================================

struct FakeUser {
    id: UserId,
    password: String,
    confirmed: bool,
}

#[derive(Default)]
struct FakeState {
    users: HashMap<String, FakeUser>,
    refresh_tokens: HashMap<String, UserId>,
    tables: HashMap<String, Vec<Value>>,
    broken_tables: HashSet<String>,
}

/// In-process stand-in for the hosted backend.
///
/// Implements the auth dialect (password grant, refresh rotation,
/// revocation) and the row dialect (explicit single-object miss,
/// unique-`id` conflicts) closely enough that the application cannot
/// tell the difference.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a confirmed user; returns their id.
    pub fn register_user(&self, email: &str, password: &str) -> UserId {
        self.insert_user(email, password, true)
    }

    /// Register a user whose email is still unverified.
    pub fn register_unconfirmed_user(&self, email: &str, password: &str) -> UserId {
        self.insert_user(email, password, false)
    }

    fn insert_user(&self, email: &str, password: &str, confirmed: bool) -> UserId {
        let id = UserId::generate();
        let mut state = self.state.lock().expect("fake state lock");
        state.users.insert(
            email.to_owned(),
            FakeUser {
                id,
                password: password.to_owned(),
                confirmed,
            },
        );
        id
    }

    /// Seed a raw row into a table.
    pub fn seed_row(&self, table: &str, row: Value) {
        let mut state = self.state.lock().expect("fake state lock");
        state.tables.entry(table.to_owned()).or_default().push(row);
    }

    /// Make every read/write against a table fail with a 500.
    pub fn break_table(&self, table: &str) {
        let mut state = self.state.lock().expect("fake state lock");
        state.broken_tables.insert(table.to_owned());
    }

    /// Snapshot of a table's rows.
    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<Value> {
        let state = self.state.lock().expect("fake state lock");
        state.tables.get(table).cloned().unwrap_or_default()
    }

    fn mint_session(state: &mut FakeState, id: UserId, email: &str) -> BackendSession {
        let refresh_token = format!("refresh-{}", Uuid::new_v4());
        state.refresh_tokens.insert(refresh_token.clone(), id);

        BackendSession {
            access_token: format!("access-{}", Uuid::new_v4()),
            refresh_token,
            expires_at: Utc::now() + chrono::Duration::hours(1),
            user: AuthUser {
                id,
                email: Email::parse(email).expect("seeded email is valid"),
            },
        }
    }

    fn server_error() -> BackendError {
        BackendError::Api {
            status: 500,
            code: None,
            message: "table unavailable".into(),
        }
    }
}

#[async_trait]
impl AuthApi for FakeBackend {
    async fn get_session(
        &self,
        refresh_token: &str,
    ) -> Result<Option<BackendSession>, BackendError> {
        let mut state = self.state.lock().expect("fake state lock");
        let Some(id) = state.refresh_tokens.remove(refresh_token) else {
            return Ok(None);
        };

        let email = state
            .users
            .iter()
            .find(|(_, user)| user.id == id)
            .map(|(email, _)| email.clone());
        let Some(email) = email else {
            return Ok(None);
        };

        // Refresh tokens rotate: the old one is consumed above.
        Ok(Some(Self::mint_session(&mut state, id, &email)))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<BackendSession, BackendError> {
        let mut state = self.state.lock().expect("fake state lock");

        let Some(user) = state.users.get(email) else {
            return Err(BackendError::Auth("Invalid login credentials".into()));
        };
        if user.password != password {
            return Err(BackendError::Auth("Invalid login credentials".into()));
        }
        if !user.confirmed {
            return Err(BackendError::EmailNotConfirmed);
        }

        let id = user.id;
        Ok(Self::mint_session(&mut state, id, email))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, BackendError> {
        {
            let state = self.state.lock().expect("fake state lock");
            if state.users.contains_key(email) {
                return Err(BackendError::Auth("User already registered".into()));
            }
        }

        // Verification is disabled on the fake: sign-up yields a session.
        let id = self.insert_user(email, password, true);
        let mut state = self.state.lock().expect("fake state lock");
        let session = Self::mint_session(&mut state, id, email);
        Ok(SignUpOutcome {
            user: session.user.clone(),
            session: Some(session),
        })
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), BackendError> {
        Ok(())
    }

    async fn health(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

#[async_trait]
impl TableApi for FakeBackend {
    async fn select(
        &self,
        _token: &str,
        table: &str,
        query: Query,
    ) -> Result<Vec<Value>, BackendError> {
        let state = self.state.lock().expect("fake state lock");
        if state.broken_tables.contains(table) {
            return Err(Self::server_error());
        }

        let rows = state.tables.get(table).cloned().unwrap_or_default();
        Ok(rows.into_iter().filter(|r| query.matches(r)).collect())
    }

    async fn select_one(
        &self,
        token: &str,
        table: &str,
        query: Query,
    ) -> Result<Value, BackendError> {
        let rows = self.select(token, table, query).await?;
        match rows.len() {
            0 => Err(BackendError::NotFound),
            1 => Ok(rows.into_iter().next().expect("length checked")),
            n => Err(BackendError::Api {
                status: 300,
                code: None,
                message: format!("expected one row, got {n}"),
            }),
        }
    }

    async fn insert(&self, _token: &str, table: &str, row: Value) -> Result<Value, BackendError> {
        let mut state = self.state.lock().expect("fake state lock");
        if state.broken_tables.contains(table) {
            return Err(Self::server_error());
        }

        let mut row = row;
        // The backend mints id and created_at when the payload omits them.
        if row.get("id").is_none() {
            row["id"] = json!(Uuid::new_v4().to_string());
        }
        if row.get("created_at").is_none() {
            row["created_at"] = json!(Utc::now());
        }

        let rows = state.tables.entry(table.to_owned()).or_default();
        if rows.iter().any(|r| r["id"] == row["id"]) {
            return Err(BackendError::Conflict(
                "duplicate key value violates unique constraint".into(),
            ));
        }

        rows.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        _token: &str,
        table: &str,
        query: Query,
        patch: Value,
    ) -> Result<Value, BackendError> {
        let mut state = self.state.lock().expect("fake state lock");
        if state.broken_tables.contains(table) {
            return Err(Self::server_error());
        }

        let rows = state.tables.entry(table.to_owned()).or_default();
        let mut updated = None;
        for row in rows.iter_mut() {
            if query.matches(row)
                && let (Some(target), Some(fields)) = (row.as_object_mut(), patch.as_object())
            {
                for (key, value) in fields {
                    target.insert(key.clone(), value.clone());
                }
                updated = Some(row.clone());
            }
        }

        updated.ok_or(BackendError::NotFound)
    }

    async fn delete(&self, _token: &str, table: &str, query: Query) -> Result<(), BackendError> {
        let mut state = self.state.lock().expect("fake state lock");
        if state.broken_tables.contains(table) {
            return Err(Self::server_error());
        }

        if let Some(rows) = state.tables.get_mut(table) {
            rows.retain(|r| !query.matches(r));
        }
        Ok(())
    }
}

// =============================================================================
// Row builders
// =============================================================================

/// A `user_profiles` row.
#[must_use]
pub fn profile_row(user_id: UserId, role: Role, branch: Option<&str>) -> Value {
    json!({
        "id": user_id.to_string(),
        "role": role.as_str(),
        "branch_id": branch,
        "created_at": Utc::now(),
    })
}

/// An `inventory` row.
#[must_use]
pub fn inventory_row(name: &str, branch: &str, quantity: i64, price: &str) -> Value {
    json!({
        "id": Uuid::new_v4().to_string(),
        "created_at": Utc::now(),
        "name": name,
        "description": "",
        "quantity": quantity,
        "price": price,
        "branch_id": branch,
        "reorder_point": 10,
    })
}

/// An `employees` row.
#[must_use]
pub fn employee_row(first: &str, last: &str, branch: &str) -> Value {
    json!({
        "id": Uuid::new_v4().to_string(),
        "created_at": Utc::now(),
        "first_name": first,
        "last_name": last,
        "email": format!("{}.{}@branchline.test", first.to_lowercase(), last.to_lowercase()),
        "position": "Sales Associate",
        "branch_id": branch,
        "salary": "45000",
    })
}

// =============================================================================
// Test application
// =============================================================================

/// Configuration for a test instance: loopback bind, short resolution
/// timeout, defaults otherwise.
#[must_use]
pub fn test_config() -> DashboardConfig {
    DashboardConfig {
        host: "127.0.0.1".parse().expect("loopback parses"),
        port: 0,
        base_url: "http://127.0.0.1".to_owned(),
        backend: BackendConfig {
            url: "http://127.0.0.1:1".to_owned(),
            publishable_key: "eyJhbGciOiJIUzI1NiJ9.t3stK3yM4t3r14lN0tR34l".to_owned(),
            request_timeout_secs: 2,
        },
        auth: AuthConfig {
            default_role: Role::BranchManager,
            resolve_timeout: Duration::from_secs(5),
            resolve_attempts: 3,
        },
        sentry: SentryConfig::default(),
    }
}

/// A running dashboard instance wired to a [`FakeBackend`].
pub struct TestApp {
    pub base_url: String,
    pub backend: Arc<FakeBackend>,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn the app with a fresh fake backend.
    pub async fn spawn() -> Self {
        Self::spawn_with(Arc::new(FakeBackend::new())).await
    }

    /// Spawn the app around an already-seeded fake backend.
    pub async fn spawn_with(backend: Arc<FakeBackend>) -> Self {
        let state = AppState::with_backend(
            test_config(),
            Arc::clone(&backend) as Arc<dyn AuthApi>,
            Arc::clone(&backend) as Arc<dyn TableApi>,
        );
        let app = branchline_dashboard::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server error");
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("client builds");

        Self {
            base_url: format!("http://{addr}"),
            backend,
            client,
        }
    }

    /// GET a path, returning the raw response (redirects not followed).
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .expect("request failed")
    }

    /// POST a form, returning the raw response (redirects not followed).
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(format!("{}{path}", self.base_url))
            .form(form)
            .send()
            .await
            .expect("request failed")
    }

    /// Sign in through the real login route.
    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.post_form("/auth/login", &[("email", email), ("password", password)])
            .await
    }
}

/// Location header of a redirect response.
#[must_use]
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}
