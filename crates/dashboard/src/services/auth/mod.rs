//! Session and profile reconciliation.
//!
//! One [`SessionController`] exists per login. It owns the published
//! `(user, profile, loading)` tuple, reconciling it against the hosted
//! backend whenever a session is bootstrapped, an auth event fires, or a
//! reload is forced.
//!
//! # Generations
//!
//! Resolutions overlap: a sign-in can land while the previous user's
//! profile fetch is still in flight, a logout can land mid-resolve, and
//! a forced reload supersedes whatever preceded it. Every state change
//! that starts a new resolution advances a generation counter, every
//! spawned resolution carries the generation it was issued under, and
//! completions publish through a closure that rejects stale generations.
//! Because both the advance and the check run inside the watch channel's
//! modify lock, "a stale resolution cannot clobber fresher state" is a
//! structural property rather than a convention.
//!
//! # Termination
//!
//! `loading == false` always means the tuple is terminal for the current
//! generation: user and profile present, or signed out, or a surfaced
//! resolution failure. A per-generation watchdog forces `loading` to
//! false after a configured bound if the backend never answers; it
//! preserves whatever is known and never fabricates success.

mod error;
mod resolver;

pub use error::ResolveError;
pub use resolver::ProfileResolver;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use branchline_core::{BranchCode, Role};

use crate::backend::{AuthApi, AuthUser, BackendError, BackendSession, TableApi};
use crate::models::Profile;

/// Auth service events the controller reacts to.
#[derive(Debug)]
pub enum AuthEvent {
    /// A sign-in produced a fresh session.
    SignedIn(BackendSession),
    /// The session's tokens were refreshed.
    TokenRefreshed(BackendSession),
    /// The session ended; supersedes any in-flight resolution.
    SignedOut,
}

/// Access and refresh tokens of the live session.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// The published reconciliation state.
#[derive(Debug, Clone)]
pub struct AuthState {
    generation: u64,
    /// The authenticated identity, if any.
    pub user: Option<AuthUser>,
    /// The application profile, once resolved.
    pub profile: Option<Profile>,
    /// Whether a resolution is still pending for this generation.
    pub loading: bool,
    /// Message of a terminal resolution failure, if one occurred.
    pub error: Option<String>,
    session: Option<SessionTokens>,
}

impl AuthState {
    fn initial() -> Self {
        Self {
            generation: 0,
            user: None,
            profile: None,
            loading: true,
            error: None,
            session: None,
        }
    }

    /// Reset to the signed-out terminal state.
    fn clear(&mut self) {
        self.user = None;
        self.profile = None;
        self.session = None;
        self.error = None;
        self.loading = false;
    }

    /// Whether the resolved profile grants full access.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.profile.as_ref().is_some_and(|p| p.role == Role::Admin)
    }

    /// Whether the resolved profile is branch-scoped.
    #[must_use]
    pub fn is_branch_manager(&self) -> bool {
        self.profile
            .as_ref()
            .is_some_and(|p| p.role == Role::BranchManager)
    }

    /// The branch a branch manager is pinned to.
    #[must_use]
    pub fn branch_id(&self) -> Option<&BranchCode> {
        self.profile.as_ref().and_then(|p| p.branch_id.as_ref())
    }

    /// Bearer token for data requests, while signed in.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.session.as_ref().map(|t| t.access_token.as_str())
    }

    /// Latest refresh token, while signed in.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.session.as_ref().map(|t| t.refresh_token.as_str())
    }

    /// The generation this snapshot was published under.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Controller tuning, derived from [`crate::config::AuthConfig`].
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Role given to lazily-created profiles.
    pub default_role: Role,
    /// Upper bound before a pending resolution is forced to settle.
    pub settle_timeout: Duration,
    /// Maximum profile resolution attempts for transient failures.
    pub resolve_attempts: u32,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            default_role: Role::BranchManager,
            settle_timeout: Duration::from_secs(5),
            resolve_attempts: 3,
        }
    }
}

impl From<&crate::config::AuthConfig> for ControllerSettings {
    fn from(config: &crate::config::AuthConfig) -> Self {
        Self {
            default_role: config.default_role,
            settle_timeout: config.resolve_timeout,
            resolve_attempts: config.resolve_attempts,
        }
    }
}

/// Per-login session and profile reconciliation controller.
///
/// Explicitly constructed with injected backend capabilities - there is
/// no process-global auth state anywhere in the crate.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    auth: Arc<dyn AuthApi>,
    resolver: ProfileResolver,
    settings: ControllerSettings,
    tx: watch::Sender<AuthState>,
}

impl SessionController {
    #[must_use]
    pub fn new(
        auth: Arc<dyn AuthApi>,
        tables: Arc<dyn TableApi>,
        settings: ControllerSettings,
    ) -> Self {
        let resolver = ProfileResolver::new(
            tables,
            settings.default_role,
            settings.resolve_attempts,
        );
        let (tx, _) = watch::channel(AuthState::initial());

        Self {
            inner: Arc::new(ControllerInner {
                auth,
                resolver,
                settings,
                tx,
            }),
        }
    }

    /// Observe every published state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.tx.subscribe()
    }

    /// The current published state.
    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.inner.tx.borrow().clone()
    }

    /// Await a terminal state for the current generation.
    pub async fn settled(&self) -> AuthState {
        let mut rx = self.subscribe();
        match rx.wait_for(|state| !state.loading).await {
            Ok(state) => state.clone(),
            // The sender lives in `self`, so this arm is unreachable in
            // practice; fall back to whatever is current.
            Err(_) => self.snapshot(),
        }
    }

    /// Bootstrap from a stored refresh token (or its absence).
    ///
    /// Without a token the state settles signed-out immediately. With
    /// one, a session fetch runs in the background: a rejected token
    /// settles signed-out, a live session hands off to profile
    /// resolution, and a transport failure is logged and treated as
    /// signed-out rather than crashing the login.
    pub fn initialize(&self, stored_refresh_token: Option<String>) {
        let Some(refresh_token) = stored_refresh_token else {
            self.advance(AuthState::clear);
            return;
        };

        let generation = self.advance(|state| state.loading = true);
        self.arm_watchdog(generation);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            Self::bootstrap(&inner, generation, &refresh_token).await;
        });
    }

    /// React to an auth service event.
    pub fn handle_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(session) | AuthEvent::TokenRefreshed(session) => {
                let generation = self.advance(|state| {
                    state.loading = true;
                    state.error = None;
                });
                self.arm_watchdog(generation);

                let inner = Arc::clone(&self.inner);
                tokio::spawn(async move {
                    Self::resolve_session(&inner, generation, session).await;
                });
            }
            AuthEvent::SignedOut => {
                self.advance(AuthState::clear);
            }
        }
    }

    /// Re-run the bootstrap/resolve pipeline from the stored tokens.
    ///
    /// Manual recovery path for the profile-missing terminal state; any
    /// in-flight resolution from an earlier generation is discarded.
    pub fn force_reload(&self) {
        let refresh_token = self.snapshot().refresh_token().map(str::to_owned);
        self.initialize(refresh_token);
    }

    /// Sign out remotely and clear the published state.
    ///
    /// The state is cleared to signed-out even when the remote call
    /// fails - re-entering a broken session helps nobody - and the
    /// failure is returned so the caller can surface it.
    ///
    /// # Errors
    ///
    /// Returns the backend failure from the revocation call, if any.
    pub async fn logout(&self) -> Result<(), BackendError> {
        let access_token = self.snapshot().access_token().map(str::to_owned);

        let generation = self.advance(|state| state.loading = true);
        self.arm_watchdog(generation);

        let result = match access_token {
            Some(token) => self.inner.auth.sign_out(&token).await,
            None => Ok(()),
        };

        if let Err(error) = &result {
            tracing::warn!(%error, "remote sign-out failed; clearing session anyway");
        }

        self.advance(AuthState::clear);
        result
    }

    // =========================================================================
    // Pipeline internals
    // =========================================================================

    /// Advance the generation and apply `f`, atomically.
    ///
    /// Returns the new generation; any resolution spawned for an earlier
    /// generation is now stale and its completion will be rejected.
    fn advance(&self, f: impl FnOnce(&mut AuthState)) -> u64 {
        let mut generation = 0;
        self.inner.tx.send_modify(|state| {
            state.generation += 1;
            f(state);
            generation = state.generation;
        });
        generation
    }

    /// Apply `f` only if `generation` is still current.
    fn publish(inner: &ControllerInner, generation: u64, f: impl FnOnce(&mut AuthState)) {
        inner.tx.send_if_modified(|state| {
            if state.generation != generation {
                tracing::debug!(
                    stale = generation,
                    current = state.generation,
                    "discarding superseded resolution result"
                );
                return false;
            }
            f(state);
            true
        });
    }

    /// Force `loading` to settle if `generation` is still pending after
    /// the configured bound. Known values are preserved; nothing is
    /// fabricated.
    fn arm_watchdog(&self, generation: u64) {
        let inner = Arc::clone(&self.inner);
        let timeout = self.inner.settings.settle_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let fired = inner.tx.send_if_modified(|state| {
                if state.generation == generation && state.loading {
                    state.loading = false;
                    true
                } else {
                    false
                }
            });
            if fired {
                tracing::warn!(
                    generation,
                    timeout_secs = timeout.as_secs(),
                    "session resolution timed out; forcing settled state"
                );
            }
        });
    }

    /// Session bootstrap: stored refresh token to live session.
    async fn bootstrap(inner: &Arc<ControllerInner>, generation: u64, refresh_token: &str) {
        match inner.auth.get_session(refresh_token).await {
            Ok(Some(session)) => Self::resolve_session(inner, generation, session).await,
            Ok(None) => {
                Self::publish(inner, generation, AuthState::clear);
            }
            Err(error) => {
                tracing::error!(%error, "session fetch failed; treating as signed out");
                Self::publish(inner, generation, AuthState::clear);
            }
        }
    }

    /// Publish the session's user, then resolve its profile.
    async fn resolve_session(
        inner: &Arc<ControllerInner>,
        generation: u64,
        session: BackendSession,
    ) {
        let user = session.user.clone();
        let tokens = SessionTokens {
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
        };

        // The user is known as soon as the session is; the tuple stays
        // loading until the profile settles.
        Self::publish(inner, generation, |state| {
            state.user = Some(user.clone());
            state.session = Some(tokens);
            state.loading = true;
        });

        match inner
            .resolver
            .resolve(&session.access_token, session.user.id)
            .await
        {
            Ok(profile) => {
                Self::publish(inner, generation, |state| {
                    state.profile = Some(profile);
                    state.error = None;
                    state.loading = false;
                });
            }
            Err(error) => {
                tracing::error!(user_id = %session.user.id, %error, "profile resolution failed");
                Self::publish(inner, generation, |state| {
                    state.profile = None;
                    state.error = Some(error.to_string());
                    state.loading = false;
                });
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::{Value, json};

    use branchline_core::{Email, UserId};

    use crate::backend::{Query, SignUpOutcome};

    // =========================================================================
    // Fakes
    // =========================================================================

    fn session_for(user_id: UserId, suffix: &str) -> BackendSession {
        BackendSession {
            access_token: format!("access-{suffix}"),
            refresh_token: format!("refresh-{suffix}"),
            expires_at: Utc::now() + chrono::Duration::hours(1),
            user: AuthUser {
                id: user_id,
                email: Email::parse(&format!("{suffix}@example-test.io")).unwrap(),
            },
        }
    }

    fn api_error(status: u16) -> BackendError {
        BackendError::Api {
            status,
            code: None,
            message: "fake backend failure".into(),
        }
    }

    #[derive(Default)]
    struct FakeAuth {
        sessions: Mutex<HashMap<String, BackendSession>>,
        hang_get_session: bool,
        fail_get_session: bool,
        fail_sign_out: bool,
    }

    impl FakeAuth {
        fn with_session(self, session: BackendSession) -> Self {
            self.sessions
                .lock()
                .unwrap()
                .insert(session.refresh_token.clone(), session);
            self
        }
    }

    #[async_trait]
    impl AuthApi for FakeAuth {
        async fn get_session(
            &self,
            refresh_token: &str,
        ) -> Result<Option<BackendSession>, BackendError> {
            if self.hang_get_session {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if self.fail_get_session {
                return Err(api_error(500));
            }
            Ok(self.sessions.lock().unwrap().get(refresh_token).cloned())
        }

        async fn sign_in(&self, _: &str, _: &str) -> Result<BackendSession, BackendError> {
            Err(api_error(500))
        }

        async fn sign_up(&self, _: &str, _: &str) -> Result<SignUpOutcome, BackendError> {
            Err(api_error(500))
        }

        async fn sign_out(&self, _: &str) -> Result<(), BackendError> {
            if self.fail_sign_out {
                return Err(api_error(500));
            }
            Ok(())
        }

        async fn health(&self) -> Result<(), BackendError> {
            Ok(())
        }
    }

    /// Profile-table fake with per-user fetch delays and a unique-key
    /// constraint on `id`.
    ///
    /// `select_one` captures its answer *before* sleeping, which is what
    /// lets tests hold a stale answer in flight while the world moves on.
    #[derive(Default)]
    struct FakeProfiles {
        rows: Mutex<Vec<Value>>,
        fetch_delays: Mutex<HashMap<String, Duration>>,
        fail_select: bool,
        insert_attempts: AtomicU32,
    }

    impl FakeProfiles {
        fn with_row(self, row: Value) -> Self {
            self.rows.lock().unwrap().push(row);
            self
        }

        fn set_delay(&self, user_id: UserId, delay: Duration) {
            self.fetch_delays
                .lock()
                .unwrap()
                .insert(user_id.to_string(), delay);
        }

        fn set_role(&self, user_id: UserId, role: &str, branch: Option<&str>) {
            let mut rows = self.rows.lock().unwrap();
            for row in rows.iter_mut() {
                if row["id"] == json!(user_id.to_string()) {
                    row["role"] = json!(role);
                    row["branch_id"] = branch.map_or(Value::Null, |b| json!(b));
                }
            }
        }

        fn row_count(&self) -> usize {
            self.rows.lock().unwrap().len()
        }

        fn delay_for(&self, query: &Query) -> Option<Duration> {
            let delays = self.fetch_delays.lock().unwrap();
            query.params().iter().find_map(|(column, param)| {
                if column == "id" {
                    param
                        .strip_prefix("eq.")
                        .and_then(|id| delays.get(id).copied())
                } else {
                    None
                }
            })
        }
    }

    #[async_trait]
    impl TableApi for FakeProfiles {
        async fn select(&self, _: &str, _: &str, query: Query) -> Result<Vec<Value>, BackendError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().filter(|r| query.matches(r)).cloned().collect())
        }

        async fn select_one(&self, _: &str, _: &str, query: Query) -> Result<Value, BackendError> {
            if self.fail_select {
                return Err(api_error(500));
            }

            // Capture before sleeping so a slow fetch returns what the
            // table looked like when the fetch started.
            let captured = {
                let rows = self.rows.lock().unwrap();
                rows.iter().find(|r| query.matches(r)).cloned()
            };

            if let Some(delay) = self.delay_for(&query) {
                tokio::time::sleep(delay).await;
            }

            captured.ok_or(BackendError::NotFound)
        }

        async fn insert(&self, _: &str, _: &str, row: Value) -> Result<Value, BackendError> {
            self.insert_attempts.fetch_add(1, Ordering::SeqCst);
            let mut rows = self.rows.lock().unwrap();
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
            _: &str,
            _: &str,
            _: Query,
            _: Value,
        ) -> Result<Value, BackendError> {
            Err(api_error(500))
        }

        async fn delete(&self, _: &str, _: &str, _: Query) -> Result<(), BackendError> {
            Err(api_error(500))
        }
    }

    fn controller(auth: FakeAuth, tables: FakeProfiles) -> (SessionController, Arc<FakeProfiles>) {
        let tables = Arc::new(tables);
        let controller = SessionController::new(
            Arc::new(auth),
            Arc::clone(&tables) as Arc<dyn TableApi>,
            ControllerSettings::default(),
        );
        (controller, tables)
    }

    fn profile_row(user_id: UserId, role: &str, branch: Option<&str>) -> Value {
        json!({
            "id": user_id.to_string(),
            "role": role,
            "branch_id": branch,
            "created_at": Utc::now(),
        })
    }

    // =========================================================================
    // Bootstrap
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn no_stored_token_settles_signed_out() {
        let (controller, _) = controller(FakeAuth::default(), FakeProfiles::default());
        controller.initialize(None);

        let state = controller.settled().await;
        assert!(state.user.is_none());
        assert!(state.profile.is_none());
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_refresh_token_settles_signed_out() {
        // No session registered for the token.
        let (controller, _) = controller(FakeAuth::default(), FakeProfiles::default());
        controller.initialize(Some("refresh-unknown".into()));

        let state = controller.settled().await;
        assert!(state.user.is_none());
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn session_fetch_failure_is_treated_as_signed_out() {
        let auth = FakeAuth {
            fail_get_session: true,
            ..FakeAuth::default()
        };
        let (controller, _) = controller(auth, FakeProfiles::default());
        controller.initialize(Some("refresh-any".into()));

        let state = controller.settled().await;
        assert!(state.user.is_none());
        assert!(state.profile.is_none());
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn bootstrap_resolves_existing_branch_manager_profile() {
        let user_id = UserId::generate();
        let session = session_for(user_id, "mgr");
        let auth = FakeAuth::default().with_session(session);
        let tables =
            FakeProfiles::default().with_row(profile_row(user_id, "branch_manager", Some("NYC01")));

        let (controller, _) = controller(auth, tables);
        controller.initialize(Some("refresh-mgr".into()));

        let state = controller.settled().await;
        assert!(state.user.is_some());
        assert!(state.is_branch_manager());
        assert!(!state.is_admin());
        assert_eq!(state.branch_id().unwrap().as_str(), "NYC01");
    }

    // =========================================================================
    // Default profile provisioning
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn fresh_user_gets_default_profile() {
        let user_id = UserId::generate();
        let (controller, tables) = controller(FakeAuth::default(), FakeProfiles::default());

        controller.handle_event(AuthEvent::SignedIn(session_for(user_id, "new")));

        let state = controller.settled().await;
        let profile = state.profile.unwrap();
        assert_eq!(profile.id, user_id);
        assert_eq!(profile.role, Role::BranchManager);
        assert!(profile.branch_id.is_none());
        assert_eq!(tables.row_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn configured_default_role_is_honored() {
        let user_id = UserId::generate();
        let tables = Arc::new(FakeProfiles::default());
        let controller = SessionController::new(
            Arc::new(FakeAuth::default()),
            Arc::clone(&tables) as Arc<dyn TableApi>,
            ControllerSettings {
                default_role: Role::Admin,
                ..ControllerSettings::default()
            },
        );

        controller.handle_event(AuthEvent::SignedIn(session_for(user_id, "first")));

        let state = controller.settled().await;
        assert!(state.is_admin());
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_resolution_creates_exactly_one_row() {
        let user_id = UserId::generate();
        let tables = Arc::new(FakeProfiles::default());
        // Both resolutions observe "no row" before either inserts.
        tables.set_delay(user_id, Duration::from_millis(100));

        let resolver = ProfileResolver::new(
            Arc::clone(&tables) as Arc<dyn TableApi>,
            Role::BranchManager,
            3,
        );

        let (a, b) = tokio::join!(
            resolver.resolve("token", user_id),
            resolver.resolve("token", user_id),
        );

        let a = a.unwrap();
        let b = b.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(tables.row_count(), 1, "conflict recovery must not duplicate");
        assert_eq!(tables.insert_attempts.load(Ordering::SeqCst), 2);
    }

    // =========================================================================
    // Generation discipline
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn rapid_sign_ins_settle_on_the_last_user() {
        let u1 = UserId::generate();
        let u2 = UserId::generate();
        let tables = FakeProfiles::default()
            .with_row(profile_row(u1, "admin", None))
            .with_row(profile_row(u2, "branch_manager", Some("SEA01")));
        // u1's profile fetch is slow and will land after u2 settles.
        tables.set_delay(u1, Duration::from_millis(500));
        tables.set_delay(u2, Duration::from_millis(10));

        let (controller, _) = controller(FakeAuth::default(), tables);
        controller.handle_event(AuthEvent::SignedIn(session_for(u1, "u1")));
        controller.handle_event(AuthEvent::SignedIn(session_for(u2, "u2")));

        let state = controller.settled().await;
        assert_eq!(state.profile.as_ref().unwrap().id, u2);

        // Let u1's stale fetch complete; it must be discarded.
        tokio::time::sleep(Duration::from_secs(1)).await;
        let state = controller.snapshot();
        assert_eq!(state.profile.as_ref().unwrap().id, u2);
        assert_eq!(state.user.as_ref().unwrap().id, u2);
    }

    #[tokio::test(start_paused = true)]
    async fn sign_out_supersedes_in_flight_resolution() {
        let user_id = UserId::generate();
        let tables = FakeProfiles::default().with_row(profile_row(user_id, "admin", None));
        tables.set_delay(user_id, Duration::from_millis(500));

        let (controller, _) = controller(FakeAuth::default(), tables);
        controller.handle_event(AuthEvent::SignedIn(session_for(user_id, "u")));
        tokio::task::yield_now().await;
        controller.handle_event(AuthEvent::SignedOut);

        let state = controller.settled().await;
        assert!(state.user.is_none());
        assert!(state.profile.is_none());
        assert!(!state.loading);

        // The stale resolution completing later must not resurrect state.
        tokio::time::sleep(Duration::from_secs(1)).await;
        let state = controller.snapshot();
        assert!(state.user.is_none());
        assert!(state.profile.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn force_reload_discards_superseded_resolution() {
        let user_id = UserId::generate();
        let session = session_for(user_id, "reload");
        let auth = FakeAuth::default().with_session(session.clone());
        let tables = FakeProfiles::default().with_row(profile_row(user_id, "admin", None));
        tables.set_delay(user_id, Duration::from_millis(500));

        let (controller, tables) = controller(auth, tables);
        controller.handle_event(AuthEvent::SignedIn(session));
        tokio::task::yield_now().await;

        // The world changes while generation 1's fetch holds the old row.
        tables.set_role(user_id, "branch_manager", Some("NYC01"));
        controller.force_reload();

        let state = controller.settled().await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        let state_after = controller.snapshot();

        for s in [&state, &state_after] {
            assert!(s.is_branch_manager(), "stale admin result must be discarded");
            assert_eq!(s.branch_id().unwrap().as_str(), "NYC01");
        }
    }

    // =========================================================================
    // Termination guarantees
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn loading_settles_within_timeout_when_backend_hangs() {
        let auth = FakeAuth {
            hang_get_session: true,
            ..FakeAuth::default()
        };
        let (controller, _) = controller(auth, FakeProfiles::default());
        controller.initialize(Some("refresh-hang".into()));

        let state = controller.settled().await;
        assert!(!state.loading, "watchdog must settle a hung resolution");
        // Nothing was learned, so nothing is fabricated.
        assert!(state.user.is_none());
        assert!(state.profile.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn genuine_backend_error_settles_with_user_and_no_profile() {
        let user_id = UserId::generate();
        let tables = FakeProfiles {
            fail_select: true,
            ..FakeProfiles::default()
        };

        let (controller, _) = controller(FakeAuth::default(), tables);
        controller.handle_event(AuthEvent::SignedIn(session_for(user_id, "err")));

        let state = controller.settled().await;
        assert_eq!(state.user.as_ref().unwrap().id, user_id);
        assert!(state.profile.is_none());
        assert!(state.error.is_some());
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_do_not_retry_unboundedly() {
        let user_id = UserId::generate();
        let tables = Arc::new(FakeProfiles {
            fail_select: true,
            ..FakeProfiles::default()
        });
        let resolver = ProfileResolver::new(
            Arc::clone(&tables) as Arc<dyn TableApi>,
            Role::BranchManager,
            3,
        );

        let result = resolver.resolve("token", user_id).await;
        let error = result.unwrap_err();
        assert_eq!(error.attempts, 3);
    }

    // =========================================================================
    // Logout
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn logout_clears_state_even_when_backend_fails() {
        let user_id = UserId::generate();
        let session = session_for(user_id, "out");
        let auth = FakeAuth {
            fail_sign_out: true,
            ..FakeAuth::default()
        }
        .with_session(session.clone());
        let tables = FakeProfiles::default().with_row(profile_row(user_id, "admin", None));

        let (controller, _) = controller(auth, tables);
        controller.handle_event(AuthEvent::SignedIn(session));
        controller.settled().await;

        let result = controller.logout().await;
        assert!(result.is_err(), "the failure is surfaced to the caller");

        let state = controller.snapshot();
        assert!(state.user.is_none());
        assert!(state.profile.is_none());
        assert!(!state.loading);
    }
}
