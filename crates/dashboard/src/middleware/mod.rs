//! Request middleware: sessions, authentication guard, rate limiting.

pub mod auth;
pub mod rate_limit;
pub mod session;

pub use auth::{BranchScope, CurrentUser, RequireAdmin, RequireAuth};
pub use rate_limit::auth_rate_limiter;
pub use session::create_session_layer;
