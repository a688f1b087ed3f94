//! Session service errors.

use thiserror::Error;

use crate::backend::BackendError;

/// Terminal failure of a profile resolution.
///
/// Produced only after retries are exhausted (or for non-transient
/// faults); the controller surfaces it and settles the published state.
/// "No profile row" and "concurrent creation" are not errors - the
/// resolver recovers from both.
#[derive(Debug, Error)]
#[error("profile resolution failed after {attempts} attempt(s): {source}")]
pub struct ResolveError {
    /// How many attempts were made before giving up.
    pub attempts: u32,
    /// The final backend failure.
    #[source]
    pub source: BackendError,
}
