//! Backend reachability check.

use branchline_dashboard::backend::AuthApi;

use super::ServiceConnection;

/// Probe the hosted backend's auth endpoint.
///
/// # Errors
///
/// Returns an error when the environment is incomplete or the backend
/// is unreachable.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let connection = ServiceConnection::from_env()?;

    connection.client.health().await?;
    tracing::info!("backend is reachable and healthy");

    Ok(())
}
