//! User profile provisioning.

use branchline_core::{BranchCode, Role, UserId};
use branchline_dashboard::backend::BackendError;
use branchline_dashboard::data::ProfileRepository;
use branchline_dashboard::models::Profile;

use super::{CliError, ServiceConnection};

/// Set a user's role and branch assignment.
///
/// This is the sanctioned way to mint the first admin: new sign-ins get
/// the least-privileged default role, so somebody with the service key
/// has to promote them explicitly.
///
/// Creates the profile row when the user has never signed in.
///
/// # Errors
///
/// Returns an error when the arguments don't parse or the backend call
/// fails.
pub async fn set_role(
    user: &str,
    role: &str,
    branch: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let user_id = user
        .parse::<UserId>()
        .map_err(|e| CliError::Invalid("user id", e.to_string()))?;
    let role = role
        .parse::<Role>()
        .map_err(|e| CliError::Invalid("role", e.to_string()))?;
    let branch = branch
        .map(BranchCode::parse)
        .transpose()
        .map_err(|e| CliError::Invalid("branch code", e.to_string()))?;

    if role == Role::Admin && branch.is_some() {
        tracing::warn!("admins are not branch-scoped; the branch assignment is stored but unused");
    }

    let connection = ServiceConnection::from_env()?;
    let repo = ProfileRepository::new(&connection.client, connection.token());

    let profile = match repo.set_role(user_id, role, branch.as_ref()).await {
        Ok(profile) => profile,
        Err(BackendError::NotFound) => {
            // The user has never signed in; provision the row directly.
            let mut fresh = Profile::new_default(user_id, role);
            fresh.branch_id = branch;
            repo.create(&fresh).await?
        }
        Err(other) => return Err(other.into()),
    };

    tracing::info!(
        user = %profile.id,
        role = %profile.role,
        branch = profile.branch_id.as_ref().map_or("-", BranchCode::as_str),
        "profile updated"
    );

    Ok(())
}
