//! Application roles.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error parsing a [`Role`] from a string.
#[derive(thiserror::Error, Debug, Clone)]
#[error("unknown role '{0}' (expected 'admin' or 'branch_manager')")]
pub struct RoleParseError(String);

/// The role stored on a user profile.
///
/// Roles gate navigation and query scoping in the dashboard. They are a
/// UX convenience only - the hosted backend's row-level security is the
/// actual enforcement boundary.
///
/// The default is deliberately the least-privileged role; admins are
/// provisioned explicitly (see `bl-cli profile set-role`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access to every branch and to branch management.
    Admin,
    /// Access scoped to a single branch.
    #[default]
    BranchManager,
}

impl Role {
    /// The wire/database representation of this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::BranchManager => "branch_manager",
        }
    }

    /// Whether this role grants unrestricted access.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "branch_manager" => Ok(Self::BranchManager),
            other => Err(RoleParseError(other.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_form() {
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::BranchManager.as_str(), "branch_manager");
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&Role::BranchManager).unwrap();
        assert_eq!(json, "\"branch_manager\"");

        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_parse() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_default_is_least_privileged() {
        assert_eq!(Role::default(), Role::BranchManager);
        assert!(!Role::default().is_admin());
    }
}
