//! Application profile record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use branchline_core::{BranchCode, Role, UserId};

/// The application-level record keyed by the auth user's identifier.
///
/// Exactly zero or one profile exists per user. Created lazily on first
/// successful session resolution when absent; mutated only by
/// administrative tooling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    /// Same value as the auth user's identifier.
    pub id: UserId,
    /// Role gating navigation and query scoping.
    pub role: Role,
    /// Branch a branch manager is pinned to; `None` for admins and for
    /// managers not yet assigned a branch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<BranchCode>,
    /// Row creation timestamp.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// The default profile inserted when a signed-in user has none.
    #[must_use]
    pub fn new_default(id: UserId, role: Role) -> Self {
        Self {
            id,
            role,
            branch_id: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_without_branch_or_timestamp() {
        // Rows written before the created_at column existed still parse.
        let raw = format!(r#"{{"id":"{}","role":"admin"}}"#, uuid::Uuid::new_v4());
        let profile: Profile = serde_json::from_str(&raw).unwrap();
        assert_eq!(profile.role, Role::Admin);
        assert!(profile.branch_id.is_none());
    }

    #[test]
    fn test_branch_manager_roundtrip() {
        let profile = Profile {
            id: UserId::generate(),
            role: Role::BranchManager,
            branch_id: Some(BranchCode::parse("NYC01").unwrap()),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&profile).unwrap();
        let back: Profile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
    }
}
