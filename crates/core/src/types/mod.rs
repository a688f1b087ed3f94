//! Core types for Branchline.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod branch_code;
pub mod email;
pub mod id;
pub mod money;
pub mod role;

pub use branch_code::{BranchCode, BranchCodeError};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::Money;
pub use role::{Role, RoleParseError};
