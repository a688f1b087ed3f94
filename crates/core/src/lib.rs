//! Branchline Core - Shared types library.
//!
//! This crate provides common types used across all Branchline components:
//! - `dashboard` - Server-rendered management dashboard
//! - `cli` - Command-line tools for provisioning and seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! knowledge of the hosted backend. This keeps it lightweight and allows
//! it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, roles,
//!   branch codes, and currency amounts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
