//! Group membership service with a member limit.
//!
//! # Features
//!
//! - Site-wide member limit per group, with a configurable denial message
//! - Per-group overrides: a raised or lowered limit, or no limit at all
//! - Guarded entry points
//!     - direct join
//!     - AJAX join/leave toggle and action dispatch
//!     - membership requests for private groups
//!     - invite acceptance
//! - Super-admins are never limited

// Re-export shared types and adapter traits from grouplimit-types
pub use grouplimit_types::error;
pub use grouplimit_types::group_adapter;
pub use grouplimit_types::meta_adapter;
pub use grouplimit_types::types;

// Feature crate re-exports
pub use grouplimit_core::settings;
pub use grouplimit_membership as membership;

// Local modules
pub mod app;
pub mod prelude;
pub mod routes;
pub mod webserver;

pub use crate::app::{App, AppBuilder};

// vim: ts=4
