//! Shared types, adapter traits, and core utilities for the group member limit service.
//!
//! This crate contains the foundational types that are shared between the
//! feature crates and all adapter implementations. Keeping them separate lets
//! adapter crates compile without pulling in the web layer.

pub mod error;
pub mod group_adapter;
pub mod meta_adapter;
pub mod prelude;
pub mod types;

// vim: ts=4
