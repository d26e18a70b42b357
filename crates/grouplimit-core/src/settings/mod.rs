//! Settings subsystem with scope/permission separation and caching
//!
//! # Architecture
//!
//! - **Types** (`types.rs`): Core type definitions and registry
//! - **Service** (`service.rs`): SettingsService with caching and validation
//! - **Handler** (`handler.rs`): HTTP API endpoints
//!
//! Settings have two independent dimensions:
//! - **Scope**: System (read-only default) or Site (stored, one value per site)
//! - **Permission**: Who can modify it (System/Admin/User)

pub mod handler;
pub mod service;
pub mod types;

pub use types::{
	FrozenSettingsRegistry, PermissionLevel, Setting, SettingDefinition, SettingDefinitionBuilder,
	SettingScope, SettingValue, SettingsRegistry,
};

// vim: ts=4
