//! Core settings registration

use crate::prelude::*;
use crate::settings::{
	PermissionLevel, SettingDefinition, SettingScope, SettingValue, SettingsRegistry,
};

/// Register all core settings
pub fn register_settings(registry: &mut SettingsRegistry) -> ClResult<()> {
	// Site name shown in page titles
	registry.register(
		SettingDefinition::builder("core.site_name")
			.description("Site name shown in page titles")
			.default(SettingValue::String("Groups".into()))
			.scope(SettingScope::Site)
			.permission(PermissionLevel::Admin)
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("core.version")
			.description("Server version")
			.default(SettingValue::String(crate::app::VERSION.into()))
			.scope(SettingScope::System)
			.permission(PermissionLevel::System)
			.build()?,
	)?;

	Ok(())
}

// vim: ts=4
