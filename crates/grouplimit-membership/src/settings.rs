//! Site-wide member limit settings

use crate::prelude::*;
use grouplimit_core::settings::{
	PermissionLevel, SettingDefinition, SettingScope, SettingValue, SettingsRegistry,
};

pub const LIMIT_COUNT: &str = "group_limit.count";
pub const LIMIT_MESSAGE: &str = "group_limit.message";
pub const ALLOW_OVERRIDE: &str = "group_limit.allow_override";

pub const DEFAULT_LIMIT: u32 = 20;
pub const DEFAULT_MESSAGE: &str =
	"This group has limited membership. Please contact admin to join this group.";

/// Register the member limit settings
pub fn register_settings(registry: &mut SettingsRegistry) -> ClResult<()> {
	// How many users can join a group
	registry.register(
		SettingDefinition::builder(LIMIT_COUNT)
			.description("How many users can join a group")
			.default(SettingValue::Int(i64::from(DEFAULT_LIMIT)))
			.scope(SettingScope::Site)
			.permission(PermissionLevel::Admin)
			.validator(|v| match v {
				SettingValue::Int(n) if u32::try_from(*n).is_ok() => Ok(()),
				SettingValue::Int(_) => {
					Err(Error::ValidationError("Member limit must be a non-negative number".into()))
				}
				_ => Err(Error::ValidationError("Member limit must be a number".into())),
			})
			.build()?,
	)?;

	// Message shown when a group reached its limit
	registry.register(
		SettingDefinition::builder(LIMIT_MESSAGE)
			.description("Message shown when a group has reached its member limit")
			.default(SettingValue::String(DEFAULT_MESSAGE.into()))
			.scope(SettingScope::Site)
			.permission(PermissionLevel::Admin)
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(ALLOW_OVERRIDE)
			.description("Allow group admins to override the member limit of their group")
			.default(SettingValue::Bool(true))
			.scope(SettingScope::Site)
			.permission(PermissionLevel::Admin)
			.build()?,
	)?;

	Ok(())
}


// vim: ts=4
