//! Setting values, definitions and the registry they are declared in

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::mem::discriminant;

use crate::auth::SUPER_ADMIN_ROLE;
use crate::prelude::*;

pub type SettingValidator = Box<dyn Fn(&SettingValue) -> ClResult<()> + Send + Sync>;

/// Where the value of a setting comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingScope {
	/// Compiled-in default, never stored
	System,
	/// Stored through the meta adapter, one value for the whole site
	Site,
}

/// Who may change a setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
	System,
	Admin,
	User,
}

impl PermissionLevel {
	pub fn check<S: AsRef<str>>(&self, roles: &[S]) -> bool {
		match self {
			PermissionLevel::System => false,
			PermissionLevel::Admin => roles.iter().any(|r| r.as_ref() == SUPER_ADMIN_ROLE),
			PermissionLevel::User => true,
		}
	}
}

/// A setting value as stored in the meta adapter
///
/// Untagged, so stored JSON maps back without a type marker. `Bool` is
/// listed before `Int` so `true` never decodes as a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
	Bool(bool),
	Int(i64),
	String(String),
	Json(serde_json::Value),
}

impl SettingValue {
	pub fn matches_type(&self, other: &SettingValue) -> bool {
		discriminant(self) == discriminant(other)
	}

	pub fn type_name(&self) -> &'static str {
		match self {
			SettingValue::Bool(_) => "bool",
			SettingValue::Int(_) => "int",
			SettingValue::String(_) => "string",
			SettingValue::Json(_) => "json",
		}
	}

	/// Convert a value posted from an HTML form to the type of `template`
	///
	/// Form fields always arrive as text, and an unchecked checkbox arrives
	/// as an empty string. Values that need no conversion pass through.
	pub fn coerce_to(self, template: &SettingValue) -> ClResult<SettingValue> {
		match (template, self) {
			(SettingValue::Int(_), SettingValue::String(text)) => match text.trim().parse() {
				Ok(n) => Ok(SettingValue::Int(n)),
				Err(_) => Err(Error::ValidationError(format!("'{}' is not an integer", text))),
			},
			(SettingValue::Bool(_), SettingValue::String(text)) => {
				let flag = text.trim().to_ascii_lowercase();
				if matches!(flag.as_str(), "1" | "true" | "on" | "yes") {
					Ok(SettingValue::Bool(true))
				} else if matches!(flag.as_str(), "" | "0" | "false" | "off" | "no") {
					Ok(SettingValue::Bool(false))
				} else {
					Err(Error::ValidationError(format!("'{}' is not a boolean", text)))
				}
			}
			(SettingValue::Bool(_), SettingValue::Int(n)) => Ok(SettingValue::Bool(n != 0)),
			(_, value) => Ok(value),
		}
	}
}

/// Declaration of a setting: key, default, scope, permission and validation
pub struct SettingDefinition {
	/// Dotted key, e.g. `group_limit.count`
	pub key: String,
	pub description: String,
	/// A definition without a default must be stored before startup completes
	pub default: Option<SettingValue>,
	pub scope: SettingScope,
	pub permission: PermissionLevel,
	pub validator: Option<SettingValidator>,
}

impl fmt::Debug for SettingDefinition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SettingDefinition")
			.field("key", &self.key)
			.field("default", &self.default)
			.field("scope", &self.scope)
			.field("permission", &self.permission)
			.field("has_validator", &self.validator.is_some())
			.finish_non_exhaustive()
	}
}

impl SettingDefinition {
	pub fn builder(key: impl Into<String>) -> SettingDefinitionBuilder {
		SettingDefinitionBuilder::new(key)
	}

	/// Check `value` against the type of the default, then the custom validator
	pub fn validate(&self, value: &SettingValue) -> ClResult<()> {
		match &self.default {
			Some(default) if !value.matches_type(default) => Err(Error::ValidationError(format!(
				"Setting '{}' expects {}, got {}",
				self.key,
				default.type_name(),
				value.type_name()
			))),
			_ => self.validator.as_ref().map_or(Ok(()), |validator| validator(value)),
		}
	}
}

pub struct SettingDefinitionBuilder {
	def: SettingDefinition,
}

impl SettingDefinitionBuilder {
	/// Starts out as an admin-editable site setting with no description
	pub fn new(key: impl Into<String>) -> Self {
		Self {
			def: SettingDefinition {
				key: key.into(),
				description: String::new(),
				default: None,
				scope: SettingScope::Site,
				permission: PermissionLevel::Admin,
				validator: None,
			},
		}
	}

	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.def.description = description.into();
		self
	}

	pub fn default(mut self, value: SettingValue) -> Self {
		self.def.default = Some(value);
		self
	}

	pub fn scope(mut self, scope: SettingScope) -> Self {
		self.def.scope = scope;
		self
	}

	pub fn permission(mut self, permission: PermissionLevel) -> Self {
		self.def.permission = permission;
		self
	}

	pub fn validator<F>(mut self, f: F) -> Self
	where
		F: Fn(&SettingValue) -> ClResult<()> + Send + Sync + 'static,
	{
		self.def.validator = Some(Box::new(f));
		self
	}

	pub fn build(self) -> ClResult<SettingDefinition> {
		let def = self.def;
		if def.description.is_empty() {
			return Err(Error::ConfigError(format!("Setting '{}' has no description", def.key)));
		}
		if def.scope == SettingScope::System {
			if def.permission != PermissionLevel::System {
				return Err(Error::ConfigError(format!(
					"Setting '{}' is fixed and cannot be editable",
					def.key
				)));
			}
			if def.default.is_none() {
				return Err(Error::ConfigError(format!("Fixed setting '{}' needs a default", def.key)));
			}
		}
		Ok(def)
	}
}

/// A value as returned after a successful update
#[derive(Debug, Clone)]
pub struct Setting {
	pub key: String,
	pub value: SettingValue,
	pub updated_at: Timestamp,
}

/// Collects definitions while the application is being assembled
#[derive(Default)]
pub struct SettingsRegistry {
	definitions: BTreeMap<String, SettingDefinition>,
}

impl SettingsRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, def: SettingDefinition) -> ClResult<()> {
		if self.definitions.contains_key(&def.key) {
			return Err(Error::ConfigError(format!("Setting '{}' registered twice", def.key)));
		}
		tracing::debug!(key = %def.key, scope = ?def.scope, "Registering setting");
		self.definitions.insert(def.key.clone(), def);
		Ok(())
	}

	pub fn freeze(self) -> FrozenSettingsRegistry {
		tracing::info!("Settings registry frozen with {} definitions", self.definitions.len());
		FrozenSettingsRegistry { definitions: self.definitions }
	}

	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}
}

/// Read-only registry shared through the app state
pub struct FrozenSettingsRegistry {
	definitions: BTreeMap<String, SettingDefinition>,
}

impl FrozenSettingsRegistry {
	pub fn get(&self, key: &str) -> Option<&SettingDefinition> {
		self.definitions.get(key)
	}

	/// All definitions in key order
	pub fn list(&self) -> impl Iterator<Item = &SettingDefinition> {
		self.definitions.values()
	}

	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn count_setting(key: &str) -> ClResult<SettingDefinition> {
		SettingDefinition::builder(key)
			.description("A member count")
			.default(SettingValue::Int(20))
			.validator(|v| match v {
				SettingValue::Int(i) if *i >= 0 => Ok(()),
				_ => Err(Error::ValidationError("must be non-negative".into())),
			})
			.build()
	}

	#[test]
	fn test_builder_requires_description() {
		let res = SettingDefinition::builder("x.y").default(SettingValue::Int(1)).build();
		assert!(matches!(res, Err(Error::ConfigError(_))));
	}

	#[test]
	fn test_fixed_setting_must_not_be_editable() {
		let res = SettingDefinition::builder("x.y")
			.description("d")
			.default(SettingValue::Bool(true))
			.scope(SettingScope::System)
			.permission(PermissionLevel::Admin)
			.build();
		assert!(matches!(res, Err(Error::ConfigError(_))));

		let res = SettingDefinition::builder("x.y")
			.description("d")
			.scope(SettingScope::System)
			.permission(PermissionLevel::System)
			.build();
		assert!(matches!(res, Err(Error::ConfigError(_))));
	}

	#[test]
	fn test_duplicate_registration_fails() {
		let mut registry = SettingsRegistry::new();
		assert!(count_setting("a.b").and_then(|d| registry.register(d)).is_ok());
		assert!(count_setting("a.b").and_then(|d| registry.register(d)).is_err());
		assert_eq!(registry.len(), 1);
	}

	#[test]
	fn test_frozen_list_is_ordered_by_key() {
		let mut registry = SettingsRegistry::new();
		for key in ["b.second", "a.first", "c.third"] {
			assert!(count_setting(key).and_then(|d| registry.register(d)).is_ok());
		}
		let frozen = registry.freeze();
		let keys: Vec<_> = frozen.list().map(|d| d.key.as_str()).collect();
		assert_eq!(keys, ["a.first", "b.second", "c.third"]);
	}

	#[test]
	fn test_validate_type_and_validator() {
		let Ok(def) = count_setting("a.b") else { unreachable!() };
		assert!(def.validate(&SettingValue::Int(5)).is_ok());
		assert!(def.validate(&SettingValue::Int(-1)).is_err());
		assert!(def.validate(&SettingValue::String("5".into())).is_err());
	}

	#[test]
	fn test_untagged_json_decoding() {
		let value: Option<SettingValue> = serde_json::from_str("2").ok();
		assert_eq!(value, Some(SettingValue::Int(2)));
		let value: Option<SettingValue> = serde_json::from_str("true").ok();
		assert_eq!(value, Some(SettingValue::Bool(true)));
	}

	#[test]
	fn test_coerce_form_values() {
		let int = SettingValue::Int(0);
		let boolean = SettingValue::Bool(false);
		assert_eq!(SettingValue::String(" 25 ".into()).coerce_to(&int).ok(), Some(SettingValue::Int(25)));
		assert!(SettingValue::String("many".into()).coerce_to(&int).is_err());
		assert_eq!(SettingValue::String("on".into()).coerce_to(&boolean).ok(), Some(SettingValue::Bool(true)));
		assert_eq!(SettingValue::String("".into()).coerce_to(&boolean).ok(), Some(SettingValue::Bool(false)));
		assert!(SettingValue::String("maybe".into()).coerce_to(&boolean).is_err());
		assert_eq!(SettingValue::Int(0).coerce_to(&boolean).ok(), Some(SettingValue::Bool(false)));
		assert_eq!(
			SettingValue::String("hi".into()).coerce_to(&SettingValue::String(String::new())).ok(),
			Some(SettingValue::String("hi".into()))
		);
	}

	#[test]
	fn test_admin_permission_needs_super_admin_role() {
		assert!(PermissionLevel::Admin.check(&["SADM"]));
		assert!(!PermissionLevel::Admin.check(&["user"]));
		assert!(PermissionLevel::User.check::<&str>(&[]));
		assert!(!PermissionLevel::System.check(&["SADM"]));
	}
}

// vim: ts=4
