//! Per-group limit preferences and the site-wide policy values
//!
//! Site-wide values live in the settings service, per-group values in group
//! metadata. An absent per-group limit is `None`, which is not the same as a
//! limit of zero.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::prelude::*;
use crate::settings::{ALLOW_OVERRIDE, DEFAULT_LIMIT, DEFAULT_MESSAGE, LIMIT_COUNT, LIMIT_MESSAGE};
use grouplimit_core::settings::service::SettingsService;
use grouplimit_types::meta_adapter::MetaAdapter;

/// Group metadata key of the disable flag
pub const META_DISABLE: &str = "group_limit.disable";
/// Group metadata key of the per-group limit
pub const META_LIMIT: &str = "group_limit.count";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPreference {
	#[serde(rename = "disableLimit", default)]
	pub disable_limit: bool,
	#[serde(rename = "limitOverride", default)]
	pub limit_override: Option<u32>,
}

/// Preference form as submitted by the group admin screen
///
/// A checkbox is absent when unchecked, and a blank count clears the override.
#[derive(Debug, Default, Deserialize)]
pub struct PreferenceForm {
	#[serde(rename = "disableLimit")]
	pub disable_limit: Option<String>,
	#[serde(rename = "limitMembershipCount")]
	pub limit_membership_count: Option<String>,
}

impl PreferenceForm {
	pub fn into_preference(self) -> ClResult<GroupPreference> {
		Ok(GroupPreference {
			disable_limit: parse_checkbox(self.disable_limit.as_deref()),
			limit_override: parse_limit(self.limit_membership_count.as_deref())?,
		})
	}
}

/// Checkbox values: anything but empty, "0", "false" and "off" counts as checked
pub fn parse_checkbox(value: Option<&str>) -> bool {
	value.is_some_and(|v| !matches!(v.trim(), "" | "0" | "false" | "off"))
}

/// Parse a limit field. Blank means no override.
pub fn parse_limit(value: Option<&str>) -> ClResult<Option<u32>> {
	match value.map(str::trim) {
		None | Some("") => Ok(None),
		Some(s) => s.parse::<u32>().map(Some).map_err(|_| {
			Error::ValidationError(format!("'{}' is not a valid member limit", s))
		}),
	}
}

fn meta_to_bool(value: &serde_json::Value) -> bool {
	match value {
		serde_json::Value::Bool(b) => *b,
		serde_json::Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
		serde_json::Value::String(s) => parse_checkbox(Some(s)),
		_ => false,
	}
}

fn meta_to_limit(group_id: GroupId, value: &serde_json::Value) -> Option<u32> {
	let limit = match value {
		serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
		serde_json::Value::String(s) => s.trim().parse::<u32>().ok(),
		serde_json::Value::Null => return None,
		_ => None,
	};
	if limit.is_none() {
		warn!(group_id = %group_id, "Ignoring invalid stored member limit: {}", value);
	}
	limit
}

/// Access to the site-wide and per-group limit values
#[derive(Clone)]
pub struct PreferenceStore {
	settings: Arc<SettingsService>,
	meta: Arc<dyn MetaAdapter>,
}

impl PreferenceStore {
	pub fn new(settings: Arc<SettingsService>, meta: Arc<dyn MetaAdapter>) -> Self {
		Self { settings, meta }
	}

	pub async fn get_default_limit(&self) -> ClResult<u32> {
		let limit = self.settings.get_int(LIMIT_COUNT).await?;
		Ok(u32::try_from(limit).unwrap_or_else(|_| {
			warn!("Configured member limit {} is out of range, using {}", limit, DEFAULT_LIMIT);
			DEFAULT_LIMIT
		}))
	}

	/// Denial message; an empty configured message falls back to the built-in text
	pub async fn get_message(&self) -> String {
		match self.settings.get_string(LIMIT_MESSAGE).await {
			Ok(msg) if !msg.trim().is_empty() => msg,
			Ok(_) => DEFAULT_MESSAGE.to_string(),
			Err(err) => {
				warn!("Cannot read member limit message: {}", err);
				DEFAULT_MESSAGE.to_string()
			}
		}
	}

	pub async fn get_allow_override(&self) -> ClResult<bool> {
		self.settings.get_bool(ALLOW_OVERRIDE).await
	}

	pub async fn get_group_disable_flag(&self, group_id: GroupId) -> ClResult<bool> {
		let value = self.meta.read_group_meta(group_id, META_DISABLE).await?;
		Ok(value.as_ref().is_some_and(meta_to_bool))
	}

	pub async fn get_group_limit_override(&self, group_id: GroupId) -> ClResult<Option<u32>> {
		let value = self.meta.read_group_meta(group_id, META_LIMIT).await?;
		Ok(value.as_ref().and_then(|v| meta_to_limit(group_id, v)))
	}

	pub async fn set_group_disable_flag(&self, group_id: GroupId, disable: bool) -> ClResult<()> {
		self.meta
			.update_group_meta(group_id, META_DISABLE, Some(serde_json::Value::Bool(disable)))
			.await
	}

	pub async fn set_group_limit_override(
		&self,
		group_id: GroupId,
		limit: Option<u32>,
	) -> ClResult<()> {
		self.meta.update_group_meta(group_id, META_LIMIT, limit.map(serde_json::Value::from)).await
	}

	pub async fn read_preference(&self, group_id: GroupId) -> ClResult<GroupPreference> {
		Ok(GroupPreference {
			disable_limit: self.get_group_disable_flag(group_id).await?,
			limit_override: self.get_group_limit_override(group_id).await?,
		})
	}

	pub async fn save_preference(&self, group_id: GroupId, pref: &GroupPreference) -> ClResult<()> {
		self.set_group_disable_flag(group_id, pref.disable_limit).await?;
		self.set_group_limit_override(group_id, pref.limit_override).await?;
		info!(
			group_id = %group_id,
			disable = pref.disable_limit,
			limit = ?pref.limit_override,
			"Group limit preference saved"
		);
		Ok(())
	}
}

impl std::fmt::Debug for PreferenceStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PreferenceStore").field("meta", &self.meta).finish_non_exhaustive()
	}
}


// vim: ts=4
