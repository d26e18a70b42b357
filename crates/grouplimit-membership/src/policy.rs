//! Admission policy: may a new member enter a group?
//!
//! Precedence of the applicable limit:
//! 1. super admins are always admitted
//! 2. when overrides are allowed, a group may disable its limit or set its own
//! 3. otherwise the site-wide default applies
//!
//! A group is admitting while its member count is below the limit.

use serde::Serialize;
use std::sync::Arc;

use crate::prefs::{GroupPreference, PreferenceStore};
use crate::prelude::*;
use grouplimit_types::group_adapter::GroupAdapter;

/// Site-wide policy values read on every check
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalPolicyConfig {
	pub default_limit: u32,
	pub message: String,
	pub allow_override: bool,
}

/// Limit applicable to a group
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "limit", rename_all = "camelCase")]
pub enum EffectiveLimit {
	Unbounded,
	Capped(u32),
}

impl EffectiveLimit {
	pub fn admits(&self, member_count: u32) -> bool {
		match self {
			EffectiveLimit::Unbounded => true,
			EffectiveLimit::Capped(limit) => *limit > member_count,
		}
	}

	pub fn cap(&self) -> Option<u32> {
		match self {
			EffectiveLimit::Unbounded => None,
			EffectiveLimit::Capped(limit) => Some(*limit),
		}
	}
}

impl std::fmt::Display for EffectiveLimit {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			EffectiveLimit::Unbounded => f.write_str("unlimited"),
			EffectiveLimit::Capped(limit) => write!(f, "{}", limit),
		}
	}
}

/// Resolve the limit of a group from the site config and the group preference
pub fn resolve_limit(config: &GlobalPolicyConfig, pref: &GroupPreference) -> EffectiveLimit {
	if config.allow_override {
		if pref.disable_limit {
			return EffectiveLimit::Unbounded;
		}
		if let Some(limit) = pref.limit_override {
			return EffectiveLimit::Capped(limit);
		}
	}
	EffectiveLimit::Capped(config.default_limit)
}

/// Outcome of an admission check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
	/// Admitted. `cap` is the limit the group store must enforce on insert.
	Granted { cap: Option<u32> },
	Denied,
}

impl Admission {
	pub fn is_granted(&self) -> bool {
		matches!(self, Admission::Granted { .. })
	}
}

#[derive(Debug)]
pub struct AdmissionPolicy {
	prefs: PreferenceStore,
	groups: Arc<dyn GroupAdapter>,
}

impl AdmissionPolicy {
	pub fn new(prefs: PreferenceStore, groups: Arc<dyn GroupAdapter>) -> Self {
		Self { prefs, groups }
	}

	pub fn prefs(&self) -> &PreferenceStore {
		&self.prefs
	}

	pub async fn config(&self) -> ClResult<GlobalPolicyConfig> {
		Ok(GlobalPolicyConfig {
			default_limit: self.prefs.get_default_limit().await?,
			message: self.prefs.get_message().await,
			allow_override: self.prefs.get_allow_override().await?,
		})
	}

	pub async fn effective_limit(&self, group_id: GroupId) -> ClResult<EffectiveLimit> {
		let allow_override = self.prefs.get_allow_override().await?;
		let pref = if allow_override {
			self.prefs.read_preference(group_id).await?
		} else {
			GroupPreference::default()
		};
		let default_limit = self.prefs.get_default_limit().await?;
		let config = GlobalPolicyConfig { default_limit, message: String::new(), allow_override };
		Ok(resolve_limit(&config, &pref))
	}

	/// Full admission check, including the cap to hand down to the group store
	pub async fn admission(
		&self,
		group_id: GroupId,
		is_super_admin: bool,
	) -> ClResult<Admission> {
		if is_super_admin {
			return Ok(Admission::Granted { cap: None });
		}

		let group = match self.groups.read_group(group_id).await {
			Ok(group) => group,
			Err(Error::NotFound) => {
				warn!(group_id = %group_id, "Admission check for unknown group, denying");
				return Ok(Admission::Denied);
			}
			Err(err) => return Err(err),
		};

		let limit = self.effective_limit(group_id).await?;
		if limit.admits(group.total_member_count) {
			Ok(Admission::Granted { cap: limit.cap() })
		} else {
			debug!(
				group_id = %group_id,
				members = group.total_member_count,
				limit = %limit,
				"Group is full"
			);
			Ok(Admission::Denied)
		}
	}

	pub async fn can_admit(&self, group_id: GroupId, is_super_admin: bool) -> ClResult<bool> {
		Ok(self.admission(group_id, is_super_admin).await?.is_granted())
	}

	pub async fn message(&self) -> String {
		self.prefs.get_message().await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config(default_limit: u32, allow_override: bool) -> GlobalPolicyConfig {
		GlobalPolicyConfig { default_limit, message: String::new(), allow_override }
	}

	#[test]
	fn test_default_applies_without_preference() {
		let limit = resolve_limit(&config(20, true), &GroupPreference::default());
		assert_eq!(limit, EffectiveLimit::Capped(20));
	}

	#[test]
	fn test_group_override_wins_when_allowed() {
		let pref = GroupPreference { disable_limit: false, limit_override: Some(25) };
		assert_eq!(resolve_limit(&config(20, true), &pref), EffectiveLimit::Capped(25));
		assert_eq!(resolve_limit(&config(20, false), &pref), EffectiveLimit::Capped(20));
	}

	#[test]
	fn test_zero_override_is_a_real_limit() {
		let pref = GroupPreference { disable_limit: false, limit_override: Some(0) };
		let limit = resolve_limit(&config(20, true), &pref);
		assert_eq!(limit, EffectiveLimit::Capped(0));
		assert!(!limit.admits(0));
	}

	#[test]
	fn test_disable_flag() {
		let pref = GroupPreference { disable_limit: true, limit_override: Some(5) };
		assert_eq!(resolve_limit(&config(20, true), &pref), EffectiveLimit::Unbounded);
		assert_eq!(resolve_limit(&config(20, false), &pref), EffectiveLimit::Capped(20));
	}

	#[test]
	fn test_admits_is_strictly_below_limit() {
		let limit = EffectiveLimit::Capped(20);
		assert!(limit.admits(19));
		assert!(!limit.admits(20));
		assert!(!limit.admits(21));
		assert!(EffectiveLimit::Unbounded.admits(u32::MAX));
	}

	#[test]
	fn test_limit_serialization() {
		let json = serde_json::to_value(EffectiveLimit::Capped(3)).unwrap_or_default();
		assert_eq!(json, serde_json::json!({ "type": "capped", "limit": 3 }));
		let json = serde_json::to_value(EffectiveLimit::Unbounded).unwrap_or_default();
		assert_eq!(json, serde_json::json!({ "type": "unbounded" }));
	}
}

// vim: ts=4
