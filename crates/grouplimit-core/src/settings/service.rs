//! Resolution of setting values (cache, stored value, default) and updates

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use grouplimit_types::error::{ClResult, Error};
use grouplimit_types::meta_adapter::MetaAdapter;
use grouplimit_types::types::Timestamp;

use super::types::{FrozenSettingsRegistry, Setting, SettingDefinition, SettingScope, SettingValue};

const DEFAULT_CACHE_SIZE: NonZeroUsize = match NonZeroUsize::new(100) {
	Some(size) => size,
	None => NonZeroUsize::MIN,
};

/// Resolved values keyed by setting name
///
/// `LruCache::get` touches recency, so every access takes the lock exclusively.
struct SettingsCache(Mutex<LruCache<String, SettingValue>>);

impl SettingsCache {
	fn new(capacity: usize) -> Self {
		let capacity = NonZeroUsize::new(capacity).unwrap_or(DEFAULT_CACHE_SIZE);
		Self(Mutex::new(LruCache::new(capacity)))
	}

	fn get(&self, key: &str) -> Option<SettingValue> {
		self.0.lock().get(key).cloned()
	}

	fn put(&self, key: &str, value: &SettingValue) {
		self.0.lock().put(key.to_string(), value.clone());
	}

	fn invalidate(&self, key: &str) {
		self.0.lock().pop(key);
	}
}

pub struct SettingsService {
	registry: Arc<FrozenSettingsRegistry>,
	cache: SettingsCache,
	meta: Arc<dyn MetaAdapter>,
}

impl SettingsService {
	pub fn new(
		registry: Arc<FrozenSettingsRegistry>,
		meta: Arc<dyn MetaAdapter>,
		cache_size: usize,
	) -> Self {
		Self { registry, cache: SettingsCache::new(cache_size), meta }
	}

	pub fn registry(&self) -> &Arc<FrozenSettingsRegistry> {
		&self.registry
	}

	fn definition(&self, key: &str) -> ClResult<&SettingDefinition> {
		self.registry
			.get(key)
			.ok_or_else(|| Error::ValidationError(format!("Unknown setting: {}", key)))
	}

	/// Stored value of a site setting, if one exists and has the right type
	async fn stored(&self, def: &SettingDefinition) -> ClResult<Option<SettingValue>> {
		if def.scope != SettingScope::Site {
			return Ok(None);
		}
		let Some(json) = self.meta.read_setting(&def.key).await? else {
			return Ok(None);
		};
		let value = serde_json::from_value::<SettingValue>(json)
			.map_err(|e| Error::ValidationError(format!("Invalid stored setting: {}", e)))?;

		match &def.default {
			Some(default) if !value.matches_type(default) => {
				warn!(
					"Stored value for '{}' is {}, expected {}; using the default",
					def.key,
					value.type_name(),
					default.type_name()
				);
				Ok(None)
			}
			_ => Ok(Some(value)),
		}
	}

	/// Current value of a setting: cached, then stored, then the default
	pub async fn get(&self, key: &str) -> ClResult<SettingValue> {
		if let Some(value) = self.cache.get(key) {
			debug!("Setting cache hit: {}", key);
			return Ok(value);
		}

		let def = self.definition(key)?;
		let value = match self.stored(def).await? {
			Some(value) => value,
			None => def.default.clone().ok_or_else(|| {
				Error::ValidationError(format!("Setting '{}' is not configured", key))
			})?,
		};
		self.cache.put(key, &value);
		Ok(value)
	}

	/// Store a new value after permission, coercion and validation checks
	pub async fn set<S: AsRef<str>>(
		&self,
		key: &str,
		value: SettingValue,
		roles: &[S],
	) -> ClResult<Setting> {
		let def = self.definition(key)?;
		if def.scope == SettingScope::System || !def.permission.check(roles) {
			warn!("Permission denied for setting '{}' ({:?})", key, def.permission);
			return Err(Error::PermissionDenied);
		}

		let value = match &def.default {
			Some(default) => value.coerce_to(default)?,
			None => value,
		};
		def.validate(&value)?;

		let json = serde_json::to_value(&value)
			.map_err(|e| Error::ValidationError(format!("Unserializable setting: {}", e)))?;
		self.meta.update_setting(key, Some(json)).await?;
		self.cache.invalidate(key);
		info!("Setting '{}' updated", key);

		Ok(Setting { key: key.to_string(), value, updated_at: Timestamp::now() })
	}

	/// Remove the stored value so the default applies again
	pub async fn delete<S: AsRef<str>>(&self, key: &str, roles: &[S]) -> ClResult<()> {
		let def = self.definition(key)?;
		if !def.permission.check(roles) {
			return Err(Error::PermissionDenied);
		}

		self.meta.update_setting(key, None).await?;
		self.cache.invalidate(key);
		info!("Setting '{}' reset", key);
		Ok(())
	}

	/// Fail startup when a setting without a default was never stored
	pub async fn validate_required_settings(&self) -> ClResult<()> {
		for def in self.registry.list().filter(|def| def.default.is_none()) {
			if self.meta.read_setting(&def.key).await?.is_none() {
				return Err(Error::ConfigError(format!(
					"Required setting '{}' is not configured",
					def.key
				)));
			}
		}
		Ok(())
	}

	async fn get_as<T>(
		&self,
		key: &str,
		expected: &str,
		extract: impl FnOnce(SettingValue) -> Result<T, SettingValue>,
	) -> ClResult<T> {
		extract(self.get(key).await?).map_err(|other| {
			Error::ValidationError(format!(
				"Setting '{}' should be {}, got {}",
				key,
				expected,
				other.type_name()
			))
		})
	}

	pub async fn get_string(&self, key: &str) -> ClResult<String> {
		self.get_as(key, "a string", |v| match v {
			SettingValue::String(s) => Ok(s),
			other => Err(other),
		})
		.await
	}

	pub async fn get_int(&self, key: &str) -> ClResult<i64> {
		self.get_as(key, "an integer", |v| match v {
			SettingValue::Int(i) => Ok(i),
			other => Err(other),
		})
		.await
	}

	pub async fn get_bool(&self, key: &str) -> ClResult<bool> {
		self.get_as(key, "a boolean", |v| match v {
			SettingValue::Bool(b) => Ok(b),
			other => Err(other),
		})
		.await
	}
}

// vim: ts=4
