//! Message catalog for user-facing text
//!
//! Catalogs are flat YAML maps from the English message to its translation,
//! stored as `<lang_dir>/<locale>.yaml`. A missing or unreadable catalog is not
//! an error: messages are then shown in English.

use std::collections::HashMap;
use std::path::Path;

use crate::prelude::*;

#[derive(Debug, Default)]
pub struct Catalog {
	locale: Box<str>,
	messages: HashMap<String, String>,
}

impl Catalog {
	/// Catalog without translations
	pub fn empty(locale: &str) -> Self {
		Self { locale: locale.into(), messages: HashMap::new() }
	}

	pub fn from_yaml(locale: &str, yaml: &str) -> ClResult<Self> {
		let messages: HashMap<String, String> = serde_yaml::from_str(yaml)
			.map_err(|e| Error::ConfigError(format!("Invalid catalog for {}: {}", locale, e)))?;
		Ok(Self { locale: locale.into(), messages })
	}

	/// Load `<dir>/<locale>.yaml` if it exists
	pub async fn load(dir: &Path, locale: &str) -> ClResult<Self> {
		if locale.is_empty() {
			return Ok(Self::empty(locale));
		}
		let path = dir.join(format!("{}.yaml", locale));
		match tokio::fs::read_to_string(&path).await {
			Ok(yaml) => {
				let catalog = Self::from_yaml(locale, &yaml)?;
				info!("Loaded {} messages for locale {}", catalog.len(), locale);
				Ok(catalog)
			}
			Err(err) => {
				debug!("No catalog at {}: {}", path.display(), err);
				Ok(Self::empty(locale))
			}
		}
	}

	pub fn locale(&self) -> &str {
		&self.locale
	}

	pub fn len(&self) -> usize {
		self.messages.len()
	}

	pub fn is_empty(&self) -> bool {
		self.messages.is_empty()
	}

	pub fn tr<'a>(&'a self, msgid: &'a str) -> &'a str {
		self.messages.get(msgid).map_or(msgid, String::as_str)
	}
}


// vim: ts=4
