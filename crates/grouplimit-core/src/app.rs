//! App state type

use std::{path::Path, sync::Arc};

use crate::extensions::Extensions;
use crate::i18n::Catalog;
use crate::nonce::NonceService;
use crate::prelude::*;
use crate::settings::service::SettingsService;
use crate::settings::types::FrozenSettingsRegistry;

use grouplimit_types::group_adapter::GroupAdapter;
use grouplimit_types::meta_adapter::MetaAdapter;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct AppState {
	pub opts: AppBuilderOpts,

	pub group_adapter: Arc<dyn GroupAdapter>,
	pub meta_adapter: Arc<dyn MetaAdapter>,

	// Settings subsystem
	pub settings: Arc<SettingsService>,
	pub settings_registry: Arc<FrozenSettingsRegistry>,

	pub nonces: NonceService,
	pub catalog: Arc<Catalog>,

	// Type-erased extension map for feature-specific state
	pub extensions: Extensions,
}

impl AppState {
	/// Get a registered extension by type. Returns error if not found.
	pub fn ext<T: Send + Sync + 'static>(&self) -> ClResult<&T> {
		self.extensions.get::<T>().ok_or_else(|| {
			Error::Internal(format!("Extension {} not registered", std::any::type_name::<T>()))
		})
	}

	/// Translate a built-in message through the loaded catalog
	pub fn tr<'a>(&'a self, msgid: &'a str) -> &'a str {
		self.catalog.tr(msgid)
	}
}

pub type App = Arc<AppState>;

pub struct Adapters {
	pub group_adapter: Option<Arc<dyn GroupAdapter>>,
	pub meta_adapter: Option<Arc<dyn MetaAdapter>>,
}

#[derive(Debug)]
pub struct AppBuilderOpts {
	pub listen: Box<str>,
	/// HS256 secret for access tokens
	pub jwt_secret: Box<str>,
	/// HMAC secret for action nonces
	pub nonce_secret: Box<str>,
	/// Directory of `<locale>.yaml` message catalogs
	pub lang_dir: Option<Box<Path>>,
	pub locale: Box<str>,
	pub settings_cache_size: usize,
}

impl Default for AppBuilderOpts {
	fn default() -> Self {
		Self {
			listen: "127.0.0.1:8080".into(),
			jwt_secret: "".into(),
			nonce_secret: "".into(),
			lang_dir: None,
			locale: "en_US".into(),
			settings_cache_size: 100,
		}
	}
}

// vim: ts=4
