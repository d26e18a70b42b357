//! App builder - constructs and runs the group limit service

use std::{path::Path, sync::Arc};

use crate::meta_adapter::MetaAdapter;
use crate::prelude::*;
use crate::settings::service::SettingsService;
use crate::settings::SettingsRegistry;
use crate::{routes, webserver};
use grouplimit_core::extensions::Extensions;
use grouplimit_core::i18n::Catalog;
use grouplimit_core::nonce::NonceService;
use grouplimit_types::group_adapter::GroupAdapter;

pub use grouplimit_core::app::{Adapters, App, AppBuilderOpts, AppState, VERSION};

pub struct AppBuilder {
	opts: AppBuilderOpts,
	adapters: Adapters,
}

impl AppBuilder {
	pub fn new() -> Self {
		AppBuilder {
			opts: AppBuilderOpts::default(),
			adapters: Adapters { group_adapter: None, meta_adapter: None },
		}
	}

	// Opts
	pub fn listen(&mut self, listen: impl Into<Box<str>>) -> &mut Self {
		self.opts.listen = listen.into();
		self
	}
	pub fn jwt_secret(&mut self, jwt_secret: impl Into<Box<str>>) -> &mut Self {
		self.opts.jwt_secret = jwt_secret.into();
		self
	}
	pub fn nonce_secret(&mut self, nonce_secret: impl Into<Box<str>>) -> &mut Self {
		self.opts.nonce_secret = nonce_secret.into();
		self
	}
	pub fn lang_dir(&mut self, lang_dir: impl Into<Box<Path>>) -> &mut Self {
		self.opts.lang_dir = Some(lang_dir.into());
		self
	}
	pub fn locale(&mut self, locale: impl Into<Box<str>>) -> &mut Self {
		self.opts.locale = locale.into();
		self
	}
	pub fn settings_cache_size(&mut self, size: usize) -> &mut Self {
		self.opts.settings_cache_size = size;
		self
	}

	// Adapters
	pub fn group_adapter(&mut self, group_adapter: Arc<dyn GroupAdapter>) -> &mut Self {
		self.adapters.group_adapter = Some(group_adapter);
		self
	}
	pub fn meta_adapter(&mut self, meta_adapter: Arc<dyn MetaAdapter>) -> &mut Self {
		self.adapters.meta_adapter = Some(meta_adapter);
		self
	}

	/// Wire settings, nonces, the catalog and the membership module into an app
	pub async fn build(self) -> ClResult<App> {
		let Some(group_adapter) = self.adapters.group_adapter else {
			error!("FATAL: No group adapter configured");
			return Err(Error::Internal("No group adapter configured".to_string()));
		};
		let Some(meta_adapter) = self.adapters.meta_adapter else {
			error!("FATAL: No meta adapter configured");
			return Err(Error::Internal("No meta adapter configured".to_string()));
		};
		if self.opts.jwt_secret.is_empty() {
			error!("FATAL: No JWT secret configured");
			return Err(Error::ConfigError("JWT secret must not be empty".to_string()));
		}

		// Initialize settings registry and service
		let mut settings_registry = SettingsRegistry::new();
		grouplimit_core::register_settings(&mut settings_registry)?;
		grouplimit_membership::register_settings(&mut settings_registry)?;
		info!("Registered {} settings", settings_registry.len());

		let frozen_registry = Arc::new(settings_registry.freeze());
		let settings_service = Arc::new(SettingsService::new(
			frozen_registry.clone(),
			meta_adapter.clone(),
			self.opts.settings_cache_size,
		));
		settings_service.validate_required_settings().await?;
		info!("Settings subsystem initialized and validated");

		let catalog = Arc::new(match &self.opts.lang_dir {
			Some(dir) => Catalog::load(dir, &self.opts.locale).await?,
			None => Catalog::empty(&self.opts.locale),
		});
		let nonces = NonceService::new(&self.opts.nonce_secret).inspect_err(|e| {
			error!("FATAL: Cannot initialize nonces: {}", e);
		})?;

		// Build extensions map for feature-specific state
		let mut extensions = Extensions::new();
		grouplimit_membership::init(
			&mut extensions,
			&settings_service,
			&meta_adapter,
			&group_adapter,
			&catalog,
		)?;

		let app: App = Arc::new(AppState {
			opts: self.opts,
			group_adapter,
			meta_adapter,
			settings: settings_service,
			settings_registry: frozen_registry,
			nonces,
			catalog,
			extensions,
		});
		Ok(app)
	}

	pub async fn run(self) -> ClResult<()> {
		info!("Group limit service V{}", VERSION);

		let app = self.build().await?;
		let router = routes::init(app.clone());
		webserver::serve(&app, router).await
	}
}

impl Default for AppBuilder {
	fn default() -> Self {
		Self::new()
	}
}

// vim: ts=4
