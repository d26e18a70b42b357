//! Group member limit.
//!
//! Caps the number of members of a group and guards the join, request
//! membership and invite accept workflows with an admission check. Group
//! admins may override the site-wide limit for their group, or disable it.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod action;
pub mod admin;
pub mod ajax;
pub mod handler;
pub mod policy;
pub mod prefs;
pub mod render;
pub mod settings;

mod prelude;

use std::sync::Arc;

use crate::action::MembershipActions;
use crate::policy::AdmissionPolicy;
use crate::prefs::PreferenceStore;
use crate::prelude::*;
use crate::render::Renderer;
use grouplimit_core::extensions::Extensions;
use grouplimit_core::i18n::Catalog;
use grouplimit_core::settings::service::SettingsService;
use grouplimit_types::group_adapter::GroupAdapter;
use grouplimit_types::meta_adapter::MetaAdapter;

pub fn register_settings(
	registry: &mut grouplimit_core::settings::SettingsRegistry,
) -> ClResult<()> {
	settings::register_settings(registry)
}

/// Build the admission policy, the composed membership actions and the
/// renderer, and register them as extensions
pub fn init(
	extensions: &mut Extensions,
	settings: &Arc<SettingsService>,
	meta_adapter: &Arc<dyn MetaAdapter>,
	group_adapter: &Arc<dyn GroupAdapter>,
	catalog: &Arc<Catalog>,
) -> ClResult<()> {
	let prefs = PreferenceStore::new(settings.clone(), meta_adapter.clone());
	let policy = Arc::new(AdmissionPolicy::new(prefs, group_adapter.clone()));

	extensions.insert(MembershipActions::new(group_adapter, &policy));
	extensions.insert(policy);
	extensions.insert(Renderer::new(catalog.clone())?);

	info!("Group member limit initialized");
	Ok(())
}

// vim: ts=4
