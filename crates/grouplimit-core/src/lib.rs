//! Core infrastructure for the group member limit service.
//!
//! Shared by the feature crate and the application crate: app state,
//! settings subsystem, authentication extractors and middleware, nonces,
//! flash messages and the message catalog.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod app;
pub mod auth;
pub mod core_settings;
pub mod extensions;
pub mod extract;
pub mod flash;
pub mod i18n;
pub mod middleware;
pub mod nonce;
pub mod prelude;
pub mod settings;

// Re-export commonly used types
pub use app::{App, AppBuilderOpts, AppState};
pub use auth::AuthCtx;
pub use extract::{Auth, OptionalAuth};

pub fn register_settings(
	registry: &mut settings::SettingsRegistry,
) -> grouplimit_types::error::ClResult<()> {
	core_settings::register_settings(registry)
}

// vim: ts=4
