//! HTML rendering with Handlebars
//!
//! Templates are embedded at compile time. Every page template is a partial
//! block of `layout`. The `tr` helper translates a message id through the
//! loaded catalog.

use handlebars::{
	Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext, html_escape,
};
use serde::Serialize;
use std::sync::Arc;

use crate::prelude::*;
use grouplimit_core::flash::Flash;
use grouplimit_core::i18n::Catalog;

const TEMPLATES: &[(&str, &str)] = &[
	("layout", include_str!("../templates/layout.hbs")),
	("button", include_str!("../templates/button.hbs")),
	("group_home", include_str!("../templates/group_home.hbs")),
	("request_membership", include_str!("../templates/request_membership.hbs")),
	("invites", include_str!("../templates/invites.hbs")),
	("group_limit", include_str!("../templates/group_limit.hbs")),
	("admin_settings", include_str!("../templates/admin_settings.hbs")),
];

struct TrHelper {
	catalog: Arc<Catalog>,
}

impl HelperDef for TrHelper {
	fn call<'reg: 'rc, 'rc>(
		&self,
		h: &Helper<'rc>,
		_: &'reg Handlebars<'reg>,
		_: &'rc Context,
		_: &mut RenderContext<'reg, 'rc>,
		out: &mut dyn Output,
	) -> HelperResult {
		let msgid = h.param(0).and_then(|p| p.value().as_str()).unwrap_or_default();
		out.write(&html_escape(self.catalog.tr(msgid)))?;
		Ok(())
	}
}

/// Join / leave button shown on group pages and returned by the AJAX toggle
#[derive(Debug, Serialize)]
pub struct Button<'a> {
	pub group_id: GroupId,
	pub class: &'a str,
	pub rel: &'a str,
	pub label: &'a str,
	pub href: String,
}

/// Common page frame data
#[derive(Debug, Serialize)]
pub struct Page<'a, T: Serialize> {
	pub title: &'a str,
	pub site_name: &'a str,
	pub lang: &'a str,
	pub flash: Option<&'a Flash>,
	#[serde(flatten)]
	pub body: T,
}

pub struct Renderer {
	handlebars: Handlebars<'static>,
}

impl Renderer {
	pub fn new(catalog: Arc<Catalog>) -> ClResult<Self> {
		let mut handlebars = Handlebars::new();
		handlebars.register_helper("tr", Box::new(TrHelper { catalog }));

		for (name, source) in TEMPLATES {
			handlebars.register_template_string(name, source).map_err(|e| {
				Error::ConfigError(format!("Invalid template '{}': {}", name, e))
			})?;
		}

		Ok(Self { handlebars })
	}

	pub fn render<T: Serialize>(&self, template: &str, data: &T) -> ClResult<String> {
		self.handlebars.render(template, data).map_err(|e| {
			error!("Failed to render template '{}': {}", template, e);
			Error::Internal(format!("template rendering failed: {}", template))
		})
	}

	pub fn button(&self, button: &Button<'_>) -> ClResult<String> {
		Ok(self.render("button", button)?.trim_end().to_string())
	}
}

impl std::fmt::Debug for Renderer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Renderer").finish_non_exhaustive()
	}
}


// vim: ts=4
