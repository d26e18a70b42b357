use axum::{
	Router, middleware,
	routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::prelude::*;
use crate::settings;
use grouplimit_core::middleware::{optional_auth, request_id, require_auth};
use grouplimit_membership::{admin, ajax, handler};

fn init_public(app: &App) -> Router<App> {
	Router::new()
		.route("/groups/{group_id}", get(handler::get_group_home))
		.route("/groups/{group_id}/", get(handler::get_group_home))
		.route_layer(middleware::from_fn_with_state(app.clone(), optional_auth))
}

fn init_protected(app: &App) -> Router<App> {
	Router::new()
		// Guarded entry points
		.route("/groups/{group_id}/join", get(handler::get_join_group))
		.route("/groups/{group_id}/leave-group", get(handler::get_leave_group))
		.route(
			"/groups/{group_id}/request-membership",
			get(handler::get_request_membership).post(handler::post_request_membership),
		)
		.route("/members/me/groups/invites", get(handler::get_invites))
		.route("/members/me/groups/invites/accept/{group_id}", get(handler::get_accept_invite))
		.route("/members/me/groups/invites/reject/{group_id}", get(handler::get_reject_invite))
		.route("/ajax/joinleave_group", post(ajax::post_joinleave_group))
		.route("/ajax/groups_action", post(ajax::post_groups_action))
		// Limit administration
		.route(
			"/groups/{group_id}/admin/limit",
			get(admin::get_group_limit_form).post(admin::post_group_limit_form),
		)
		.route(
			"/admin/settings/group-limit",
			get(admin::get_limit_settings).post(admin::post_limit_settings),
		)
		// API
		.route("/api/groups", post(admin::post_group))
		.route(
			"/api/groups/{group_id}/limit",
			get(admin::get_group_limit).put(admin::put_group_limit),
		)
		.route("/api/groups/{group_id}/invites", post(admin::post_group_invite))
		.route("/api/groups/{group_id}/bans", post(admin::post_group_ban))
		.route("/api/nonce/{action}", get(admin::get_nonce))
		.route("/api/settings", get(settings::handler::list_settings))
		.route(
			"/api/settings/{name}",
			get(settings::handler::get_setting)
				.put(settings::handler::update_setting)
				.delete(settings::handler::delete_setting),
		)
		.route_layer(middleware::from_fn_with_state(app.clone(), require_auth))
}

pub fn init(app: App) -> Router {
	Router::new()
		.merge(init_public(&app))
		.merge(init_protected(&app))
		.layer(middleware::from_fn(request_id))
		.layer(TraceLayer::new_for_http())
		.with_state(app)
}

// vim: ts=4
