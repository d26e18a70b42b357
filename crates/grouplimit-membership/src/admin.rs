//! Limit administration: per-group preferences, site settings, group management

use axum::{
	Form, Json,
	extract::{Path, State},
	http::{HeaderMap, StatusCode},
	response::Response,
};
use serde::{Deserialize, Serialize};

use crate::handler::{
	NONCE_ACTIONS, NONCE_GROUP_LIMIT, NONCE_LIMIT_SETTINGS, can_manage_group, policy, render_page,
};
use crate::policy::EffectiveLimit;
use crate::prefs::{GroupPreference, PreferenceForm};
use crate::prelude::*;
use crate::settings::{ALLOW_OVERRIDE, LIMIT_COUNT, LIMIT_MESSAGE};
use grouplimit_core::extract::{Auth, OptionalRequestId};
use grouplimit_core::flash::{Flash, redirect_with_flash};
use grouplimit_core::settings::SettingValue;
use grouplimit_core::AuthCtx;
use grouplimit_types::group_adapter::{CreateGroupData, Group, GroupStatus};
use grouplimit_types::types::ApiResponse;

async fn require_group_admin(app: &App, group_id: GroupId, auth: &AuthCtx) -> ClResult<()> {
	if can_manage_group(app, group_id, auth).await? {
		Ok(())
	} else {
		warn!(group_id = %group_id, user_id = %auth.user_id, "Group admin access denied");
		Err(Error::PermissionDenied)
	}
}

fn require_site_admin(auth: &AuthCtx) -> ClResult<()> {
	if auth.is_super_admin() {
		Ok(())
	} else {
		warn!(user_id = %auth.user_id, "Site admin access denied");
		Err(Error::PermissionDenied)
	}
}

// Per-group preference form //
//***************************//
#[derive(Serialize)]
struct GroupLimitScreen<'a> {
	group: &'a Group,
	pref: GroupPreference,
	count: String,
	default_limit: u32,
	nonce: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct GroupLimitForm {
	#[serde(rename = "_nonce")]
	pub nonce: Option<String>,
	#[serde(flatten)]
	pub pref: PreferenceForm,
}

fn group_limit_url(group_id: GroupId) -> String {
	format!("/groups/{}/admin/limit", group_id)
}

/// GET /groups/{group_id}/admin/limit
pub async fn get_group_limit_form(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(group_id): Path<GroupId>,
	headers: HeaderMap,
) -> ClResult<Response> {
	let group = app.group_adapter.read_group(group_id).await?;
	require_group_admin(&app, group_id, &auth).await?;

	let prefs = policy(&app)?.prefs();
	if !prefs.get_allow_override().await? {
		let flash = Flash::error(app.tr("Group admins cannot change the member limit."));
		return Ok(redirect_with_flash(&group.permalink(), &flash));
	}

	let pref = prefs.read_preference(group_id).await?;
	let body = GroupLimitScreen {
		group: &group,
		pref,
		count: pref.limit_override.map(|n| n.to_string()).unwrap_or_default(),
		default_limit: prefs.get_default_limit().await?,
		nonce: app.nonces.create(NONCE_GROUP_LIMIT, auth.user_id)?,
	};
	let flash = Flash::from_headers(&headers);
	render_page(&app, "group_limit", app.tr("Membership limit settings"), flash.as_ref(), body)
		.await
}

/// POST /groups/{group_id}/admin/limit
pub async fn post_group_limit_form(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(group_id): Path<GroupId>,
	Form(form): Form<GroupLimitForm>,
) -> ClResult<Response> {
	app.nonces.check(form.nonce.as_deref(), NONCE_GROUP_LIMIT, auth.user_id)?;
	let group = app.group_adapter.read_group(group_id).await?;
	require_group_admin(&app, group_id, &auth).await?;

	let prefs = policy(&app)?.prefs();
	if !prefs.get_allow_override().await? {
		let flash = Flash::error(app.tr("Group admins cannot change the member limit."));
		return Ok(redirect_with_flash(&group.permalink(), &flash));
	}

	let url = group_limit_url(group_id);
	let pref = match form.pref.into_preference() {
		Ok(pref) => pref,
		Err(err) => {
			debug!("Invalid group limit form: {}", err);
			let flash = Flash::error(app.tr("Please enter a valid number of members."));
			return Ok(redirect_with_flash(&url, &flash));
		}
	};
	prefs.save_preference(group_id, &pref).await?;

	let flash = Flash::success(app.tr("Group settings were successfully updated."));
	Ok(redirect_with_flash(&url, &flash))
}

// Per-group limit JSON API //
//**************************//
#[derive(Debug, Serialize)]
pub struct GroupLimitResponse {
	#[serde(rename = "groupId")]
	pub group_id: GroupId,
	pub preference: GroupPreference,
	#[serde(rename = "effectiveLimit")]
	pub effective_limit: EffectiveLimit,
	#[serde(rename = "defaultLimit")]
	pub default_limit: u32,
	#[serde(rename = "allowOverride")]
	pub allow_override: bool,
	#[serde(rename = "memberCount")]
	pub member_count: u32,
}

async fn group_limit_response(app: &App, group: &Group) -> ClResult<GroupLimitResponse> {
	let policy = policy(app)?;
	let prefs = policy.prefs();
	Ok(GroupLimitResponse {
		group_id: group.group_id,
		preference: prefs.read_preference(group.group_id).await?,
		effective_limit: policy.effective_limit(group.group_id).await?,
		default_limit: prefs.get_default_limit().await?,
		allow_override: prefs.get_allow_override().await?,
		member_count: group.total_member_count,
	})
}

/// GET /api/groups/{group_id}/limit
pub async fn get_group_limit(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(group_id): Path<GroupId>,
	OptionalRequestId(req_id): OptionalRequestId,
) -> ClResult<(StatusCode, Json<ApiResponse<GroupLimitResponse>>)> {
	let group = app.group_adapter.read_group(group_id).await?;
	require_group_admin(&app, group_id, &auth).await?;

	let response = ApiResponse::new(group_limit_response(&app, &group).await?)
		.with_req_id(req_id.unwrap_or_default());
	Ok((StatusCode::OK, Json(response)))
}

/// PUT /api/groups/{group_id}/limit
pub async fn put_group_limit(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(group_id): Path<GroupId>,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(pref): Json<GroupPreference>,
) -> ClResult<(StatusCode, Json<ApiResponse<GroupLimitResponse>>)> {
	let group = app.group_adapter.read_group(group_id).await?;
	require_group_admin(&app, group_id, &auth).await?;

	let prefs = policy(&app)?.prefs();
	if !prefs.get_allow_override().await? {
		warn!(group_id = %group_id, "Group limit override attempted while overrides are disabled");
		return Err(Error::PermissionDenied);
	}
	prefs.save_preference(group_id, &pref).await?;

	let response = ApiResponse::new(group_limit_response(&app, &group).await?)
		.with_req_id(req_id.unwrap_or_default());
	Ok((StatusCode::OK, Json(response)))
}

// Site settings form //
//********************//
#[derive(Serialize)]
struct SettingsScreen {
	count: i64,
	message: String,
	allow_override: bool,
	nonce: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitSettingsForm {
	#[serde(rename = "_nonce")]
	pub nonce: Option<String>,
	#[serde(rename = "limitCount")]
	pub limit_count: Option<String>,
	#[serde(rename = "limitMessage")]
	pub limit_message: Option<String>,
	#[serde(rename = "allowOverride")]
	pub allow_override: Option<String>,
}

const SETTINGS_URL: &str = "/admin/settings/group-limit";

/// GET /admin/settings/group-limit
pub async fn get_limit_settings(
	State(app): State<App>,
	Auth(auth): Auth,
	headers: HeaderMap,
) -> ClResult<Response> {
	require_site_admin(&auth)?;

	let body = SettingsScreen {
		count: app.settings.get_int(LIMIT_COUNT).await?,
		message: app.settings.get_string(LIMIT_MESSAGE).await?,
		allow_override: app.settings.get_bool(ALLOW_OVERRIDE).await?,
		nonce: app.nonces.create(NONCE_LIMIT_SETTINGS, auth.user_id)?,
	};
	let flash = Flash::from_headers(&headers);
	render_page(&app, "admin_settings", app.tr("Group Member Limit"), flash.as_ref(), body).await
}

/// Coerce a posted value to the type of the setting and run its validator
fn checked_value(app: &App, key: &str, value: SettingValue) -> ClResult<SettingValue> {
	let def = app.settings_registry.get(key).ok_or(Error::NotFound)?;
	let value = match &def.default {
		Some(default) => value.coerce_to(default)?,
		None => value,
	};
	def.validate(&value)?;
	Ok(value)
}

/// Save the site form, storing nothing unless every field is valid
async fn save_limit_settings(app: &App, auth: &AuthCtx, form: LimitSettingsForm) -> ClResult<()> {
	let roles = &auth.roles[..];
	let count = SettingValue::String(form.limit_count.unwrap_or_default());
	let count = checked_value(app, LIMIT_COUNT, count)?;
	let allow = SettingValue::String(form.allow_override.unwrap_or_default());
	let allow = checked_value(app, ALLOW_OVERRIDE, allow)?;
	let message = form
		.limit_message
		.as_deref()
		.map(str::trim)
		.filter(|message| !message.is_empty())
		.map(|message| checked_value(app, LIMIT_MESSAGE, SettingValue::String(message.into())))
		.transpose()?;

	app.settings.set(LIMIT_COUNT, count, roles).await?;
	match message {
		Some(message) => app.settings.set(LIMIT_MESSAGE, message, roles).await.map(|_| ())?,
		None => app.settings.delete(LIMIT_MESSAGE, roles).await?,
	}
	app.settings.set(ALLOW_OVERRIDE, allow, roles).await?;
	Ok(())
}

/// POST /admin/settings/group-limit
pub async fn post_limit_settings(
	State(app): State<App>,
	Auth(auth): Auth,
	Form(form): Form<LimitSettingsForm>,
) -> ClResult<Response> {
	require_site_admin(&auth)?;
	app.nonces.check(form.nonce.as_deref(), NONCE_LIMIT_SETTINGS, auth.user_id)?;

	let flash = match save_limit_settings(&app, &auth, form).await {
		Ok(()) => {
			info!(user_id = %auth.user_id, "Group limit settings saved");
			Flash::success(app.tr("Settings saved."))
		}
		Err(Error::ValidationError(msg)) => {
			debug!("Invalid group limit settings: {}", msg);
			Flash::error(app.tr("Please enter a valid number of members."))
		}
		Err(err) => return Err(err),
	};
	Ok(redirect_with_flash(SETTINGS_URL, &flash))
}

// Group management //
//******************//
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
	#[serde(flatten)]
	pub group: CreateGroupData,
	#[serde(rename = "disableLimit", default)]
	pub disable_limit: bool,
	#[serde(rename = "limitOverride")]
	pub limit_override: Option<u32>,
}

/// POST /api/groups
pub async fn post_group(
	State(app): State<App>,
	Auth(auth): Auth,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(req): Json<CreateGroupRequest>,
) -> ClResult<(StatusCode, Json<ApiResponse<Group>>)> {
	if req.group.name.trim().is_empty() {
		return Err(Error::ValidationError("Group name is required".into()));
	}

	let group_id = app.group_adapter.create_group(auth.user_id, &req.group).await?;
	info!(group_id = %group_id, creator = %auth.user_id, "Group created");

	let pref = GroupPreference { disable_limit: req.disable_limit, limit_override: req.limit_override };
	if pref != GroupPreference::default() {
		let prefs = policy(&app)?.prefs();
		if prefs.get_allow_override().await? {
			prefs.save_preference(group_id, &pref).await?;
		} else {
			debug!(group_id = %group_id, "Ignoring group limit preference, overrides are disabled");
		}
	}

	let group = app.group_adapter.read_group(group_id).await?;
	let response = ApiResponse::new(group).with_req_id(req_id.unwrap_or_default());
	Ok((StatusCode::CREATED, Json(response)))
}

#[derive(Debug, Deserialize)]
pub struct GroupUserRequest {
	#[serde(rename = "userId")]
	pub user_id: UserId,
}

/// POST /api/groups/{group_id}/invites
pub async fn post_group_invite(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(group_id): Path<GroupId>,
	Json(req): Json<GroupUserRequest>,
) -> ClResult<StatusCode> {
	let group = app.group_adapter.read_group(group_id).await?;
	// Members may invite to public and private groups, hidden groups are admin only
	let allowed = match group.status {
		GroupStatus::Hidden => can_manage_group(&app, group_id, &auth).await?,
		_ => {
			auth.is_super_admin() || app.group_adapter.is_member(group_id, auth.user_id).await?
		}
	};
	if !allowed {
		return Err(Error::PermissionDenied);
	}
	if app.group_adapter.is_member(group_id, req.user_id).await? {
		return Err(Error::Conflict("User is already a member".into()));
	}

	app.group_adapter.invite_user(group_id, req.user_id, auth.user_id).await?;
	info!(group_id = %group_id, user_id = %req.user_id, inviter = %auth.user_id, "User invited");
	Ok(StatusCode::NO_CONTENT)
}

/// POST /api/groups/{group_id}/bans
pub async fn post_group_ban(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(group_id): Path<GroupId>,
	Json(req): Json<GroupUserRequest>,
) -> ClResult<StatusCode> {
	app.group_adapter.read_group(group_id).await?;
	require_group_admin(&app, group_id, &auth).await?;

	app.group_adapter.ban_user(group_id, req.user_id).await?;
	info!(group_id = %group_id, user_id = %req.user_id, "User banned");
	Ok(StatusCode::NO_CONTENT)
}

// Nonces //
//********//
#[derive(Debug, Serialize)]
pub struct NonceResponse {
	pub action: String,
	pub nonce: String,
}

/// GET /api/nonce/{action}
pub async fn get_nonce(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(action): Path<String>,
	OptionalRequestId(req_id): OptionalRequestId,
) -> ClResult<(StatusCode, Json<ApiResponse<NonceResponse>>)> {
	if !NONCE_ACTIONS.contains(&action.as_str()) {
		return Err(Error::NotFound);
	}
	let nonce = app.nonces.create(&action, auth.user_id)?;
	let response =
		ApiResponse::new(NonceResponse { action, nonce }).with_req_id(req_id.unwrap_or_default());
	Ok((StatusCode::OK, Json(response)))
}

// vim: ts=4
