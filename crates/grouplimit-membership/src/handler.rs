//! Group pages and the guarded page entry points
//!
//! Direct join, request membership and invite acceptance go through the
//! admission-checked actions; a denial becomes a flash message on redirect.

use axum::{
	Form,
	extract::{Path, Query, State},
	http::{HeaderMap, header},
	response::{Html, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::action::{MembershipActions, MembershipError, MembershipRequest};
use crate::policy::{AdmissionPolicy, EffectiveLimit};
use crate::prelude::*;
use crate::render::{Button, Page, Renderer};
use grouplimit_core::extract::{Auth, OptionalAuth};
use grouplimit_core::flash::{self, Flash, redirect, redirect_with_flash};
use grouplimit_core::AuthCtx;
use grouplimit_types::group_adapter::{Group, GroupInvite, GroupStatus};
use std::sync::Arc;

// Nonce actions
pub const NONCE_JOIN: &str = "groups_join_group";
pub const NONCE_LEAVE: &str = "groups_leave_group";
pub const NONCE_REQUEST: &str = "groups_request_membership";
pub const NONCE_ACCEPT: &str = "groups_accept_invite";
pub const NONCE_REJECT: &str = "groups_reject_invite";
pub const NONCE_GROUP_LIMIT: &str = "groups_edit_group_limit";
pub const NONCE_LIMIT_SETTINGS: &str = "group_limit_settings";

pub const NONCE_ACTIONS: &[&str] = &[
	NONCE_JOIN,
	NONCE_LEAVE,
	NONCE_REQUEST,
	NONCE_ACCEPT,
	NONCE_REJECT,
	NONCE_GROUP_LIMIT,
	NONCE_LIMIT_SETTINGS,
];

pub const INVITES_URL: &str = "/members/me/groups/invites";

#[derive(Debug, Default, Deserialize)]
pub struct NonceQuery {
	#[serde(rename = "_nonce")]
	pub nonce: Option<String>,
}

// Helpers //
//*********//
pub(crate) fn actions(app: &App) -> ClResult<&MembershipActions> {
	app.ext::<MembershipActions>()
}

pub(crate) fn policy(app: &App) -> ClResult<&Arc<AdmissionPolicy>> {
	app.ext::<Arc<AdmissionPolicy>>()
}

pub(crate) fn renderer(app: &App) -> ClResult<&Renderer> {
	app.ext::<Renderer>()
}

fn membership_request<'a>(group_id: GroupId, auth: &AuthCtx) -> MembershipRequest<'a> {
	MembershipRequest::new(group_id, auth.user_id, auth.is_super_admin())
}

/// Flash message for a failed membership action
pub(crate) fn failure_flash(app: &App, err: &MembershipError, failure: &str) -> Flash {
	match err {
		MembershipError::AdmissionDenied { message } => Flash::error(app.tr(message)),
		MembershipError::ActionFailed(err) => {
			warn!("Membership action failed: {}", err);
			Flash::error(app.tr(failure))
		}
	}
}

/// Denial flash when the group has no room left for the user
///
/// Runs ahead of the invite checks, so a full group reports the limit message
/// even to users who could not have joined anyway.
async fn limit_denial(app: &App, group_id: GroupId, auth: &AuthCtx) -> ClResult<Option<Flash>> {
	let policy = policy(app)?;
	if policy.can_admit(group_id, auth.is_super_admin()).await? {
		return Ok(None);
	}
	let message = policy.message().await;
	Ok(Some(Flash::error(app.tr(&message))))
}

/// Whether the user may manage the limit of a group
pub(crate) async fn can_manage_group(app: &App, group_id: GroupId, auth: &AuthCtx) -> ClResult<bool> {
	Ok(auth.is_super_admin() || app.group_adapter.is_admin(group_id, auth.user_id).await?)
}

/// Render a page inside the layout, consuming the pending flash message
pub(crate) async fn render_page<T: Serialize>(
	app: &App,
	template: &str,
	title: &str,
	flash: Option<&Flash>,
	body: T,
) -> ClResult<Response> {
	let site_name = app.settings.get_string("core.site_name").await?;
	let lang = app.catalog.locale().split('_').next().unwrap_or("en");
	let page = Page { title, site_name: &site_name, lang, flash, body };
	let html = renderer(app)?.render(template, &page)?;

	let mut res = Html(html).into_response();
	if flash.is_some() {
		res.headers_mut().insert(header::SET_COOKIE, flash::clear_cookie());
	}
	Ok(res)
}

// Buttons //
//*********//
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonKind {
	Join,
	Leave,
	RequestMembership,
	MembershipRequested,
}

/// Render the join / leave button of a group for a user
pub(crate) fn group_button(
	app: &App,
	group: &Group,
	user_id: UserId,
	kind: ButtonKind,
) -> ClResult<String> {
	let permalink = group.permalink();
	let (class, rel, label, href) = match kind {
		ButtonKind::Join => (
			"join-group",
			"join",
			"Join Group",
			format!("{}join?_nonce={}", permalink, app.nonces.create(NONCE_JOIN, user_id)?),
		),
		ButtonKind::Leave => (
			"leave-group",
			"leave",
			"Leave Group",
			format!("{}leave-group?_nonce={}", permalink, app.nonces.create(NONCE_LEAVE, user_id)?),
		),
		ButtonKind::RequestMembership => (
			"request-membership",
			"join",
			"Request Membership",
			format!("{}request-membership", permalink),
		),
		ButtonKind::MembershipRequested => {
			("membership-requested", "membership-requested", "Membership Requested", permalink)
		}
	};
	renderer(app)?.button(&Button { group_id: group.group_id, class, rel, label: app.tr(label), href })
}

/// Button matching the current membership state, if any applies
async fn current_button(app: &App, group: &Group, auth: &AuthCtx) -> ClResult<Option<ButtonKind>> {
	let groups = &app.group_adapter;
	if groups.is_banned(group.group_id, auth.user_id).await? {
		return Ok(None);
	}
	if groups.is_member(group.group_id, auth.user_id).await? {
		return Ok(Some(ButtonKind::Leave));
	}
	Ok(match group.status {
		GroupStatus::Public => Some(ButtonKind::Join),
		GroupStatus::Private => {
			if groups.has_membership_request(group.group_id, auth.user_id).await? {
				Some(ButtonKind::MembershipRequested)
			} else {
				Some(ButtonKind::RequestMembership)
			}
		}
		GroupStatus::Hidden => None,
	})
}

// Group home //
//************//
#[derive(Serialize)]
struct GroupHome<'a> {
	group: &'a Group,
	status_label: &'static str,
	limit: String,
	button: Option<String>,
	is_admin: bool,
}

/// GET /groups/{group_id}
pub async fn get_group_home(
	State(app): State<App>,
	OptionalAuth(auth): OptionalAuth,
	Path(group_id): Path<GroupId>,
	headers: HeaderMap,
) -> ClResult<Response> {
	let group = app.group_adapter.read_group(group_id).await?;

	if group.status == GroupStatus::Hidden {
		let visible = match &auth {
			Some(auth) => {
				auth.is_super_admin()
					|| app.group_adapter.is_member(group_id, auth.user_id).await?
					|| app.group_adapter.has_invite(group_id, auth.user_id).await?
			}
			None => false,
		};
		if !visible {
			return Err(Error::NotFound);
		}
	}

	let (button, is_admin) = match &auth {
		Some(auth) => {
			let button = match current_button(&app, &group, auth).await? {
				Some(kind) => Some(group_button(&app, &group, auth.user_id, kind)?),
				None => None,
			};
			let is_admin = can_manage_group(&app, group_id, auth).await?
				&& policy(&app)?.prefs().get_allow_override().await?;
			(button, is_admin)
		}
		None => (None, false),
	};

	let limit = match policy(&app)?.effective_limit(group_id).await? {
		EffectiveLimit::Unbounded => app.tr("unlimited").to_string(),
		EffectiveLimit::Capped(limit) => limit.to_string(),
	};
	let status_label = match group.status {
		GroupStatus::Public => "Public Group",
		GroupStatus::Private => "Private Group",
		GroupStatus::Hidden => "Hidden Group",
	};

	let flash = Flash::from_headers(&headers);
	let body = GroupHome { group: &group, status_label, limit, button, is_admin };
	render_page(&app, "group_home", &group.name, flash.as_ref(), body).await
}

// Direct join //
//*************//
/// GET /groups/{group_id}/join?_nonce=...
pub async fn get_join_group(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(group_id): Path<GroupId>,
	Query(query): Query<NonceQuery>,
) -> ClResult<Response> {
	app.nonces.check(query.nonce.as_deref(), NONCE_JOIN, auth.user_id)?;

	let group = app.group_adapter.read_group(group_id).await?;
	let permalink = group.permalink();

	// Members and banned users just see the group
	if app.group_adapter.is_member(group_id, auth.user_id).await?
		|| app.group_adapter.is_banned(group_id, auth.user_id).await?
	{
		return Ok(redirect(&permalink));
	}

	if let Some(flash) = limit_denial(&app, group_id, &auth).await? {
		return Ok(redirect_with_flash(&permalink, &flash));
	}

	if group.status != GroupStatus::Public
		&& !app.group_adapter.has_invite(group_id, auth.user_id).await?
	{
		let flash = Flash::error(app.tr("There was an error joining the group."));
		return Ok(redirect_with_flash(&permalink, &flash));
	}

	let req = membership_request(group_id, &auth);
	let flash = match actions(&app)?.join.perform(&req).await {
		Ok(()) => Flash::success(app.tr("You joined the group!")),
		Err(err) => failure_flash(&app, &err, "There was an error joining the group."),
	};
	Ok(redirect_with_flash(&permalink, &flash))
}

/// GET /groups/{group_id}/leave-group?_nonce=...
pub async fn get_leave_group(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(group_id): Path<GroupId>,
	Query(query): Query<NonceQuery>,
) -> ClResult<Response> {
	app.nonces.check(query.nonce.as_deref(), NONCE_LEAVE, auth.user_id)?;

	let group = app.group_adapter.read_group(group_id).await?;
	let permalink = group.permalink();
	if !app.group_adapter.is_member(group_id, auth.user_id).await? {
		return Ok(redirect(&permalink));
	}

	let req = membership_request(group_id, &auth);
	let flash = match actions(&app)?.leave.perform(&req).await {
		Ok(()) => Flash::success(app.tr("You successfully left the group.")),
		Err(err) => failure_flash(&app, &err, "There was an error leaving the group."),
	};
	Ok(redirect_with_flash(&permalink, &flash))
}

// Membership request //
//********************//
#[derive(Serialize)]
struct RequestScreen<'a> {
	group: &'a Group,
	requested: bool,
	nonce: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RequestMembershipForm {
	#[serde(rename = "_nonce")]
	pub nonce: Option<String>,
	#[serde(rename = "group-request-send")]
	pub send: Option<String>,
	#[serde(rename = "group-request-membership-comments")]
	pub comments: Option<String>,
}

/// Load a private group for the request screen, or the redirect to use instead
async fn request_screen_group(
	app: &App,
	group_id: GroupId,
	auth: &AuthCtx,
) -> ClResult<Result<Group, Response>> {
	let group = app.group_adapter.read_group(group_id).await?;
	if group.status != GroupStatus::Private
		|| app.group_adapter.is_member(group_id, auth.user_id).await?
	{
		return Ok(Err(redirect(&group.permalink())));
	}
	Ok(Ok(group))
}

async fn render_request_screen(
	app: &App,
	group: &Group,
	auth: &AuthCtx,
	flash: Option<&Flash>,
) -> ClResult<Response> {
	let requested = app.group_adapter.has_membership_request(group.group_id, auth.user_id).await?;
	let nonce = app.nonces.create(NONCE_REQUEST, auth.user_id)?;
	let body = RequestScreen { group, requested, nonce };
	render_page(app, "request_membership", app.tr("Request Membership"), flash, body).await
}

/// GET /groups/{group_id}/request-membership
pub async fn get_request_membership(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(group_id): Path<GroupId>,
	headers: HeaderMap,
) -> ClResult<Response> {
	let group = match request_screen_group(&app, group_id, &auth).await? {
		Ok(group) => group,
		Err(res) => return Ok(res),
	};
	let flash = Flash::from_headers(&headers);
	render_request_screen(&app, &group, &auth, flash.as_ref()).await
}

/// POST /groups/{group_id}/request-membership
pub async fn post_request_membership(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(group_id): Path<GroupId>,
	Form(form): Form<RequestMembershipForm>,
) -> ClResult<Response> {
	let group = match request_screen_group(&app, group_id, &auth).await? {
		Ok(group) => group,
		Err(res) => return Ok(res),
	};
	if form.send.is_none() {
		return render_request_screen(&app, &group, &auth, None).await;
	}

	app.nonces.check(form.nonce.as_deref(), NONCE_REQUEST, auth.user_id)?;

	let comments = form.comments.as_deref().map(str::trim).filter(|c| !c.is_empty());
	let req = membership_request(group_id, &auth).with_comments(comments);
	let flash = match actions(&app)?.request_membership.perform(&req).await {
		Ok(()) => Flash::success(app.tr(
			"Your membership request was sent to the group administrator successfully. You will be notified when the group administrator responds to your request.",
		)),
		Err(err) => failure_flash(
			&app,
			&err,
			"There was an error sending your group membership request. Please try again.",
		),
	};
	Ok(redirect_with_flash(&group.permalink(), &flash))
}

// Invites //
//*********//
#[derive(Serialize)]
struct InvitesScreen {
	invites: Vec<GroupInvite>,
	accept_nonce: String,
	reject_nonce: String,
}

/// GET /members/me/groups/invites
pub async fn get_invites(
	State(app): State<App>,
	Auth(auth): Auth,
	headers: HeaderMap,
) -> ClResult<Response> {
	let invites = app.group_adapter.list_invites(auth.user_id).await?;
	let body = InvitesScreen {
		invites,
		accept_nonce: app.nonces.create(NONCE_ACCEPT, auth.user_id)?,
		reject_nonce: app.nonces.create(NONCE_REJECT, auth.user_id)?,
	};
	let flash = Flash::from_headers(&headers);
	render_page(&app, "invites", app.tr("Group Invites"), flash.as_ref(), body).await
}

/// GET /members/me/groups/invites/accept/{group_id}?_nonce=...
pub async fn get_accept_invite(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(group_id): Path<GroupId>,
	Query(query): Query<NonceQuery>,
) -> ClResult<Response> {
	app.nonces.check(query.nonce.as_deref(), NONCE_ACCEPT, auth.user_id)?;

	if let Some(flash) = limit_denial(&app, group_id, &auth).await? {
		return Ok(redirect_with_flash(INVITES_URL, &flash));
	}

	if !app.group_adapter.has_invite(group_id, auth.user_id).await? {
		let flash = Flash::error(app.tr("Group invite could not be accepted"));
		return Ok(redirect_with_flash(INVITES_URL, &flash));
	}

	let req = membership_request(group_id, &auth);
	let flash = match actions(&app)?.accept_invite.perform(&req).await {
		Ok(()) => Flash::success(app.tr("Group invite accepted")),
		Err(err) => failure_flash(&app, &err, "Group invite could not be accepted"),
	};
	Ok(redirect_with_flash(INVITES_URL, &flash))
}

/// GET /members/me/groups/invites/reject/{group_id}?_nonce=...
pub async fn get_reject_invite(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(group_id): Path<GroupId>,
	Query(query): Query<NonceQuery>,
) -> ClResult<Response> {
	app.nonces.check(query.nonce.as_deref(), NONCE_REJECT, auth.user_id)?;

	let req = membership_request(group_id, &auth);
	let flash = match actions(&app)?.reject_invite.perform(&req).await {
		Ok(()) => Flash::success(app.tr("Group invite rejected")),
		Err(err) => failure_flash(&app, &err, "Group invite could not be rejected"),
	};
	Ok(redirect_with_flash(INVITES_URL, &flash))
}

// vim: ts=4
