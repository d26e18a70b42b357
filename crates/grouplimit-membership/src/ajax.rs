//! AJAX entry points: the join / leave toggle and the group action dispatcher

use axum::{Form, Json, extract::State, response::Html};
use handlebars::html_escape;
use serde::{Deserialize, Serialize};

use crate::action::{MembershipError, MembershipRequest};
use crate::handler::{
	ButtonKind, NONCE_ACCEPT, NONCE_JOIN, NONCE_LEAVE, NONCE_REQUEST, actions, group_button,
};
use crate::prelude::*;
use grouplimit_core::extract::Auth;
use grouplimit_types::group_adapter::{Group, GroupStatus};

fn parse_group_id(value: Option<&str>) -> Option<GroupId> {
	value.and_then(|v| v.trim().parse::<u32>().ok()).map(GroupId)
}

/// Read a group, treating a missing one as `None`
async fn find_group(app: &App, group_id: GroupId) -> ClResult<Option<Group>> {
	match app.group_adapter.read_group(group_id).await {
		Ok(group) => Ok(Some(group)),
		Err(Error::NotFound) => Ok(None),
		Err(err) => Err(err),
	}
}

// Join / leave toggle //
//*********************//
#[derive(Debug, Default, Deserialize)]
pub struct JoinLeaveForm {
	pub gid: Option<String>,
	#[serde(rename = "_nonce")]
	pub nonce: Option<String>,
}

/// Text fragment for a failed action
fn failure_text(app: &App, err: &MembershipError, failure: &str) -> String {
	match err {
		MembershipError::AdmissionDenied { message } => html_escape(app.tr(message)),
		MembershipError::ActionFailed(err) => {
			warn!("Membership action failed: {}", err);
			html_escape(app.tr(failure))
		}
	}
}

/// POST /ajax/joinleave_group
///
/// Responds with the new button, the denial message or an error text.
/// Banned users and unknown groups get an empty body.
pub async fn post_joinleave_group(
	State(app): State<App>,
	Auth(auth): Auth,
	Form(form): Form<JoinLeaveForm>,
) -> ClResult<Html<String>> {
	let Some(group_id) = parse_group_id(form.gid.as_deref()) else {
		return Ok(Html(String::new()));
	};
	if app.group_adapter.is_banned(group_id, auth.user_id).await? {
		return Ok(Html(String::new()));
	}
	let Some(group) = find_group(&app, group_id).await? else {
		return Ok(Html(String::new()));
	};

	let actions = actions(&app)?;
	let req = MembershipRequest::new(group_id, auth.user_id, auth.is_super_admin());
	let nonce = form.nonce.as_deref();

	let body = if app.group_adapter.is_member(group_id, auth.user_id).await? {
		app.nonces.check(nonce, NONCE_LEAVE, auth.user_id)?;
		match actions.leave.perform(&req).await {
			Ok(()) => match group.status {
				GroupStatus::Public => group_button(&app, &group, auth.user_id, ButtonKind::Join)?,
				GroupStatus::Private => {
					group_button(&app, &group, auth.user_id, ButtonKind::RequestMembership)?
				}
				GroupStatus::Hidden => String::new(),
			},
			Err(err) => failure_text(&app, &err, "Error leaving group"),
		}
	} else {
		match group.status {
			GroupStatus::Public => {
				app.nonces.check(nonce, NONCE_JOIN, auth.user_id)?;
				match actions.join.perform(&req).await {
					Ok(()) => group_button(&app, &group, auth.user_id, ButtonKind::Leave)?,
					Err(err) => failure_text(&app, &err, "Error joining group"),
				}
			}
			GroupStatus::Private => {
				app.nonces.check(nonce, NONCE_REQUEST, auth.user_id)?;
				match actions.request_membership.perform(&req).await {
					Ok(()) => {
						group_button(&app, &group, auth.user_id, ButtonKind::MembershipRequested)?
					}
					Err(err) => failure_text(&app, &err, "Error requesting membership"),
				}
			}
			GroupStatus::Hidden => String::new(),
		}
	};

	Ok(Html(body))
}

// Group action dispatcher //
//*************************//
#[derive(Debug, Default, Deserialize)]
pub struct GroupsActionForm {
	pub action: String,
	pub nonce: Option<String>,
	pub item_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GroupsActionData {
	pub feedback: String,
	#[serde(rename = "type")]
	pub typ: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub contents: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GroupsActionResponse {
	pub success: bool,
	pub data: GroupsActionData,
}

impl GroupsActionResponse {
	fn success(feedback: impl Into<String>, contents: Option<String>) -> Self {
		Self {
			success: true,
			data: GroupsActionData { feedback: feedback.into(), typ: "success", contents },
		}
	}

	fn error(feedback: impl Into<String>) -> Self {
		Self {
			success: false,
			data: GroupsActionData { feedback: feedback.into(), typ: "error", contents: None },
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GroupsAction {
	AcceptInvite,
	JoinGroup,
	RequestMembership,
}

impl GroupsAction {
	fn parse(action: &str) -> Option<Self> {
		match action {
			"accept_invite" => Some(GroupsAction::AcceptInvite),
			"join_group" => Some(GroupsAction::JoinGroup),
			"request_membership" => Some(GroupsAction::RequestMembership),
			_ => None,
		}
	}

	fn nonce_action(self) -> &'static str {
		match self {
			GroupsAction::AcceptInvite => NONCE_ACCEPT,
			GroupsAction::JoinGroup => NONCE_JOIN,
			GroupsAction::RequestMembership => NONCE_REQUEST,
		}
	}
}

const GENERIC_FAILURE: &str = "There was a problem performing this action. Please try again.";

/// POST /ajax/groups_action
pub async fn post_groups_action(
	State(app): State<App>,
	Auth(auth): Auth,
	Form(form): Form<GroupsActionForm>,
) -> ClResult<Json<GroupsActionResponse>> {
	let (Some(action), Some(group_id)) =
		(GroupsAction::parse(&form.action), parse_group_id(form.item_id.as_deref()))
	else {
		return Ok(Json(GroupsActionResponse::error(app.tr(GENERIC_FAILURE))));
	};

	app.nonces.check(form.nonce.as_deref(), action.nonce_action(), auth.user_id)?;

	let Some(group) = find_group(&app, group_id).await? else {
		return Ok(Json(GroupsActionResponse::error(app.tr(GENERIC_FAILURE))));
	};

	let actions = actions(&app)?;
	let req = MembershipRequest::new(group_id, auth.user_id, auth.is_super_admin());

	let (result, success_msg, failure_msg, button) = match action {
		GroupsAction::AcceptInvite => {
			if !app.group_adapter.has_invite(group_id, auth.user_id).await? {
				let msg = app.tr("Group invitation could not be accepted.");
				return Ok(Json(GroupsActionResponse::error(msg)));
			}
			(
				actions.accept_invite.perform(&req).await,
				"Group invite accepted.",
				"Group invitation could not be accepted.",
				ButtonKind::Leave,
			)
		}
		GroupsAction::JoinGroup => {
			if app.group_adapter.is_member(group_id, auth.user_id).await? {
				let msg = app.tr("You are already a member of the group.");
				return Ok(Json(GroupsActionResponse::error(msg)));
			}
			if group.status != GroupStatus::Public {
				let msg = app.tr("Error joining this group.");
				return Ok(Json(GroupsActionResponse::error(msg)));
			}
			(
				actions.join.perform(&req).await,
				"You joined the group!",
				"Error joining this group.",
				ButtonKind::Leave,
			)
		}
		GroupsAction::RequestMembership => {
			if group.status != GroupStatus::Private {
				let msg = app.tr("Error requesting membership.");
				return Ok(Json(GroupsActionResponse::error(msg)));
			}
			(
				actions.request_membership.perform(&req).await,
				"Your membership request was sent to the group administrator successfully.",
				"Error requesting membership.",
				ButtonKind::MembershipRequested,
			)
		}
	};

	let response = match result {
		Ok(()) => {
			let contents = group_button(&app, &group, auth.user_id, button)?;
			GroupsActionResponse::success(app.tr(success_msg), Some(contents))
		}
		Err(MembershipError::AdmissionDenied { message }) => {
			GroupsActionResponse::error(app.tr(&message))
		}
		Err(MembershipError::ActionFailed(err)) => {
			warn!(group_id = %group_id, "Group action failed: {}", err);
			GroupsActionResponse::error(app.tr(failure_msg))
		}
	};
	Ok(Json(response))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_group_id() {
		assert_eq!(parse_group_id(Some("12")), Some(GroupId(12)));
		assert_eq!(parse_group_id(Some(" 3 ")), Some(GroupId(3)));
		assert_eq!(parse_group_id(Some("x")), None);
		assert_eq!(parse_group_id(Some("-1")), None);
		assert_eq!(parse_group_id(None), None);
	}

	#[test]
	fn test_action_names() {
		assert_eq!(GroupsAction::parse("join_group"), Some(GroupsAction::JoinGroup));
		assert_eq!(GroupsAction::parse("accept_invite").map(GroupsAction::nonce_action), Some(NONCE_ACCEPT));
		assert_eq!(GroupsAction::parse("leave_group"), None);
	}

	#[test]
	fn test_response_shape() {
		let json = serde_json::to_value(GroupsActionResponse::error("Full")).unwrap_or_default();
		assert_eq!(
			json,
			serde_json::json!({ "success": false, "data": { "feedback": "Full", "type": "error" } })
		);
	}
}

// vim: ts=4
