//! Adapter that owns groups, memberships, invitations and membership requests.
//!
//! The group store maintains `total_member_count` itself; callers never write it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::prelude::*;

/// Group visibility / membership status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupStatus {
	/// Anyone can join directly
	#[serde(rename = "public")]
	Public,
	/// Joining requires an invite or an accepted membership request
	#[serde(rename = "private")]
	Private,
	/// Invite only, not listed
	#[serde(rename = "hidden")]
	Hidden,
}

impl GroupStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			GroupStatus::Public => "public",
			GroupStatus::Private => "private",
			GroupStatus::Hidden => "hidden",
		}
	}

	pub fn parse(s: &str) -> ClResult<GroupStatus> {
		match s {
			"public" => Ok(GroupStatus::Public),
			"private" => Ok(GroupStatus::Private),
			"hidden" => Ok(GroupStatus::Hidden),
			_ => Err(Error::ValidationError(format!("Invalid group status: {}", s))),
		}
	}
}

impl std::fmt::Display for GroupStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct Group {
	#[serde(rename = "id")]
	pub group_id: GroupId,
	pub name: Box<str>,
	pub status: GroupStatus,
	#[serde(rename = "totalMemberCount")]
	pub total_member_count: u32,
	#[serde(rename = "createdAt")]
	pub created_at: Timestamp,
}

impl Group {
	/// Canonical page URL of the group
	pub fn permalink(&self) -> String {
		format!("/groups/{}/", self.group_id)
	}
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupData {
	pub name: Box<str>,
	pub status: GroupStatus,
}

/// A pending invitation as shown on the invites screen
#[derive(Clone, Debug, Serialize)]
pub struct GroupInvite {
	#[serde(rename = "groupId")]
	pub group_id: GroupId,
	#[serde(rename = "groupName")]
	pub group_name: Box<str>,
	#[serde(rename = "invitedBy")]
	pub invited_by: UserId,
	#[serde(rename = "invitedAt")]
	pub invited_at: Timestamp,
}

#[async_trait]
pub trait GroupAdapter: Debug + Send + Sync {
	/// # Groups
	/// Creates a group. The creator becomes its first member and admin.
	async fn create_group(&self, creator: UserId, data: &CreateGroupData) -> ClResult<GroupId>;
	async fn read_group(&self, group_id: GroupId) -> ClResult<Group>;

	/// # Membership state
	async fn is_member(&self, group_id: GroupId, user_id: UserId) -> ClResult<bool>;
	async fn is_admin(&self, group_id: GroupId, user_id: UserId) -> ClResult<bool>;
	async fn is_banned(&self, group_id: GroupId, user_id: UserId) -> ClResult<bool>;
	async fn has_invite(&self, group_id: GroupId, user_id: UserId) -> ClResult<bool>;
	async fn has_membership_request(&self, group_id: GroupId, user_id: UserId) -> ClResult<bool>;
	async fn list_invites(&self, user_id: UserId) -> ClResult<Vec<GroupInvite>>;

	/// # Moderation
	async fn invite_user(&self, group_id: GroupId, user_id: UserId, inviter: UserId)
	-> ClResult<()>;
	async fn ban_user(&self, group_id: GroupId, user_id: UserId) -> ClResult<()>;

	/// # Membership operations
	/// Adds the user as a member.
	///
	/// With `cap` set, the store admits the user only while the member count is
	/// below the cap and fails with `Error::LimitReached` otherwise. The check and
	/// the insert happen atomically.
	async fn join_group(&self, group_id: GroupId, user_id: UserId, cap: Option<u32>)
	-> ClResult<()>;
	async fn leave_group(&self, group_id: GroupId, user_id: UserId) -> ClResult<()>;
	async fn send_membership_request(
		&self,
		group_id: GroupId,
		user_id: UserId,
		comments: Option<&str>,
	) -> ClResult<()>;
	/// Accepts a pending invite, turning it into membership. `cap` as for `join_group`.
	async fn accept_invite(
		&self,
		group_id: GroupId,
		user_id: UserId,
		cap: Option<u32>,
	) -> ClResult<()>;
	async fn reject_invite(&self, group_id: GroupId, user_id: UserId) -> ClResult<()>;
}


// vim: ts=4
