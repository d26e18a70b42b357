//! Membership actions and the admission decorator
//!
//! Native operations delegate to the group adapter. Join, request membership
//! and accept invite are wrapped in `Admitted`, which runs the admission check
//! first and hands the resolved cap down to the store.

use async_trait::async_trait;
use std::sync::Arc;

use crate::policy::{Admission, AdmissionPolicy};
use crate::prelude::*;
use grouplimit_types::group_adapter::GroupAdapter;

#[derive(Debug)]
pub enum MembershipError {
	/// The group is full; carries the configured message
	AdmissionDenied { message: String },
	/// The underlying operation failed for another reason
	ActionFailed(Error),
}

impl std::fmt::Display for MembershipError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			MembershipError::AdmissionDenied { message } => write!(f, "admission denied: {}", message),
			MembershipError::ActionFailed(err) => write!(f, "action failed: {}", err),
		}
	}
}

impl std::error::Error for MembershipError {}

impl From<Error> for MembershipError {
	fn from(err: Error) -> Self {
		MembershipError::ActionFailed(err)
	}
}

pub type MembershipResult = Result<(), MembershipError>;

/// Parameters of one membership operation
#[derive(Clone, Copy, Debug)]
pub struct MembershipRequest<'a> {
	pub group_id: GroupId,
	pub user_id: UserId,
	pub is_super_admin: bool,
	/// Cap the group store enforces on insert
	pub cap: Option<u32>,
	pub comments: Option<&'a str>,
}

impl<'a> MembershipRequest<'a> {
	pub fn new(group_id: GroupId, user_id: UserId, is_super_admin: bool) -> Self {
		Self { group_id, user_id, is_super_admin, cap: None, comments: None }
	}

	pub fn with_comments(self, comments: Option<&'a str>) -> Self {
		Self { comments, ..self }
	}

	fn with_cap(self, cap: Option<u32>) -> Self {
		Self { cap, ..self }
	}
}

#[async_trait]
pub trait MembershipAction: Send + Sync {
	fn name(&self) -> &'static str;
	async fn perform(&self, req: &MembershipRequest<'_>) -> MembershipResult;
}

// Native actions //
//****************//
#[derive(Debug)]
pub struct JoinGroup {
	groups: Arc<dyn GroupAdapter>,
}

impl JoinGroup {
	pub fn new(groups: Arc<dyn GroupAdapter>) -> Self {
		Self { groups }
	}
}

#[async_trait]
impl MembershipAction for JoinGroup {
	fn name(&self) -> &'static str {
		"join_group"
	}

	async fn perform(&self, req: &MembershipRequest<'_>) -> MembershipResult {
		self.groups.join_group(req.group_id, req.user_id, req.cap).await?;
		info!(group_id = %req.group_id, user_id = %req.user_id, "User joined group");
		Ok(())
	}
}

#[derive(Debug)]
pub struct RequestMembership {
	groups: Arc<dyn GroupAdapter>,
}

impl RequestMembership {
	pub fn new(groups: Arc<dyn GroupAdapter>) -> Self {
		Self { groups }
	}
}

#[async_trait]
impl MembershipAction for RequestMembership {
	fn name(&self) -> &'static str {
		"request_membership"
	}

	async fn perform(&self, req: &MembershipRequest<'_>) -> MembershipResult {
		self.groups.send_membership_request(req.group_id, req.user_id, req.comments).await?;
		info!(group_id = %req.group_id, user_id = %req.user_id, "Membership requested");
		Ok(())
	}
}

#[derive(Debug)]
pub struct AcceptInvite {
	groups: Arc<dyn GroupAdapter>,
}

impl AcceptInvite {
	pub fn new(groups: Arc<dyn GroupAdapter>) -> Self {
		Self { groups }
	}
}

#[async_trait]
impl MembershipAction for AcceptInvite {
	fn name(&self) -> &'static str {
		"accept_invite"
	}

	async fn perform(&self, req: &MembershipRequest<'_>) -> MembershipResult {
		self.groups.accept_invite(req.group_id, req.user_id, req.cap).await?;
		info!(group_id = %req.group_id, user_id = %req.user_id, "Invite accepted");
		Ok(())
	}
}

#[derive(Debug)]
pub struct LeaveGroup {
	groups: Arc<dyn GroupAdapter>,
}

impl LeaveGroup {
	pub fn new(groups: Arc<dyn GroupAdapter>) -> Self {
		Self { groups }
	}
}

#[async_trait]
impl MembershipAction for LeaveGroup {
	fn name(&self) -> &'static str {
		"leave_group"
	}

	async fn perform(&self, req: &MembershipRequest<'_>) -> MembershipResult {
		self.groups.leave_group(req.group_id, req.user_id).await?;
		info!(group_id = %req.group_id, user_id = %req.user_id, "User left group");
		Ok(())
	}
}

#[derive(Debug)]
pub struct RejectInvite {
	groups: Arc<dyn GroupAdapter>,
}

impl RejectInvite {
	pub fn new(groups: Arc<dyn GroupAdapter>) -> Self {
		Self { groups }
	}
}

#[async_trait]
impl MembershipAction for RejectInvite {
	fn name(&self) -> &'static str {
		"reject_invite"
	}

	async fn perform(&self, req: &MembershipRequest<'_>) -> MembershipResult {
		self.groups.reject_invite(req.group_id, req.user_id).await?;
		Ok(())
	}
}

// Admitted //
//**********//
/// Runs the admission check before delegating to the wrapped action
pub struct Admitted<A> {
	inner: A,
	policy: Arc<AdmissionPolicy>,
}

impl<A: MembershipAction> Admitted<A> {
	pub fn new(inner: A, policy: Arc<AdmissionPolicy>) -> Self {
		Self { inner, policy }
	}

	async fn denied(&self) -> MembershipError {
		MembershipError::AdmissionDenied { message: self.policy.message().await }
	}
}

#[async_trait]
impl<A: MembershipAction> MembershipAction for Admitted<A> {
	fn name(&self) -> &'static str {
		self.inner.name()
	}

	async fn perform(&self, req: &MembershipRequest<'_>) -> MembershipResult {
		let cap = match self.policy.admission(req.group_id, req.is_super_admin).await? {
			Admission::Granted { cap } => cap,
			Admission::Denied => {
				info!(
					action = self.inner.name(),
					group_id = %req.group_id,
					user_id = %req.user_id,
					"Membership denied, group is full"
				);
				return Err(self.denied().await);
			}
		};

		match self.inner.perform(&req.with_cap(cap)).await {
			// The store saw the group fill up between the check and the insert
			Err(MembershipError::ActionFailed(Error::LimitReached)) => {
				info!(
					action = self.inner.name(),
					group_id = %req.group_id,
					"Membership denied by the group store"
				);
				Err(self.denied().await)
			}
			res => res,
		}
	}
}

// Registry //
//**********//
/// The composed set of membership actions, built once at start-up
pub struct MembershipActions {
	pub join: Box<dyn MembershipAction>,
	pub request_membership: Box<dyn MembershipAction>,
	pub accept_invite: Box<dyn MembershipAction>,
	pub leave: Box<dyn MembershipAction>,
	pub reject_invite: Box<dyn MembershipAction>,
}

impl MembershipActions {
	pub fn new(groups: &Arc<dyn GroupAdapter>, policy: &Arc<AdmissionPolicy>) -> Self {
		Self {
			join: Box::new(Admitted::new(JoinGroup::new(groups.clone()), policy.clone())),
			request_membership: Box::new(Admitted::new(
				RequestMembership::new(groups.clone()),
				policy.clone(),
			)),
			accept_invite: Box::new(Admitted::new(AcceptInvite::new(groups.clone()), policy.clone())),
			leave: Box::new(LeaveGroup::new(groups.clone())),
			reject_invite: Box::new(RejectInvite::new(groups.clone())),
		}
	}
}

// vim: ts=4
