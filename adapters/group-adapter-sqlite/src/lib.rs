//! SQLite implementation of the group adapter

#![forbid(unsafe_code)]

mod group;
mod member;
mod schema;
mod utils;

use async_trait::async_trait;
use sqlx::sqlite::{self, SqlitePool};
use std::path::Path;

use grouplimit_types::group_adapter::{CreateGroupData, Group, GroupAdapter, GroupInvite};
use grouplimit_types::prelude::*;

#[derive(Debug)]
pub struct GroupAdapterSqlite {
	db: SqlitePool,
}

impl GroupAdapterSqlite {
	/// Open (or create) the group database at `path`
	pub async fn new(path: impl AsRef<Path>) -> ClResult<Self> {
		let opts = sqlite::SqliteConnectOptions::new()
			.filename(path.as_ref())
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(|err| error!("Cannot open group database: {:#?}", err))
			.or(Err(Error::DbError))?;

		schema::init_db(&db)
			.await
			.inspect_err(|err| error!("Cannot initialize group database: {:#?}", err))
			.or(Err(Error::DbError))?;

		Ok(Self { db })
	}
}

#[async_trait]
impl GroupAdapter for GroupAdapterSqlite {
	// Groups
	//********
	async fn create_group(&self, creator: UserId, data: &CreateGroupData) -> ClResult<GroupId> {
		group::create(&self.db, creator, data).await
	}

	async fn read_group(&self, group_id: GroupId) -> ClResult<Group> {
		group::read(&self.db, group_id).await
	}

	// Membership state
	//******************
	async fn is_member(&self, group_id: GroupId, user_id: UserId) -> ClResult<bool> {
		group::is_member(&self.db, group_id, user_id).await
	}

	async fn is_admin(&self, group_id: GroupId, user_id: UserId) -> ClResult<bool> {
		group::is_admin(&self.db, group_id, user_id).await
	}

	async fn is_banned(&self, group_id: GroupId, user_id: UserId) -> ClResult<bool> {
		group::is_banned(&self.db, group_id, user_id).await
	}

	async fn has_invite(&self, group_id: GroupId, user_id: UserId) -> ClResult<bool> {
		group::has_invite(&self.db, group_id, user_id).await
	}

	async fn has_membership_request(&self, group_id: GroupId, user_id: UserId) -> ClResult<bool> {
		group::has_request(&self.db, group_id, user_id).await
	}

	async fn list_invites(&self, user_id: UserId) -> ClResult<Vec<GroupInvite>> {
		group::list_invites(&self.db, user_id).await
	}

	// Moderation
	//************
	async fn invite_user(
		&self,
		group_id: GroupId,
		user_id: UserId,
		inviter: UserId,
	) -> ClResult<()> {
		member::invite(&self.db, group_id, user_id, inviter).await
	}

	async fn ban_user(&self, group_id: GroupId, user_id: UserId) -> ClResult<()> {
		member::ban(&self.db, group_id, user_id).await
	}

	// Membership operations
	//***********************
	async fn join_group(
		&self,
		group_id: GroupId,
		user_id: UserId,
		cap: Option<u32>,
	) -> ClResult<()> {
		member::join(&self.db, group_id, user_id, cap).await
	}

	async fn leave_group(&self, group_id: GroupId, user_id: UserId) -> ClResult<()> {
		member::leave(&self.db, group_id, user_id).await
	}

	async fn send_membership_request(
		&self,
		group_id: GroupId,
		user_id: UserId,
		comments: Option<&str>,
	) -> ClResult<()> {
		member::send_request(&self.db, group_id, user_id, comments).await
	}

	async fn accept_invite(
		&self,
		group_id: GroupId,
		user_id: UserId,
		cap: Option<u32>,
	) -> ClResult<()> {
		member::accept_invite(&self.db, group_id, user_id, cap).await
	}

	async fn reject_invite(&self, group_id: GroupId, user_id: UserId) -> ClResult<()> {
		member::reject_invite(&self.db, group_id, user_id).await
	}
}

// vim: ts=4
