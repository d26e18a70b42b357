//! Membership changes
//!
//! Every operation that adds a member runs the cap check and the insert as a
//! single conditional statement inside a write transaction, and keeps
//! `groups.member_count` in step with `group_members`.

use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use crate::utils::*;
use grouplimit_types::prelude::*;

async fn begin(db: &SqlitePool) -> ClResult<Transaction<'_, Sqlite>> {
	db.begin().await.inspect_err(inspect).or(Err(Error::DbError))
}

async fn commit(tx: Transaction<'_, Sqlite>) -> ClResult<()> {
	tx.commit().await.inspect_err(inspect).or(Err(Error::DbError))
}

async fn adjust_count(
	tx: &mut Transaction<'_, Sqlite>,
	group_id: GroupId,
	delta: i64,
) -> ClResult<()> {
	sqlx::query("UPDATE groups SET member_count = max(member_count + ?2, 0) WHERE group_id = ?1")
		.bind(group_id.0)
		.bind(delta)
		.execute(&mut **tx)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;
	Ok(())
}

/// Why a conditional insert did not add a row
struct Blocker {
	group_exists: bool,
	is_member: bool,
	is_banned: bool,
	has_invite: bool,
}

async fn blocker(
	tx: &mut Transaction<'_, Sqlite>,
	group_id: GroupId,
	user_id: UserId,
) -> ClResult<Blocker> {
	let res = sqlx::query(
		"SELECT
			EXISTS(SELECT 1 FROM groups WHERE group_id = ?1) AS group_exists,
			EXISTS(SELECT 1 FROM group_members WHERE group_id = ?1 AND user_id = ?2) AS is_member,
			EXISTS(SELECT 1 FROM group_bans WHERE group_id = ?1 AND user_id = ?2) AS is_banned,
			EXISTS(SELECT 1 FROM group_invites WHERE group_id = ?1 AND user_id = ?2) AS has_invite",
	)
	.bind(group_id.0)
	.bind(user_id.0)
	.fetch_one(&mut **tx)
	.await;

	map_res(res, |row| {
		Ok(Blocker {
			group_exists: row.try_get("group_exists")?,
			is_member: row.try_get("is_member")?,
			is_banned: row.try_get("is_banned")?,
			has_invite: row.try_get("has_invite")?,
		})
	})
}

/// Drop pending invites and requests once the user is a member
async fn clear_pending(
	tx: &mut Transaction<'_, Sqlite>,
	group_id: GroupId,
	user_id: UserId,
) -> ClResult<()> {
	for sql in [
		"DELETE FROM group_invites WHERE group_id = ?1 AND user_id = ?2",
		"DELETE FROM group_requests WHERE group_id = ?1 AND user_id = ?2",
	] {
		sqlx::query(sql)
			.bind(group_id.0)
			.bind(user_id.0)
			.execute(&mut **tx)
			.await
			.inspect_err(inspect)
			.or(Err(Error::DbError))?;
	}
	Ok(())
}

pub(crate) async fn join(
	db: &SqlitePool,
	group_id: GroupId,
	user_id: UserId,
	cap: Option<u32>,
) -> ClResult<()> {
	let mut tx = begin(db).await?;

	let res = sqlx::query(
		"INSERT OR IGNORE INTO group_members (group_id, user_id)
		SELECT g.group_id, ?2 FROM groups g
		WHERE g.group_id = ?1
			AND (?3 IS NULL OR g.member_count < ?3)
			AND NOT EXISTS(SELECT 1 FROM group_bans b WHERE b.group_id = ?1 AND b.user_id = ?2)",
	)
	.bind(group_id.0)
	.bind(user_id.0)
	.bind(cap)
	.execute(&mut *tx)
	.await
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	if res.rows_affected() == 0 {
		let blocker = blocker(&mut tx, group_id, user_id).await?;
		if !blocker.group_exists {
			return Err(Error::NotFound);
		}
		if blocker.is_banned {
			return Err(Error::PermissionDenied);
		}
		if !blocker.is_member {
			debug!(group_id = %group_id, user_id = %user_id, ?cap, "Join rejected: group is full");
			return Err(Error::LimitReached);
		}
		// Already a member
		return Ok(());
	}

	adjust_count(&mut tx, group_id, 1).await?;
	clear_pending(&mut tx, group_id, user_id).await?;
	commit(tx).await?;

	info!(group_id = %group_id, user_id = %user_id, "User joined group");
	Ok(())
}

pub(crate) async fn accept_invite(
	db: &SqlitePool,
	group_id: GroupId,
	user_id: UserId,
	cap: Option<u32>,
) -> ClResult<()> {
	let mut tx = begin(db).await?;

	let res = sqlx::query(
		"INSERT OR IGNORE INTO group_members (group_id, user_id)
		SELECT g.group_id, ?2 FROM groups g
		WHERE g.group_id = ?1
			AND (?3 IS NULL OR g.member_count < ?3)
			AND EXISTS(SELECT 1 FROM group_invites i WHERE i.group_id = ?1 AND i.user_id = ?2)",
	)
	.bind(group_id.0)
	.bind(user_id.0)
	.bind(cap)
	.execute(&mut *tx)
	.await
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	if res.rows_affected() == 0 {
		let blocker = blocker(&mut tx, group_id, user_id).await?;
		if !blocker.group_exists || !blocker.has_invite {
			return Err(Error::NotFound);
		}
		if !blocker.is_member {
			debug!(group_id = %group_id, user_id = %user_id, ?cap, "Invite rejected: group is full");
			return Err(Error::LimitReached);
		}
		// Already a member, the invite is stale
		clear_pending(&mut tx, group_id, user_id).await?;
		return commit(tx).await;
	}

	adjust_count(&mut tx, group_id, 1).await?;
	clear_pending(&mut tx, group_id, user_id).await?;
	commit(tx).await?;

	info!(group_id = %group_id, user_id = %user_id, "Invite accepted");
	Ok(())
}

pub(crate) async fn leave(db: &SqlitePool, group_id: GroupId, user_id: UserId) -> ClResult<()> {
	let mut tx = begin(db).await?;

	let res = sqlx::query("DELETE FROM group_members WHERE group_id = ?1 AND user_id = ?2")
		.bind(group_id.0)
		.bind(user_id.0)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;
	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}

	adjust_count(&mut tx, group_id, -1).await?;
	commit(tx).await?;

	info!(group_id = %group_id, user_id = %user_id, "User left group");
	Ok(())
}

pub(crate) async fn send_request(
	db: &SqlitePool,
	group_id: GroupId,
	user_id: UserId,
	comments: Option<&str>,
) -> ClResult<()> {
	let mut tx = begin(db).await?;

	let res = sqlx::query(
		"INSERT OR IGNORE INTO group_requests (group_id, user_id, comments)
		SELECT group_id, ?2, ?3 FROM groups WHERE group_id = ?1",
	)
	.bind(group_id.0)
	.bind(user_id.0)
	.bind(comments)
	.execute(&mut *tx)
	.await
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	if res.rows_affected() == 0 {
		let blocker = blocker(&mut tx, group_id, user_id).await?;
		if !blocker.group_exists {
			return Err(Error::NotFound);
		}
		return Err(Error::Conflict("Membership already requested".into()));
	}

	commit(tx).await?;
	info!(group_id = %group_id, user_id = %user_id, "Membership requested");
	Ok(())
}

pub(crate) async fn invite(
	db: &SqlitePool,
	group_id: GroupId,
	user_id: UserId,
	inviter: UserId,
) -> ClResult<()> {
	let res = sqlx::query(
		"INSERT OR REPLACE INTO group_invites (group_id, user_id, inviter_id)
		SELECT group_id, ?2, ?3 FROM groups WHERE group_id = ?1",
	)
	.bind(group_id.0)
	.bind(user_id.0)
	.bind(inviter.0)
	.execute(db)
	.await
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	Ok(())
}

pub(crate) async fn reject_invite(
	db: &SqlitePool,
	group_id: GroupId,
	user_id: UserId,
) -> ClResult<()> {
	let res = sqlx::query("DELETE FROM group_invites WHERE group_id = ?1 AND user_id = ?2")
		.bind(group_id.0)
		.bind(user_id.0)
		.execute(db)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	Ok(())
}

/// Remove the user from the group and keep them out
pub(crate) async fn ban(db: &SqlitePool, group_id: GroupId, user_id: UserId) -> ClResult<()> {
	let mut tx = begin(db).await?;

	if !blocker(&mut tx, group_id, user_id).await?.group_exists {
		return Err(Error::NotFound);
	}

	let removed = sqlx::query("DELETE FROM group_members WHERE group_id = ?1 AND user_id = ?2")
		.bind(group_id.0)
		.bind(user_id.0)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?
		.rows_affected();
	if removed > 0 {
		adjust_count(&mut tx, group_id, -1).await?;
	}
	clear_pending(&mut tx, group_id, user_id).await?;

	sqlx::query("INSERT OR IGNORE INTO group_bans (group_id, user_id) VALUES (?1, ?2)")
		.bind(group_id.0)
		.bind(user_id.0)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

	commit(tx).await?;
	info!(group_id = %group_id, user_id = %user_id, "User banned from group");
	Ok(())
}

// vim: ts=4
