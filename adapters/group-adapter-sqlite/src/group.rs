//! Groups and membership state queries

use sqlx::{Row, SqlitePool};

use crate::utils::*;
use grouplimit_types::group_adapter::{CreateGroupData, Group, GroupInvite, GroupStatus};
use grouplimit_types::prelude::*;

fn status_to_char(status: GroupStatus) -> &'static str {
	match status {
		GroupStatus::Public => "P",
		GroupStatus::Private => "R",
		GroupStatus::Hidden => "H",
	}
}

fn status_from_char(s: &str) -> Result<GroupStatus, sqlx::Error> {
	match s {
		"P" => Ok(GroupStatus::Public),
		"R" => Ok(GroupStatus::Private),
		"H" => Ok(GroupStatus::Hidden),
		_ => Err(sqlx::Error::Decode(format!("invalid group status: {}", s).into())),
	}
}

/// Create a group with its creator as the first member and admin
pub(crate) async fn create(
	db: &SqlitePool,
	creator: UserId,
	data: &CreateGroupData,
) -> ClResult<GroupId> {
	let mut tx = db.begin().await.inspect_err(inspect).or(Err(Error::DbError))?;

	let res = sqlx::query(
		"INSERT INTO groups (name, status, member_count) VALUES (?1, ?2, 1) RETURNING group_id",
	)
	.bind(data.name.as_ref())
	.bind(status_to_char(data.status))
	.fetch_one(&mut *tx)
	.await;
	let group_id = map_res(res, |row| row.try_get::<u32, _>("group_id"))?;

	sqlx::query("INSERT INTO group_members (group_id, user_id, is_admin) VALUES (?1, ?2, 1)")
		.bind(group_id)
		.bind(creator.0)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

	tx.commit().await.inspect_err(inspect).or(Err(Error::DbError))?;

	debug!(group_id, creator = %creator, "Group row created");
	Ok(GroupId(group_id))
}

pub(crate) async fn read(db: &SqlitePool, group_id: GroupId) -> ClResult<Group> {
	let res = sqlx::query(
		"SELECT group_id, name, status, member_count, created_at FROM groups WHERE group_id = ?1",
	)
	.bind(group_id.0)
	.fetch_one(db)
	.await;

	map_res(res, |row| {
		Ok(Group {
			group_id: GroupId(row.try_get("group_id")?),
			name: row.try_get::<String, _>("name")?.into(),
			status: status_from_char(row.try_get("status")?)?,
			total_member_count: to_count(row.try_get("member_count")?),
			created_at: Timestamp(row.try_get("created_at")?),
		})
	})
}

/// Run an `EXISTS` query bound to a group and a user
async fn exists(db: &SqlitePool, sql: &str, group_id: GroupId, user_id: UserId) -> ClResult<bool> {
	let res = sqlx::query(sql).bind(group_id.0).bind(user_id.0).fetch_one(db).await;
	map_res(res, |row| row.try_get::<bool, _>(0))
}

pub(crate) async fn is_member(db: &SqlitePool, group_id: GroupId, user_id: UserId) -> ClResult<bool> {
	exists(
		db,
		"SELECT EXISTS(SELECT 1 FROM group_members WHERE group_id = ?1 AND user_id = ?2)",
		group_id,
		user_id,
	)
	.await
}

pub(crate) async fn is_admin(db: &SqlitePool, group_id: GroupId, user_id: UserId) -> ClResult<bool> {
	exists(
		db,
		"SELECT EXISTS(SELECT 1 FROM group_members WHERE group_id = ?1 AND user_id = ?2 AND is_admin)",
		group_id,
		user_id,
	)
	.await
}

pub(crate) async fn is_banned(db: &SqlitePool, group_id: GroupId, user_id: UserId) -> ClResult<bool> {
	exists(
		db,
		"SELECT EXISTS(SELECT 1 FROM group_bans WHERE group_id = ?1 AND user_id = ?2)",
		group_id,
		user_id,
	)
	.await
}

pub(crate) async fn has_invite(db: &SqlitePool, group_id: GroupId, user_id: UserId) -> ClResult<bool> {
	exists(
		db,
		"SELECT EXISTS(SELECT 1 FROM group_invites WHERE group_id = ?1 AND user_id = ?2)",
		group_id,
		user_id,
	)
	.await
}

pub(crate) async fn has_request(db: &SqlitePool, group_id: GroupId, user_id: UserId) -> ClResult<bool> {
	exists(
		db,
		"SELECT EXISTS(SELECT 1 FROM group_requests WHERE group_id = ?1 AND user_id = ?2)",
		group_id,
		user_id,
	)
	.await
}

/// Pending invites of a user, ordered by group
pub(crate) async fn list_invites(db: &SqlitePool, user_id: UserId) -> ClResult<Vec<GroupInvite>> {
	let rows = sqlx::query(
		"SELECT i.group_id, g.name, i.inviter_id, i.created_at
		FROM group_invites i
		JOIN groups g ON g.group_id = i.group_id
		WHERE i.user_id = ?1
		ORDER BY i.group_id",
	)
	.bind(user_id.0)
	.fetch_all(db)
	.await
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	rows.iter()
		.map(|row| {
			Ok(GroupInvite {
				group_id: GroupId(row.try_get("group_id")?),
				group_name: row.try_get::<String, _>("name")?.into(),
				invited_by: UserId(row.try_get("inviter_id")?),
				invited_at: Timestamp(row.try_get("created_at")?),
			})
		})
		.collect::<Result<Vec<_>, sqlx::Error>>()
		.inspect_err(inspect)
		.or(Err(Error::DbError))
}

// vim: ts=4
