//! Database schema initialization

use sqlx::SqlitePool;

/// Initialize the database schema with all required tables and indexes
pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	// Groups
	//********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS groups (
		group_id integer NOT NULL,
		name text NOT NULL,
		status char(1) NOT NULL,
		member_count integer NOT NULL DEFAULT 0,
		created_at datetime DEFAULT (unixepoch()),
		PRIMARY KEY(group_id AUTOINCREMENT)
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS group_members (
		group_id integer NOT NULL,
		user_id integer NOT NULL,
		is_admin boolean NOT NULL DEFAULT 0,
		joined_at datetime DEFAULT (unixepoch()),
		PRIMARY KEY(group_id, user_id)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_group_members_user ON group_members(user_id)")
		.execute(&mut *tx)
		.await?;

	// Invites, requests and bans
	//****************************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS group_invites (
		group_id integer NOT NULL,
		user_id integer NOT NULL,
		inviter_id integer NOT NULL,
		created_at datetime DEFAULT (unixepoch()),
		PRIMARY KEY(group_id, user_id)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_group_invites_user ON group_invites(user_id)")
		.execute(&mut *tx)
		.await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS group_requests (
		group_id integer NOT NULL,
		user_id integer NOT NULL,
		comments text,
		created_at datetime DEFAULT (unixepoch()),
		PRIMARY KEY(group_id, user_id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS group_bans (
		group_id integer NOT NULL,
		user_id integer NOT NULL,
		created_at datetime DEFAULT (unixepoch()),
		PRIMARY KEY(group_id, user_id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;

	Ok(())
}

// vim: ts=4
