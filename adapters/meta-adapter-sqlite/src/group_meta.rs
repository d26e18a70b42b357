//! Per-group metadata

use sqlx::SqlitePool;

use crate::inspect;
use crate::setting::parse_stored;
use grouplimit_types::prelude::*;

pub(crate) async fn read(
	db: &SqlitePool,
	group_id: GroupId,
	key: &str,
) -> ClResult<Option<serde_json::Value>> {
	let raw: Option<Option<String>> =
		sqlx::query_scalar("SELECT value FROM group_meta WHERE group_id = ?1 AND key = ?2")
			.bind(group_id.0)
			.bind(key)
			.fetch_optional(db)
			.await
			.inspect_err(inspect)
			.map_err(|_| Error::DbError)?;

	Ok(parse_stored(&format!("group {} {}", group_id, key), raw.flatten()))
}

pub(crate) async fn update(
	db: &SqlitePool,
	group_id: GroupId,
	key: &str,
	value: Option<serde_json::Value>,
) -> ClResult<()> {
	if let Some(val) = value {
		sqlx::query(
			"INSERT INTO group_meta (group_id, key, value) VALUES (?1, ?2, ?3)
			ON CONFLICT(group_id, key) DO UPDATE SET value = excluded.value, updated_at = unixepoch()",
		)
		.bind(group_id.0)
		.bind(key)
		.bind(val.to_string())
		.execute(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;
	} else {
		sqlx::query("DELETE FROM group_meta WHERE group_id = ?1 AND key = ?2")
			.bind(group_id.0)
			.bind(key)
			.execute(db)
			.await
			.inspect_err(inspect)
			.map_err(|_| Error::DbError)?;
	}

	Ok(())
}

// vim: ts=4
