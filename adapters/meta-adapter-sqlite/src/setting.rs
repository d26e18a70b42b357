//! Site settings, one JSON document per name

use std::collections::HashMap;

use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::inspect;
use grouplimit_types::prelude::*;

/// Decode a stored JSON column, logging and skipping anything unreadable
pub(crate) fn parse_stored(owner: &str, raw: Option<String>) -> Option<serde_json::Value> {
	let raw = raw?;
	serde_json::from_str(&raw)
		.inspect_err(|err| warn!(owner, "Ignoring unreadable stored value: {}", err))
		.ok()
}

pub(crate) async fn list(
	db: &SqlitePool,
	prefix: Option<&[String]>,
) -> ClResult<HashMap<String, serde_json::Value>> {
	let mut query = QueryBuilder::<Sqlite>::new("SELECT name, value FROM settings");
	if let Some(prefixes) = prefix.filter(|p| !p.is_empty()) {
		query.push(" WHERE ");
		let mut alternatives = query.separated(" OR ");
		for prefix in prefixes {
			alternatives.push("name LIKE ").push_bind_unseparated(format!("{}%", prefix));
		}
	}

	let rows = query.build().fetch_all(db).await.inspect_err(inspect).or(Err(Error::DbError))?;

	let mut settings = HashMap::with_capacity(rows.len());
	for row in rows {
		let name: String = row.try_get("name").inspect_err(inspect).or(Err(Error::DbError))?;
		let value = parse_stored(&name, row.try_get::<Option<String>, _>("value").ok().flatten());
		settings.insert(name, value.unwrap_or(serde_json::Value::Null));
	}
	Ok(settings)
}

pub(crate) async fn read(db: &SqlitePool, name: &str) -> ClResult<Option<serde_json::Value>> {
	let raw: Option<Option<String>> =
		sqlx::query_scalar("SELECT value FROM settings WHERE name = ?1")
			.bind(name)
			.fetch_optional(db)
			.await
			.inspect_err(inspect)
			.or(Err(Error::DbError))?;

	Ok(parse_stored(name, raw.flatten()))
}

/// Store a value, or remove it when `value` is `None`
pub(crate) async fn update(
	db: &SqlitePool,
	name: &str,
	value: Option<serde_json::Value>,
) -> ClResult<()> {
	let query = match value {
		Some(value) => sqlx::query(
			"INSERT INTO settings (name, value) VALUES (?1, ?2)
			ON CONFLICT(name) DO UPDATE SET value = excluded.value",
		)
		.bind(name)
		.bind(value.to_string()),
		None => sqlx::query("DELETE FROM settings WHERE name = ?1").bind(name),
	};
	query.execute(db).await.inspect_err(inspect).or(Err(Error::DbError))?;

	debug!(setting = name, "Setting stored");
	Ok(())
}

// vim: ts=4
