//! SQLite implementation of the meta adapter

#![forbid(unsafe_code)]

mod group_meta;
mod schema;
mod setting;

use async_trait::async_trait;
use sqlx::sqlite::{self, SqlitePool};
use std::{collections::HashMap, path::Path};

use grouplimit_types::meta_adapter::MetaAdapter;
use grouplimit_types::prelude::*;

fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

#[derive(Debug)]
pub struct MetaAdapterSqlite {
	db: SqlitePool,
}

impl MetaAdapterSqlite {
	pub async fn new(path: impl AsRef<Path>) -> ClResult<Self> {
		let opts = sqlite::SqliteConnectOptions::new()
			.filename(path.as_ref())
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(|err| error!("Cannot open meta database: {:#?}", err))
			.or(Err(Error::DbError))?;

		schema::init_db(&db)
			.await
			.inspect_err(|err| error!("Cannot initialize meta database: {:#?}", err))
			.or(Err(Error::DbError))?;

		Ok(Self { db })
	}
}

#[async_trait]
impl MetaAdapter for MetaAdapterSqlite {
	// Settings
	//**********
	async fn list_settings(
		&self,
		prefix: Option<&[String]>,
	) -> ClResult<HashMap<String, serde_json::Value>> {
		setting::list(&self.db, prefix).await
	}

	async fn read_setting(&self, name: &str) -> ClResult<Option<serde_json::Value>> {
		setting::read(&self.db, name).await
	}

	async fn update_setting(&self, name: &str, value: Option<serde_json::Value>) -> ClResult<()> {
		setting::update(&self.db, name, value).await
	}

	// Group metadata
	//****************
	async fn read_group_meta(
		&self,
		group_id: GroupId,
		key: &str,
	) -> ClResult<Option<serde_json::Value>> {
		group_meta::read(&self.db, group_id, key).await
	}

	async fn update_group_meta(
		&self,
		group_id: GroupId,
		key: &str,
		value: Option<serde_json::Value>,
	) -> ClResult<()> {
		group_meta::update(&self.db, group_id, key, value).await
	}
}

// vim: ts=4
