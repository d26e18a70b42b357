use std::{env, path, sync::Arc};

use grouplimit::prelude::*;
use grouplimit::AppBuilder;
use grouplimit_group_adapter_sqlite::GroupAdapterSqlite;
use grouplimit_meta_adapter_sqlite::MetaAdapterSqlite;

pub struct Config {
	pub listen: String,
	pub db_dir: path::PathBuf,
	pub jwt_secret: String,
	pub nonce_secret: Option<String>,
	pub lang_dir: Option<path::PathBuf>,
	pub locale: String,
}

impl Config {
	fn from_env() -> Self {
		Config {
			listen: env::var("LISTEN").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
			db_dir: path::PathBuf::from(env::var("DB_DIR").unwrap_or_else(|_| "./data".to_string())),
			jwt_secret: env::var("JWT_SECRET").unwrap_or_default(),
			nonce_secret: env::var("NONCE_SECRET").ok(),
			lang_dir: env::var("LANG_DIR").ok().map(path::PathBuf::from),
			locale: env::var("LOCALE").unwrap_or_else(|_| "en_US".to_string()),
		}
	}
}

async fn run(config: Config) -> ClResult<()> {
	let mut builder = AppBuilder::new();

	tokio::fs::create_dir_all(&config.db_dir).await?;
	let group_adapter = Arc::new(GroupAdapterSqlite::new(config.db_dir.join("groups.db")).await?);
	let meta_adapter = Arc::new(MetaAdapterSqlite::new(config.db_dir.join("meta.db")).await?);

	builder
		.listen(config.listen)
		// Nonces fall back to the token secret
		.nonce_secret(config.nonce_secret.unwrap_or_else(|| config.jwt_secret.clone()))
		.jwt_secret(config.jwt_secret)
		.locale(config.locale)
		.group_adapter(group_adapter)
		.meta_adapter(meta_adapter);
	if let Some(lang_dir) = config.lang_dir {
		builder.lang_dir(lang_dir);
	}
	builder.run().await
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_target(false)
		.init();

	if let Err(err) = run(Config::from_env()).await {
		error!("FATAL: {}", err);
		return std::process::ExitCode::FAILURE;
	}
	std::process::ExitCode::SUCCESS
}

// vim: ts=4
