//! Adapter that stores site settings and per-group metadata as JSON values.

use async_trait::async_trait;
use std::{collections::HashMap, fmt::Debug};

use crate::prelude::*;

#[async_trait]
pub trait MetaAdapter: Debug + Send + Sync {
	/// # Settings
	/// Lists stored settings, optionally restricted to names starting with one of `prefix`
	async fn list_settings(
		&self,
		prefix: Option<&[String]>,
	) -> ClResult<HashMap<String, serde_json::Value>>;
	async fn read_setting(&self, name: &str) -> ClResult<Option<serde_json::Value>>;
	/// Stores a setting; `None` deletes it
	async fn update_setting(&self, name: &str, value: Option<serde_json::Value>) -> ClResult<()>;

	/// # Group metadata
	async fn read_group_meta(
		&self,
		group_id: GroupId,
		key: &str,
	) -> ClResult<Option<serde_json::Value>>;
	/// Stores a group metadata value; `None` deletes it
	async fn update_group_meta(
		&self,
		group_id: GroupId,
		key: &str,
		value: Option<serde_json::Value>,
	) -> ClResult<()>;
}

// vim: ts=4
