//! Meta adapter tests: settings and group metadata

use grouplimit_meta_adapter_sqlite::MetaAdapterSqlite;
use grouplimit_types::meta_adapter::MetaAdapter;
use grouplimit_types::types::GroupId;
use serde_json::json;
use tempfile::TempDir;

async fn create_test_adapter() -> (MetaAdapterSqlite, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter = MetaAdapterSqlite::new(temp_dir.path().join("meta.db"))
		.await
		.expect("Failed to create adapter");
	(adapter, temp_dir)
}

#[tokio::test]
async fn test_setting_roundtrip_and_delete() {
	let (adapter, _temp) = create_test_adapter().await;

	assert_eq!(adapter.read_setting("group_limit.count").await.expect("read"), None);

	adapter.update_setting("group_limit.count", Some(json!(25))).await.expect("update");
	assert_eq!(adapter.read_setting("group_limit.count").await.expect("read"), Some(json!(25)));

	adapter.update_setting("group_limit.count", Some(json!(30))).await.expect("update");
	assert_eq!(adapter.read_setting("group_limit.count").await.expect("read"), Some(json!(30)));

	adapter.update_setting("group_limit.count", None).await.expect("delete");
	assert_eq!(adapter.read_setting("group_limit.count").await.expect("read"), None);
}

#[tokio::test]
async fn test_list_settings_by_prefix() {
	let (adapter, _temp) = create_test_adapter().await;
	adapter.update_setting("group_limit.count", Some(json!(5))).await.expect("update");
	adapter.update_setting("group_limit.message", Some(json!("Full"))).await.expect("update");
	adapter.update_setting("core.site_name", Some(json!("Clubs"))).await.expect("update");

	let all = adapter.list_settings(None).await.expect("list");
	assert_eq!(all.len(), 3);

	let prefixes = vec!["group_limit.".to_string()];
	let limited = adapter.list_settings(Some(&prefixes)).await.expect("list");
	assert_eq!(limited.len(), 2);
	assert_eq!(limited.get("group_limit.message"), Some(&json!("Full")));
	assert!(!limited.contains_key("core.site_name"));
}

#[tokio::test]
async fn test_group_meta_is_per_group() {
	let (adapter, _temp) = create_test_adapter().await;
	let (a, b) = (GroupId(1), GroupId(2));

	adapter.update_group_meta(a, "group_limit.count", Some(json!(0))).await.expect("update");
	adapter.update_group_meta(b, "group_limit.disable", Some(json!(true))).await.expect("update");

	assert_eq!(adapter.read_group_meta(a, "group_limit.count").await.expect("read"), Some(json!(0)));
	assert_eq!(adapter.read_group_meta(b, "group_limit.count").await.expect("read"), None);
	assert_eq!(
		adapter.read_group_meta(b, "group_limit.disable").await.expect("read"),
		Some(json!(true))
	);

	adapter.update_group_meta(a, "group_limit.count", None).await.expect("delete");
	assert_eq!(adapter.read_group_meta(a, "group_limit.count").await.expect("read"), None);
}

#[tokio::test]
async fn test_values_survive_reopen() {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let path = temp_dir.path().join("meta.db");
	{
		let adapter = MetaAdapterSqlite::new(&path).await.expect("open");
		adapter.update_setting("group_limit.allow_override", Some(json!(false))).await.expect("update");
	}
	let adapter = MetaAdapterSqlite::new(&path).await.expect("reopen");
	assert_eq!(
		adapter.read_setting("group_limit.allow_override").await.expect("read"),
		Some(json!(false))
	);
}

// vim: ts=4
