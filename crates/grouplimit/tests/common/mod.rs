//! Test server over SQLite adapters in a temporary directory
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
	Router,
	body::Body,
	http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use grouplimit::{App, AppBuilder, routes};
use grouplimit_core::auth::issue_token;
use grouplimit_core::flash::{FLASH_COOKIE, Flash};
use grouplimit_group_adapter_sqlite::GroupAdapterSqlite;
use grouplimit_meta_adapter_sqlite::MetaAdapterSqlite;
use grouplimit_types::types::{GroupId, UserId};

pub const JWT_SECRET: &str = "http-test-jwt-secret";
pub const OWNER: UserId = UserId(1);
pub const ADMIN: UserId = UserId(99);

pub struct TestServer {
	pub app: App,
	router: Router,
	_temp: TempDir,
}

impl TestServer {
	pub async fn new() -> Self {
		let temp = TempDir::new().expect("Failed to create temp directory");
		let groups = GroupAdapterSqlite::new(temp.path().join("groups.db"))
			.await
			.expect("Failed to open group database");
		let meta = MetaAdapterSqlite::new(temp.path().join("meta.db"))
			.await
			.expect("Failed to open meta database");

		let mut builder = AppBuilder::new();
		builder
			.jwt_secret(JWT_SECRET)
			.nonce_secret("http-test-nonce-secret")
			.group_adapter(Arc::new(groups))
			.meta_adapter(Arc::new(meta));
		let app = builder.build().await.expect("Failed to build app");
		let router = routes::init(app.clone());

		Self { app, router, _temp: temp }
	}

	pub fn token(user_id: UserId) -> String {
		let roles: &[&str] = if user_id == ADMIN { &["SADM"] } else { &[] };
		issue_token(JWT_SECRET, user_id, roles).expect("Failed to issue token")
	}

	pub async fn send(&self, req: Request<Body>) -> Response<Body> {
		self.router.clone().oneshot(req).await.expect("Request failed")
	}

	pub async fn get(&self, uri: &str, user: Option<UserId>) -> Response<Body> {
		let mut req = Request::get(uri);
		if let Some(user) = user {
			req = req.header(header::AUTHORIZATION, format!("Bearer {}", Self::token(user)));
		}
		self.send(req.body(Body::empty()).expect("request")).await
	}

	pub async fn post_form(&self, uri: &str, user: UserId, form: &[(&str, &str)]) -> Response<Body> {
		let body = serde_urlencoded::to_string(form).expect("form");
		let req = Request::post(uri)
			.header(header::AUTHORIZATION, format!("Bearer {}", Self::token(user)))
			.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
			.body(Body::from(body))
			.expect("request");
		self.send(req).await
	}

	pub async fn send_json(
		&self,
		method: &str,
		uri: &str,
		user: UserId,
		body: &Value,
	) -> Response<Body> {
		let req = Request::builder()
			.method(method)
			.uri(uri)
			.header(header::AUTHORIZATION, format!("Bearer {}", Self::token(user)))
			.header(header::CONTENT_TYPE, "application/json")
			.body(Body::from(body.to_string()))
			.expect("request");
		self.send(req).await
	}

	/// Fetch a nonce for `action` through the API
	pub async fn nonce(&self, action: &str, user: UserId) -> String {
		let res = self.get(&format!("/api/nonce/{}", action), Some(user)).await;
		assert_eq!(res.status(), StatusCode::OK);
		let json = body_json(res).await;
		json["data"]["nonce"].as_str().expect("nonce").to_string()
	}

	/// Create a group owned by `OWNER`
	pub async fn create_group(&self, status: &str) -> GroupId {
		let body = json!({ "name": "Hikers", "status": status });
		let res = self.send_json("POST", "/api/groups", OWNER, &body).await;
		assert_eq!(res.status(), StatusCode::CREATED);
		let json = body_json(res).await;
		GroupId(json["data"]["id"].as_u64().and_then(|id| u32::try_from(id).ok()).expect("group id"))
	}

	/// Change a site setting as the site admin
	pub async fn set_setting(&self, key: &str, value: Value) {
		let uri = format!("/api/settings/{}", key);
		let res = self.send_json("PUT", &uri, ADMIN, &json!({ "value": value })).await;
		assert_eq!(res.status(), StatusCode::OK, "setting {}", key);
	}

	/// Add members straight through the store, without an admission check
	pub async fn fill_group(&self, group_id: GroupId, users: std::ops::Range<u32>) {
		for user in users {
			self.app
				.group_adapter
				.join_group(group_id, UserId(user), None)
				.await
				.expect("Failed to add member");
		}
	}

	pub async fn member_count(&self, group_id: GroupId) -> u32 {
		self.app.group_adapter.read_group(group_id).await.expect("group").total_member_count
	}
}

pub async fn body_string(res: Response<Body>) -> String {
	let bytes = res.into_body().collect().await.expect("body").to_bytes();
	String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub async fn body_json(res: Response<Body>) -> Value {
	serde_json::from_str(&body_string(res).await).expect("json body")
}

/// Flash message set by a redirect response
pub fn flash(res: &Response<Body>) -> Option<Flash> {
	res.headers()
		.get_all(header::SET_COOKIE)
		.iter()
		.filter_map(|h| h.to_str().ok())
		.filter_map(|c| c.split(';').next())
		.filter_map(|c| c.split_once('='))
		.find(|(name, value)| *name == FLASH_COOKIE && !value.is_empty())
		.and_then(|(_, value)| Flash::decode(value))
}

pub fn location(res: &Response<Body>) -> Option<&str> {
	res.headers().get(header::LOCATION).and_then(|h| h.to_str().ok())
}

// vim: ts=4
