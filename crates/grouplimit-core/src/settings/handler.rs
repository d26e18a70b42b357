//! JSON API over the settings service
//!
//! Reading is open to any authenticated user; writes follow the permission
//! level of each definition.

use axum::{
	Json,
	extract::{Path, State},
	http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::extract::{Auth, OptionalRequestId};
use crate::prelude::*;
use crate::settings::types::{PermissionLevel, SettingDefinition, SettingScope, SettingValue};
use grouplimit_types::types::ApiResponse;

#[derive(Serialize)]
pub struct SettingResponse {
	pub key: String,
	pub value: SettingValue,
	pub default: Option<SettingValue>,
	pub scope: SettingScope,
	pub permission: PermissionLevel,
	pub description: String,
}

impl SettingResponse {
	fn new(def: &SettingDefinition, value: SettingValue) -> Self {
		Self {
			key: def.key.clone(),
			value,
			default: def.default.clone(),
			scope: def.scope,
			permission: def.permission,
			description: def.description.clone(),
		}
	}
}

type Reply<T> = ClResult<(StatusCode, Json<ApiResponse<T>>)>;

fn reply<T>(data: T, req_id: Option<String>) -> Reply<T> {
	Ok((StatusCode::OK, Json(ApiResponse::new(data).with_req_id(req_id.unwrap_or_default()))))
}

/// GET /api/settings
pub async fn list_settings(
	State(app): State<App>,
	Auth(_auth): Auth,
	OptionalRequestId(req_id): OptionalRequestId,
) -> Reply<Vec<SettingResponse>> {
	let mut listed = Vec::new();
	for def in app.settings_registry.list() {
		match app.settings.get(&def.key).await {
			Ok(value) => listed.push(SettingResponse::new(def, value)),
			Err(err) => debug!("Skipping setting {}: {}", def.key, err),
		}
	}
	reply(listed, req_id)
}

/// GET /api/settings/{name}
pub async fn get_setting(
	State(app): State<App>,
	Auth(_auth): Auth,
	Path(name): Path<String>,
	OptionalRequestId(req_id): OptionalRequestId,
) -> Reply<SettingResponse> {
	let def = app.settings_registry.get(&name).ok_or(Error::NotFound)?;
	let value = app.settings.get(&name).await?;
	reply(SettingResponse::new(def, value), req_id)
}

#[derive(Deserialize)]
pub struct UpdateSettingRequest {
	pub value: SettingValue,
}

/// PUT /api/settings/{name}
pub async fn update_setting(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(name): Path<String>,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(req): Json<UpdateSettingRequest>,
) -> Reply<SettingResponse> {
	let def = app.settings_registry.get(&name).ok_or(Error::NotFound)?;
	let setting = app.settings.set(&name, req.value, &auth.roles[..]).await.inspect_err(|err| {
		if matches!(err, Error::PermissionDenied) {
			warn!(user_id = %auth.user_id, setting = %name, "Setting change refused");
		}
	})?;

	info!(user_id = %auth.user_id, setting = %name, "Setting changed");
	reply(SettingResponse::new(def, setting.value), req_id)
}

/// DELETE /api/settings/{name}
pub async fn delete_setting(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(name): Path<String>,
) -> ClResult<StatusCode> {
	if app.settings_registry.get(&name).is_none() {
		return Err(Error::NotFound);
	}
	app.settings.delete(&name, &auth.roles[..]).await?;

	info!(user_id = %auth.user_id, setting = %name, "Setting reset to default");
	Ok(StatusCode::NO_CONTENT)
}

// vim: ts=4
