//! Common types used throughout the service.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::time::SystemTime;

// GroupId //
//*********//
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u32);

impl std::fmt::Display for GroupId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

// UserId //
//********//
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u32);

impl std::fmt::Display for UserId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

// Timestamp //
//***********//
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
	pub fn now() -> Timestamp {
		let res = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
		Timestamp(res.as_secs().try_into().unwrap_or(i64::MAX))
	}

	pub fn add_seconds(&self, seconds: i64) -> Timestamp {
		Timestamp(self.0.saturating_add(seconds))
	}
}

impl std::fmt::Display for Timestamp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

// ApiResponse //
//*************//
/// Envelope for JSON API responses
#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
	pub data: T,
	#[serde(rename = "reqId")]
	pub req_id: Option<String>,
}

impl<T> ApiResponse<T> {
	pub fn new(data: T) -> Self {
		Self { data, req_id: None }
	}

	pub fn with_req_id(mut self, req_id: impl Into<String>) -> Self {
		let req_id = req_id.into();
		if !req_id.is_empty() {
			self.req_id = Some(req_id);
		}
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_ids_serialize_transparent() {
		let json = serde_json::to_string(&GroupId(42)).unwrap_or_default();
		assert_eq!(json, "42");
		let id: UserId = serde_json::from_str("7").unwrap_or(UserId(0));
		assert_eq!(id, UserId(7));
	}

	#[test]
	fn test_api_response_skips_empty_req_id() {
		let resp = ApiResponse::new(1).with_req_id("");
		let json = serde_json::to_value(&resp).unwrap_or_default();
		assert_eq!(json, serde_json::json!({ "data": 1 }));

		let resp = ApiResponse::new(1).with_req_id("abc");
		let json = serde_json::to_value(&resp).unwrap_or_default();
		assert_eq!(json["reqId"], "abc");
	}
}

// vim: ts=4
