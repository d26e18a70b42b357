//! One-shot flash messages carried across redirects in a cookie

use axum::{
	http::{header, HeaderMap, HeaderValue, StatusCode},
	response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};

use crate::middleware::read_cookie;
use crate::prelude::*;

pub const FLASH_COOKIE: &str = "gl_flash";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlashKind {
	#[serde(rename = "success")]
	Success,
	#[serde(rename = "error")]
	Error,
}

impl FlashKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			FlashKind::Success => "success",
			FlashKind::Error => "error",
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
	pub kind: FlashKind,
	pub message: String,
}

impl Flash {
	pub fn success(message: impl Into<String>) -> Self {
		Self { kind: FlashKind::Success, message: message.into() }
	}

	pub fn error(message: impl Into<String>) -> Self {
		Self { kind: FlashKind::Error, message: message.into() }
	}

	pub fn encode(&self) -> ClResult<String> {
		let json = serde_json::to_vec(self)?;
		Ok(URL_SAFE_NO_PAD.encode(json))
	}

	pub fn decode(value: &str) -> Option<Flash> {
		let json = URL_SAFE_NO_PAD.decode(value.as_bytes()).ok()?;
		serde_json::from_slice(&json).ok()
	}

	/// Read the pending flash message from the request cookies
	pub fn from_headers(headers: &HeaderMap) -> Option<Flash> {
		read_cookie(headers, FLASH_COOKIE).filter(|v| !v.is_empty()).and_then(Flash::decode)
	}

	fn set_cookie(&self) -> ClResult<HeaderValue> {
		let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", FLASH_COOKIE, self.encode()?);
		HeaderValue::from_str(&cookie).map_err(|_| Error::Internal("Invalid flash cookie".into()))
	}
}

/// Cookie header value that removes a consumed flash message
pub fn clear_cookie() -> HeaderValue {
	HeaderValue::from_static("gl_flash=; Path=/; Max-Age=0")
}

/// `303 See Other` redirect that carries a flash message
pub fn redirect_with_flash(location: &str, flash: &Flash) -> Response {
	let mut res = StatusCode::SEE_OTHER.into_response();
	match HeaderValue::from_str(location) {
		Ok(loc) => {
			res.headers_mut().insert(header::LOCATION, loc);
		}
		Err(_) => {
			error!("Invalid redirect location: {}", location);
			return StatusCode::INTERNAL_SERVER_ERROR.into_response();
		}
	}
	match flash.set_cookie() {
		Ok(cookie) => {
			res.headers_mut().insert(header::SET_COOKIE, cookie);
		}
		Err(err) => warn!("Dropping flash message: {}", err),
	}
	res
}

/// Plain `303 See Other` redirect
pub fn redirect(location: &str) -> Response {
	match HeaderValue::from_str(location) {
		Ok(loc) => (StatusCode::SEE_OTHER, [(header::LOCATION, loc)]).into_response(),
		Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_redirect_sets_location_and_cookie() {
		let res = redirect_with_flash("/groups/3/", &Flash::error("Group is full"));
		assert_eq!(res.status(), StatusCode::SEE_OTHER);
		assert_eq!(
			res.headers().get(header::LOCATION).and_then(|h| h.to_str().ok()),
			Some("/groups/3/")
		);

		let cookie = res
			.headers()
			.get(header::SET_COOKIE)
			.and_then(|h| h.to_str().ok())
			.unwrap_or_default()
			.to_string();
		assert!(cookie.starts_with("gl_flash="));

		// Feed the cookie back as a request would
		let value = cookie.trim_start_matches("gl_flash=").split(';').next().unwrap_or_default();
		let mut headers = HeaderMap::new();
		if let Ok(val) = HeaderValue::from_str(&format!("gl_flash={}", value)) {
			headers.insert(header::COOKIE, val);
		}
		assert_eq!(Flash::from_headers(&headers), Some(Flash::error("Group is full")));
	}

	#[test]
	fn test_cleared_cookie_yields_nothing() {
		let mut headers = HeaderMap::new();
		headers.insert(header::COOKIE, HeaderValue::from_static("gl_flash="));
		assert_eq!(Flash::from_headers(&headers), None);
		assert_eq!(Flash::decode("not base64 !"), None);
	}
}

// vim: ts=4
