//! Custom middlewares

use axum::{
	body::Body,
	extract::State,
	http::{header, HeaderMap, HeaderValue, Request},
	middleware::Next,
	response::Response,
};

use crate::auth::validate_token;
use crate::extract::{Auth, RequestId};
use crate::prelude::*;

/// Name of the cookie page flows use instead of an Authorization header
pub const TOKEN_COOKIE: &str = "token";

/// Find a cookie value in the request headers
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers
		.get_all(header::COOKIE)
		.iter()
		.filter_map(|h| h.to_str().ok())
		.flat_map(|h| h.split(';'))
		.filter_map(|pair| pair.trim().split_once('='))
		.find(|(k, _)| *k == name)
		.map(|(_, v)| v)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
	if let Some(auth_header) = headers.get(header::AUTHORIZATION).and_then(|h| h.to_str().ok()) {
		return auth_header.strip_prefix("Bearer ").map(str::trim);
	}
	read_cookie(headers, TOKEN_COOKIE)
}

pub async fn require_auth(
	State(app): State<App>,
	mut req: Request<Body>,
	next: Next,
) -> ClResult<Response<Body>> {
	let token = bearer_token(req.headers()).ok_or(Error::Unauthorized)?;
	let auth = validate_token(&app.opts.jwt_secret, token)?;

	req.extensions_mut().insert(Auth(auth));

	Ok(next.run(req).await)
}

pub async fn optional_auth(
	State(app): State<App>,
	mut req: Request<Body>,
	next: Next,
) -> ClResult<Response<Body>> {
	if let Some(token) = bearer_token(req.headers()) {
		match validate_token(&app.opts.jwt_secret, token) {
			Ok(auth) => {
				req.extensions_mut().insert(Auth(auth));
			}
			Err(err) => debug!("Ignoring invalid token: {}", err),
		}
	}

	Ok(next.run(req).await)
}

/// Attach a request id to the request extensions and the response headers
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response<Body> {
	let req_id = req
		.headers()
		.get("x-request-id")
		.and_then(|h| h.to_str().ok())
		.map(ToString::to_string)
		.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

	req.extensions_mut().insert(RequestId(req_id.clone()));
	let mut res = next.run(req).await;
	if let Ok(val) = HeaderValue::from_str(&req_id) {
		res.headers_mut().insert("x-request-id", val);
	}
	res
}

#[cfg(test)]
mod tests {
	use super::*;

	fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
		let mut map = HeaderMap::new();
		for (name, value) in pairs {
			if let Ok(val) = HeaderValue::from_str(value) {
				map.append(name.clone(), val);
			}
		}
		map
	}

	#[test]
	fn test_read_cookie() {
		let map = headers(&[(header::COOKIE, "a=1; token=abc; gl_flash=xyz")]);
		assert_eq!(read_cookie(&map, "token"), Some("abc"));
		assert_eq!(read_cookie(&map, "gl_flash"), Some("xyz"));
		assert_eq!(read_cookie(&map, "missing"), None);
	}

	#[test]
	fn test_bearer_header_wins_over_cookie() {
		let map = headers(&[
			(header::AUTHORIZATION, "Bearer from-header"),
			(header::COOKIE, "token=from-cookie"),
		]);
		assert_eq!(bearer_token(&map), Some("from-header"));

		let map = headers(&[(header::COOKIE, "token=from-cookie")]);
		assert_eq!(bearer_token(&map), Some("from-cookie"));
	}
}

// vim: ts=4
