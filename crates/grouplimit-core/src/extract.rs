//! Request extractors fed by the auth and request-id middleware

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::AuthCtx;
use crate::prelude::*;

/// Authenticated user; rejects with 401 when `require_auth` found no token
#[derive(Debug, Clone)]
pub struct Auth(pub AuthCtx);

impl<S: Send + Sync> FromRequestParts<S> for Auth {
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		parts.extensions.get::<Auth>().cloned().ok_or(Error::Unauthorized)
	}
}

/// Visitor who may or may not be logged in
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<AuthCtx>);

impl<S: Send + Sync> FromRequestParts<S> for OptionalAuth {
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		Ok(OptionalAuth(parts.extensions.get::<Auth>().map(|Auth(ctx)| ctx.clone())))
	}
}

#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Request id if the middleware assigned one
#[derive(Clone, Debug)]
pub struct OptionalRequestId(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for OptionalRequestId {
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		Ok(OptionalRequestId(parts.extensions.get::<RequestId>().map(|RequestId(id)| id.clone())))
	}
}

// vim: ts=4
