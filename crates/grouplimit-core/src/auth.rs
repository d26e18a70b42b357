//! Access tokens and the authenticated user context

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Role that bypasses membership limits and may change site settings
pub const SUPER_ADMIN_ROLE: &str = "SADM";

pub const ACCESS_TOKEN_EXPIRY: i64 = 3600 * 8;

/// Access token claims
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AccessClaims {
	pub sub: u32,
	/// Comma-separated roles
	pub r: Option<String>,
	pub exp: i64,
}

/// Context struct for an authenticated user
#[derive(Clone, Debug)]
pub struct AuthCtx {
	pub user_id: UserId,
	pub roles: Box<[Box<str>]>,
}

impl AuthCtx {
	pub fn has_role(&self, role: &str) -> bool {
		self.roles.iter().any(|r| r.as_ref() == role)
	}

	pub fn is_super_admin(&self) -> bool {
		self.has_role(SUPER_ADMIN_ROLE)
	}
}

pub fn issue_token(secret: &str, user_id: UserId, roles: &[&str]) -> ClResult<String> {
	let claims = AccessClaims {
		sub: user_id.0,
		r: if roles.is_empty() { None } else { Some(roles.join(",")) },
		exp: Timestamp::now().add_seconds(ACCESS_TOKEN_EXPIRY).0,
	};
	encode(
		&Header::new(Algorithm::HS256),
		&claims,
		&EncodingKey::from_secret(secret.as_bytes()),
	)
	.map_err(|e| Error::Internal(format!("Failed to sign token: {}", e)))
}

pub fn validate_token(secret: &str, token: &str) -> ClResult<AuthCtx> {
	let token_data = decode::<AccessClaims>(
		token,
		&DecodingKey::from_secret(secret.as_bytes()),
		&Validation::new(Algorithm::HS256),
	)
	.map_err(|e| {
		debug!("Token rejected: {}", e);
		Error::Unauthorized
	})?;

	let roles = token_data
		.claims
		.r
		.as_deref()
		.unwrap_or_default()
		.split(',')
		.map(str::trim)
		.filter(|r| !r.is_empty())
		.map(Box::from)
		.collect();

	Ok(AuthCtx { user_id: UserId(token_data.claims.sub), roles })
}


// vim: ts=4
