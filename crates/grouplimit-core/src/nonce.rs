//! Action nonces guarding state-changing requests
//!
//! A nonce is an HMAC-SHA256 over the action name, the user id and the
//! current tick, truncated and base64 encoded. A tick is half of the nonce
//! lifetime, and nonces from the current and the previous tick are accepted.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::prelude::*;

type HmacSha256 = Hmac<Sha256>;

/// Nonce lifetime in seconds
pub const NONCE_LIFE: i64 = 86400;
const NONCE_BYTES: usize = 12;

pub struct NonceService {
	secret: Box<[u8]>,
}

impl std::fmt::Debug for NonceService {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("NonceService").finish_non_exhaustive()
	}
}

impl NonceService {
	pub fn new(secret: &str) -> ClResult<Self> {
		if secret.is_empty() {
			return Err(Error::ConfigError("Nonce secret must not be empty".into()));
		}
		Ok(Self { secret: secret.as_bytes().into() })
	}

	fn tick_at(ts: Timestamp) -> i64 {
		ts.0.div_euclid(NONCE_LIFE / 2)
	}

	fn mac(&self, action: &str, user_id: UserId, tick: i64) -> ClResult<HmacSha256> {
		let mut mac = HmacSha256::new_from_slice(&self.secret)
			.map_err(|_| Error::Internal("Invalid nonce key".into()))?;
		mac.update(action.as_bytes());
		mac.update(b"|");
		mac.update(user_id.0.to_string().as_bytes());
		mac.update(b"|");
		mac.update(tick.to_string().as_bytes());
		Ok(mac)
	}

	pub fn create_at(&self, action: &str, user_id: UserId, now: Timestamp) -> ClResult<String> {
		let tag = self.mac(action, user_id, Self::tick_at(now))?.finalize().into_bytes();
		Ok(URL_SAFE_NO_PAD.encode(&tag[..NONCE_BYTES]))
	}

	pub fn create(&self, action: &str, user_id: UserId) -> ClResult<String> {
		self.create_at(action, user_id, Timestamp::now())
	}

	pub fn verify_at(&self, nonce: &str, action: &str, user_id: UserId, now: Timestamp) -> bool {
		let Ok(tag) = URL_SAFE_NO_PAD.decode(nonce.as_bytes()) else {
			return false;
		};
		if tag.len() != NONCE_BYTES {
			return false;
		}
		let tick = Self::tick_at(now);
		[tick, tick - 1].into_iter().any(|t| {
			self.mac(action, user_id, t).is_ok_and(|mac| mac.verify_truncated_left(&tag).is_ok())
		})
	}

	pub fn verify(&self, nonce: &str, action: &str, user_id: UserId) -> bool {
		let ok = self.verify_at(nonce, action, user_id, Timestamp::now());
		if !ok {
			warn!(action = %action, user_id = %user_id, "Nonce verification failed");
		}
		ok
	}

	/// Verify and turn failure into `PermissionDenied`
	pub fn check(&self, nonce: Option<&str>, action: &str, user_id: UserId) -> ClResult<()> {
		match nonce {
			Some(nonce) if self.verify(nonce, action, user_id) => Ok(()),
			_ => Err(Error::PermissionDenied),
		}
	}
}


// vim: ts=4
