//! Error type shared by all crates and adapters

use axum::{http::StatusCode, response::IntoResponse, Json};

pub type ClResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	NotFound,
	PermissionDenied,
	Unauthorized,
	DbError,
	Parse,
	/// The group store refused a join because the group is already full
	LimitReached,
	Conflict(String),
	ValidationError(String),
	ConfigError(String),
	Internal(String),

	// externals
	Io(std::io::Error),
}

impl Error {
	/// Stable error code used in JSON error responses
	pub fn code(&self) -> &'static str {
		match self {
			Error::NotFound => "E-NOT-FOUND",
			Error::PermissionDenied => "E-PERMISSION-DENIED",
			Error::Unauthorized => "E-UNAUTHORIZED",
			Error::DbError => "E-DB",
			Error::Parse => "E-PARSE",
			Error::LimitReached => "E-GROUP-FULL",
			Error::Conflict(_) => "E-CONFLICT",
			Error::ValidationError(_) => "E-VALIDATION",
			Error::ConfigError(_) | Error::Internal(_) | Error::Io(_) => "E-INTERNAL",
		}
	}

	pub fn status(&self) -> StatusCode {
		match self {
			Error::NotFound => StatusCode::NOT_FOUND,
			Error::PermissionDenied => StatusCode::FORBIDDEN,
			Error::Unauthorized => StatusCode::UNAUTHORIZED,
			Error::Parse | Error::ValidationError(_) => StatusCode::BAD_REQUEST,
			Error::LimitReached | Error::Conflict(_) => StatusCode::CONFLICT,
			Error::DbError | Error::ConfigError(_) | Error::Internal(_) | Error::Io(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Error::NotFound => write!(f, "not found"),
			Error::PermissionDenied => write!(f, "permission denied"),
			Error::Unauthorized => write!(f, "unauthorized"),
			Error::DbError => write!(f, "database error"),
			Error::Parse => write!(f, "parse error"),
			Error::LimitReached => write!(f, "group member limit reached"),
			Error::Conflict(msg) => write!(f, "conflict: {}", msg),
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::ConfigError(msg) => write!(f, "configuration error: {}", msg),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
			Error::Io(err) => write!(f, "io error: {}", err),
		}
	}
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		tracing::warn!("JSON error: {}", err);
		Self::Parse
	}
}

impl IntoResponse for Error {
	fn into_response(self) -> axum::response::Response {
		let status = self.status();
		// Internal details stay in the log
		let message = match &self {
			Error::ValidationError(msg) | Error::Conflict(msg) => msg.clone(),
			Error::DbError | Error::ConfigError(_) | Error::Internal(_) | Error::Io(_) => {
				tracing::error!("Internal error: {}", self);
				"Internal server error".to_string()
			}
			_ => self.to_string(),
		};
		let body = serde_json::json!({
			"error": {
				"code": self.code(),
				"message": message,
			}
		});
		(status, Json(body)).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_mapping() {
		assert_eq!(Error::NotFound.status(), StatusCode::NOT_FOUND);
		assert_eq!(Error::PermissionDenied.status(), StatusCode::FORBIDDEN);
		assert_eq!(Error::LimitReached.status(), StatusCode::CONFLICT);
		assert_eq!(
			Error::ValidationError("bad".into()).status(),
			StatusCode::BAD_REQUEST
		);
		assert_eq!(Error::DbError.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}

	#[test]
	fn test_codes_are_stable() {
		assert_eq!(Error::LimitReached.code(), "E-GROUP-FULL");
		assert_eq!(Error::Internal("x".into()).code(), "E-INTERNAL");
	}
}

// vim: ts=4
