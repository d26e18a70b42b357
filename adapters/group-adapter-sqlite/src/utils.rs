//! Utility functions for database operations

use sqlx::sqlite::SqliteRow;

use grouplimit_types::prelude::*;

/// Log database errors
pub(crate) fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

/// Map a query result to a value using a closure
pub(crate) fn map_res<T, F>(row: Result<SqliteRow, sqlx::Error>, f: F) -> ClResult<T>
where
	F: FnOnce(&SqliteRow) -> Result<T, sqlx::Error>,
{
	match row {
		Ok(ref row) => f(row).inspect_err(inspect).map_err(|_| Error::DbError),
		Err(sqlx::Error::RowNotFound) => Err(Error::NotFound),
		Err(err) => {
			inspect(&err);
			Err(Error::DbError)
		}
	}
}

/// Convert a stored counter, clamping corrupt negative values to zero
pub(crate) fn to_count(value: i64) -> u32 {
	u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

// vim: ts=4
