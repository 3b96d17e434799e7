use uuid::Uuid;

use crate::db::error::{DbError, DbResult};

/// Parse a UUID string from the database, returning a DbError on failure
pub fn parse_uuid(s: &str) -> DbResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| DbError::Internal(format!("Invalid UUID in database: {}", e)))
}

/// Parse a stored enum value (anything with a `FromStr<Err = String>`).
pub fn parse_enum<T>(column: &str, s: &str) -> DbResult<T>
where
    T: std::str::FromStr<Err = String>,
{
    s.parse()
        .map_err(|e| DbError::Internal(format!("Invalid {} in database: {}", column, e)))
}

/// Map a unique-constraint violation to `Conflict`, anything else to `Sqlx`.
pub fn map_unique_violation(e: sqlx::Error, message: impl FnOnce() -> String) -> DbError {
    match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            DbError::Conflict(message())
        }
        _ => DbError::from(e),
    }
}
