//! Database errors

use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    /// Record not found
    #[error("record not found")]
    NotFound,

    /// Unique constraint violated (e.g. a second active subscription)
    #[error("unique constraint violated")]
    Conflict,
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::Conflict;
            }
        }
        Self::Sqlx(err)
    }
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;
