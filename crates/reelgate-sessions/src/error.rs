//! Session registry errors

use thiserror::Error;

/// Session registry errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// Concurrent-stream ceiling reached
    #[error("maximum concurrent streams reached ({limit})")]
    LimitExceeded { limit: u32 },

    /// Store failure. Admission fails closed: an unreachable store denies
    /// new streams rather than admitting unbounded ones.
    #[error("session store error: {0}")]
    Store(String),
}

impl SessionError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::LimitExceeded { .. } => 403,
            Self::Store(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::LimitExceeded { .. } => "CONCURRENT_LIMIT_EXCEEDED",
            Self::Store(_) => "SESSION_STORE_ERROR",
        }
    }
}

impl From<redis::RedisError> for SessionError {
    fn from(err: redis::RedisError) -> Self {
        tracing::error!("redis error: {}", err);
        Self::Store(err.to_string())
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Store(format!("session payload: {err}"))
    }
}
