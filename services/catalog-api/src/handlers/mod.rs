//! REST API handlers

pub mod content;
pub mod health;
pub mod plans;
pub mod subscriptions;

pub use content::*;
pub use health::*;
pub use plans::*;
pub use subscriptions::*;

use serde::Serialize;

/// Success response envelope: `{"success": true, "data": ...}`
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    /// Wrap a payload
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    /// Wrap a payload with a human-readable message
    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
        }
    }
}
