//! Streaming session types
//!
//! Sessions are ephemeral records keyed by (user, device) and stored in an
//! expiring key-value store, not the database. Timestamps are unix millis
//! so the serialized form stays compact and comparable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{ContentId, Quality, UserId};

/// Device category reported by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
    Tv,
    Console,
    Other,
}

impl Default for DeviceType {
    fn default() -> Self {
        Self::Other
    }
}

impl std::str::FromStr for DeviceType {
    type Err = std::convert::Infallible;

    // Unknown device types fold into Other rather than failing
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "mobile" | "phone" => Self::Mobile,
            "tablet" => Self::Tablet,
            "desktop" | "web" => Self::Desktop,
            "tv" | "smarttv" => Self::Tv,
            "console" => Self::Console,
            _ => Self::Other,
        })
    }
}

/// Live streaming session record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingSession {
    /// Session identifier (opaque string)
    pub session_id: String,
    /// Owning user
    pub user_id: UserId,
    /// Content being streamed
    pub content_id: ContentId,
    /// Client-supplied device identifier
    pub device_id: String,
    /// Display name of the device
    pub device_name: String,
    /// Device category
    pub device_type: DeviceType,
    /// Quality admitted for this stream
    pub quality: Quality,
    /// Last reported playback position in seconds
    pub playback_position: Option<f64>,
    /// Start time, unix millis
    pub started_at: i64,
    /// Last heartbeat time, unix millis
    pub last_heartbeat: i64,
}

impl StreamingSession {
    /// Whether the session has gone silent for longer than `window`
    pub fn is_stale(&self, now_ms: i64, window: Duration) -> bool {
        now_ms - self.last_heartbeat > window.as_millis() as i64
    }

    /// Refresh the heartbeat timestamp and optionally playback position
    pub fn touch(&mut self, now_ms: i64, playback_position: Option<f64>) {
        self.last_heartbeat = now_ms;
        if playback_position.is_some() {
            self.playback_position = playback_position;
        }
    }
}

/// Ticket returned to a client when a stream is admitted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamTicket {
    /// Session identifier for heartbeats/termination
    pub session_id: String,
    /// Opaque bearer token for the stream edge
    pub stream_token: String,
    /// When the session expires without heartbeats
    pub expires_at: DateTime<Utc>,
}
