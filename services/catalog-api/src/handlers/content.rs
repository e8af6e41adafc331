//! Streaming access handlers
//!
//! The admission pipeline runs entitlement, quality, and access-level
//! checks in order, then hands off to the session registry which enforces
//! the device limit atomically.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

use reelgate_core::{access, CoreError};
use reelgate_db::ContentRepository;
use reelgate_sessions::NewSession;
use reelgate_types::{ContentId, DeviceType, StreamingSession};

use crate::error::{ApiError, ApiResult};
use crate::extractors::AuthUser;
use crate::handlers::plans::parse_quality;
use crate::handlers::Envelope;
use crate::state::AppState;

/// Device ids become part of the session key scheme, which uses `:` as a
/// separator, so a colon in the id would corrupt key parsing.
const MAX_DEVICE_ID_LENGTH: usize = 128;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRequest {
    pub device_id: String,
    pub device_name: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    pub quality: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamResponse {
    pub session_id: String,
    pub stream_token: String,
    pub stream_url: String,
    pub quality: String,
    pub expires_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    pub session_id: String,
    pub playback_position: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct HeartbeatResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSummary {
    pub session_id: String,
    pub content_id: String,
    pub device_id: String,
    pub device_name: String,
    pub device_type: DeviceType,
    pub quality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback_position: Option<f64>,
    pub started_at: i64,
    pub last_heartbeat: i64,
}

impl From<StreamingSession> for StreamSummary {
    fn from(session: StreamingSession) -> Self {
        Self {
            session_id: session.session_id,
            content_id: session.content_id.0.to_string(),
            device_id: session.device_id,
            device_name: session.device_name,
            device_type: session.device_type,
            quality: session.quality.as_str().to_string(),
            playback_position: session.playback_position,
            started_at: session.started_at,
            last_heartbeat: session.last_heartbeat,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActiveStreamsResponse {
    pub streams: Vec<StreamSummary>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct TerminateResponse {
    pub terminated: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/content/{id}/stream
pub async fn request_stream(
    State(state): State<AppState>,
    user: AuthUser,
    Path(content_id): Path<Uuid>,
    Json(req): Json<StreamRequest>,
) -> ApiResult<Json<Envelope<StreamResponse>>> {
    let start = Instant::now();
    validate_device_id(&req.device_id)?;

    let content = state
        .content
        .find_by_id(content_id)
        .await
        .map_err(CoreError::from)?
        .filter(|row| row.active)
        .ok_or(CoreError::ContentNotFound)?
        .into_content();

    // Entitlement covers the grace period: a cancelled subscription still
    // inside its paid window admits streams.
    let subscription = state
        .ledger
        .get_entitled(user.user_id)
        .await?
        .ok_or(CoreError::SubscriptionRequired)?;
    let plan = state.catalog.get_plan(subscription.plan_id).await?;

    let requested = match req.quality.as_deref() {
        Some(s) => parse_quality(s)?,
        None => plan.quality,
    };
    if !access::can_access_quality(&plan, requested) {
        return Err(CoreError::QualityNotAllowed(requested).into());
    }
    if !access::can_access_level(&plan, content.access_level) {
        return Err(CoreError::AccessLevelNotAllowed(content.access_level).into());
    }

    let device_type = req
        .device_type
        .as_deref()
        .map(|s| s.parse().unwrap_or_default())
        .unwrap_or_default();

    let ticket = state
        .sessions
        .create_session(
            NewSession {
                user_id: user.user_id,
                content_id: ContentId(content_id),
                device_id: req.device_id,
                device_name: req.device_name,
                device_type,
                quality: requested,
            },
            plan.max_concurrent_streams.max(0) as u32,
        )
        .await?;

    metrics::counter!("streams_admitted_total").increment(1);
    metrics::histogram!("catalog_operation_duration_seconds", "operation" => "request_stream")
        .record(start.elapsed().as_secs_f64());

    Ok(Json(Envelope::ok(StreamResponse {
        session_id: ticket.session_id,
        stream_token: ticket.stream_token,
        stream_url: content.stream_url,
        quality: requested.as_str().to_string(),
        expires_at: ticket.expires_at.to_rfc3339(),
    })))
}

/// POST /api/v1/content/stream/heartbeat
///
/// `status` is `"expired"` when the session is gone; the client responds
/// by requesting a new stream.
pub async fn stream_heartbeat(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<HeartbeatRequest>,
) -> ApiResult<Json<Envelope<HeartbeatResponse>>> {
    let alive = state
        .sessions
        .heartbeat(user.user_id, &req.session_id, req.playback_position)
        .await?;

    Ok(Json(Envelope::ok(HeartbeatResponse {
        status: if alive { "active" } else { "expired" },
    })))
}

/// GET /api/v1/content/streams/active
pub async fn active_streams(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Envelope<ActiveStreamsResponse>>> {
    let streams: Vec<StreamSummary> = state
        .sessions
        .active_streams(user.user_id)
        .await?
        .into_iter()
        .map(StreamSummary::from)
        .collect();

    let count = streams.len();
    Ok(Json(Envelope::ok(ActiveStreamsResponse { streams, count })))
}

/// DELETE /api/v1/content/stream/{session_id}
pub async fn terminate_stream(
    State(state): State<AppState>,
    user: AuthUser,
    Path(session_id): Path<String>,
) -> ApiResult<Json<Envelope<TerminateResponse>>> {
    let terminated = state.sessions.terminate(user.user_id, &session_id).await?;

    Ok(Json(Envelope::ok(TerminateResponse { terminated })))
}

/// Reject device ids that are empty, oversized, or unsafe for the session
/// key scheme.
pub(crate) fn validate_device_id(device_id: &str) -> Result<(), ApiError> {
    if device_id.trim().is_empty() {
        return Err(ApiError::BadRequest("deviceId is required".to_string()));
    }
    if device_id.len() > MAX_DEVICE_ID_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "deviceId must be at most {MAX_DEVICE_ID_LENGTH} characters"
        )));
    }
    if device_id
        .chars()
        .any(|c| c == ':' || c.is_whitespace() || c.is_control())
    {
        return Err(ApiError::BadRequest(
            "deviceId contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_device_ids() {
        for id in ["tv-livingroom", "a1b2c3d4", "iPhone_15.pro"] {
            assert!(validate_device_id(id).is_ok(), "rejected {id}");
        }
    }

    #[test]
    fn rejects_colon_in_device_id() {
        assert!(validate_device_id("tv:livingroom").is_err());
    }

    #[test]
    fn rejects_empty_and_oversized_ids() {
        assert!(validate_device_id("").is_err());
        assert!(validate_device_id("   ").is_err());
        assert!(validate_device_id(&"x".repeat(129)).is_err());
    }
}
