//! Session registry
//!
//! Admission, heartbeats, staleness cleanup and termination for streaming
//! sessions. The concurrent-stream ceiling is the caller's plan limit; the
//! registry only enforces it.

use chrono::{Duration as ChronoDuration, Utc};
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use reelgate_types::{ContentId, DeviceType, Quality, StreamTicket, StreamingSession, UserId};

use crate::error::SessionError;
use crate::store::{parse_session_key, SessionStore};

/// Registry tuning knobs
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Store TTL for session records and device sets
    pub session_ttl: Duration,
    /// Sessions silent for longer than this are stale
    pub staleness_window: Duration,
    /// Cadence of the system-wide stale sweep
    pub sweep_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(3600),
            staleness_window: Duration::from_secs(120),
            sweep_interval: Duration::from_secs(300),
        }
    }
}

/// Parameters for a new streaming session
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: UserId,
    pub content_id: ContentId,
    pub device_id: String,
    pub device_name: Option<String>,
    pub device_type: DeviceType,
    pub quality: Quality,
}

/// Registry-wide counters for monitoring
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub total_sessions: u64,
    pub sessions_per_user: HashMap<Uuid, u64>,
}

/// Streaming session registry over a [`SessionStore`]
pub struct SessionRegistry<S: SessionStore> {
    store: Arc<S>,
    config: SessionConfig,
}

impl<S: SessionStore> Clone for SessionRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: SessionStore> SessionRegistry<S> {
    /// Create a new registry
    pub fn new(store: Arc<S>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    /// Cadence for the background sweep task
    pub fn sweep_interval(&self) -> Duration {
        self.config.sweep_interval
    }

    /// Admit a new stream for (user, device), enforcing `max_concurrent`.
    ///
    /// The device-set check and the session write run atomically in the
    /// store, so racing admissions for the last slot admit exactly one.
    /// Re-admitting a device that already streams replaces its session
    /// without consuming a slot.
    pub async fn create_session(
        &self,
        new: NewSession,
        max_concurrent: u32,
    ) -> Result<StreamTicket, SessionError> {
        let now = Utc::now();
        let now_ms = now.timestamp_millis();

        let session = StreamingSession {
            session_id: format!("sess_{}_{}", now_ms, random_hex(8)),
            user_id: new.user_id,
            content_id: new.content_id,
            device_id: new.device_id,
            device_name: new
                .device_name
                .unwrap_or_else(|| "Unknown Device".to_string()),
            device_type: new.device_type,
            quality: new.quality,
            playback_position: None,
            started_at: now_ms,
            last_heartbeat: now_ms,
        };
        let payload = serde_json::to_string(&session)?;

        let admitted = self
            .store
            .try_admit(
                session.user_id.0,
                &session.device_id,
                &payload,
                max_concurrent,
                self.config.session_ttl,
            )
            .await?;
        if !admitted {
            return Err(SessionError::LimitExceeded {
                limit: max_concurrent,
            });
        }

        tracing::info!(
            session_id = %session.session_id,
            user_id = %session.user_id,
            device_id = %session.device_id,
            "session created"
        );

        Ok(StreamTicket {
            session_id: session.session_id,
            stream_token: random_hex(32),
            expires_at: now
                + ChronoDuration::from_std(self.config.session_ttl)
                    .unwrap_or_else(|_| ChronoDuration::hours(1)),
        })
    }

    /// Record a heartbeat for `session_id`, refreshing its TTL.
    ///
    /// Returns `false` when the session no longer exists; the client must
    /// request a new stream.
    pub async fn heartbeat(
        &self,
        user_id: UserId,
        session_id: &str,
        playback_position: Option<f64>,
    ) -> Result<bool, SessionError> {
        let now_ms = Utc::now().timestamp_millis();
        for key in self.store.user_session_keys(user_id.0).await? {
            let Some(mut session) = self.load(&key).await? else {
                continue;
            };
            if session.session_id != session_id {
                continue;
            }
            session.touch(now_ms, playback_position);
            let payload = serde_json::to_string(&session)?;
            self.store
                .put(&key, &payload, self.config.session_ttl)
                .await?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Sessions with a heartbeat inside the staleness window.
    ///
    /// Stale sessions found during the scan are terminated on the spot so
    /// their device slots free up without waiting for the sweep.
    pub async fn active_streams(
        &self,
        user_id: UserId,
    ) -> Result<Vec<StreamingSession>, SessionError> {
        let now_ms = Utc::now().timestamp_millis();
        let mut active = Vec::new();
        for key in self.store.user_session_keys(user_id.0).await? {
            let Some(session) = self.load(&key).await? else {
                continue;
            };
            if session.is_stale(now_ms, self.config.staleness_window) {
                self.remove(&key, user_id.0, &session.device_id).await?;
                tracing::debug!(
                    session_id = %session.session_id,
                    "stale session removed during scan"
                );
            } else {
                active.push(session);
            }
        }
        Ok(active)
    }

    /// Terminate one session. Idempotent: returns `false` when no session
    /// with that id exists.
    pub async fn terminate(
        &self,
        user_id: UserId,
        session_id: &str,
    ) -> Result<bool, SessionError> {
        for key in self.store.user_session_keys(user_id.0).await? {
            let Some(session) = self.load(&key).await? else {
                continue;
            };
            if session.session_id != session_id {
                continue;
            }
            self.remove(&key, user_id.0, &session.device_id).await?;
            tracing::info!(session_id, user_id = %user_id, "session terminated");
            return Ok(true);
        }
        Ok(false)
    }

    /// Terminate every session the user has, returning how many
    pub async fn terminate_all(&self, user_id: UserId) -> Result<u64, SessionError> {
        let mut terminated = 0u64;
        for key in self.store.user_session_keys(user_id.0).await? {
            match self.load(&key).await? {
                Some(session) => {
                    self.remove(&key, user_id.0, &session.device_id).await?;
                    terminated += 1;
                }
                // Unreadable payload, reclaim the slot from the key alone
                None => {
                    if let Some((user, device)) = parse_session_key(&key) {
                        self.remove(&key, user, device).await?;
                        terminated += 1;
                    }
                }
            }
        }
        Ok(terminated)
    }

    /// One pass of the system-wide stale sweep, returning how many
    /// sessions were removed. The store TTL is the backstop when the
    /// sweep itself cannot run.
    pub async fn cleanup_stale(&self) -> Result<u64, SessionError> {
        let now_ms = Utc::now().timestamp_millis();
        let mut cleaned = 0u64;
        for key in self.store.all_session_keys().await? {
            let stale_device = match self.load(&key).await? {
                Some(session) if session.is_stale(now_ms, self.config.staleness_window) => {
                    Some(session.device_id)
                }
                Some(_) => None,
                // Malformed payloads are stale by definition
                None => parse_session_key(&key).map(|(_, device)| device.to_string()),
            };
            if let Some(device_id) = stale_device {
                if let Some((user, _)) = parse_session_key(&key) {
                    self.remove(&key, user, &device_id).await?;
                    cleaned += 1;
                }
            }
        }
        Ok(cleaned)
    }

    /// Session counts for monitoring
    pub async fn stats(&self) -> Result<SessionStats, SessionError> {
        let mut stats = SessionStats::default();
        for key in self.store.all_session_keys().await? {
            if let Some((user, _)) = parse_session_key(&key) {
                stats.total_sessions += 1;
                *stats.sessions_per_user.entry(user).or_insert(0) += 1;
            }
        }
        Ok(stats)
    }

    /// Read and parse a session payload. Corrupt payloads read as absent.
    async fn load(&self, key: &str) -> Result<Option<StreamingSession>, SessionError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(key, error = %e, "unreadable session payload");
                Ok(None)
            }
        }
    }

    async fn remove(&self, key: &str, user: Uuid, device_id: &str) -> Result<(), SessionError> {
        self.store.remove_device(user, device_id).await?;
        self.store.delete(key).await?;
        Ok(())
    }
}

impl<S: SessionStore> std::fmt::Debug for SessionRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_hex_length_and_uniqueness() {
        let a = random_hex(32);
        let b = random_hex(32);
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }

    #[test]
    fn test_default_config_windows() {
        let config = SessionConfig::default();
        assert!(config.staleness_window < config.session_ttl);
        assert!(config.sweep_interval >= config.staleness_window);
    }
}
