//! In-memory session store for testing
//!
//! Mirrors the redis store's atomicity: `try_admit` runs the device-set
//! check and the session write under one lock, the way the Lua script
//! executes as a single unit. TTLs are ignored; tests drive staleness
//! through heartbeat timestamps instead.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use reelgate_sessions::{session_key, SessionError, SessionStore};

#[derive(Default, Clone)]
pub struct MemorySessionStore {
    sessions: Arc<DashMap<String, String>>,
    devices: Arc<Mutex<HashMap<Uuid, HashSet<String>>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of devices currently holding a slot for `user_id`
    #[allow(dead_code)]
    pub fn device_count(&self, user_id: Uuid) -> usize {
        self.devices
            .lock()
            .unwrap()
            .get(&user_id)
            .map_or(0, |set| set.len())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn try_admit(
        &self,
        user_id: Uuid,
        device_id: &str,
        session_json: &str,
        max_concurrent: u32,
        _ttl: Duration,
    ) -> Result<bool, SessionError> {
        let mut devices = self.devices.lock().unwrap();
        let set = devices.entry(user_id).or_default();
        if !set.contains(device_id) {
            if set.len() >= max_concurrent as usize {
                return Ok(false);
            }
            set.insert(device_id.to_string());
        }
        self.sessions
            .insert(session_key(user_id, device_id), session_json.to_string());
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.sessions.get(key).map(|v| v.value().clone()))
    }

    async fn put(&self, key: &str, value: &str, _ttl: Duration) -> Result<(), SessionError> {
        self.sessions.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), SessionError> {
        self.sessions.remove(key);
        Ok(())
    }

    async fn remove_device(&self, user_id: Uuid, device_id: &str) -> Result<(), SessionError> {
        if let Some(set) = self.devices.lock().unwrap().get_mut(&user_id) {
            set.remove(device_id);
        }
        Ok(())
    }

    async fn user_session_keys(&self, user_id: Uuid) -> Result<Vec<String>, SessionError> {
        let prefix = format!("stream:session:{user_id}:");
        Ok(self
            .sessions
            .iter()
            .map(|e| e.key().clone())
            .filter(|k| k.starts_with(&prefix))
            .collect())
    }

    async fn all_session_keys(&self) -> Result<Vec<String>, SessionError> {
        Ok(self.sessions.iter().map(|e| e.key().clone()).collect())
    }
}
