//! Session store abstraction and the redis implementation
//!
//! The registry talks to an expiring key-value store through the
//! [`SessionStore`] trait. Session payloads live at
//! `stream:session:{user}:{device}` and the per-user concurrent-device set
//! at `stream:devices:{user}`, both with the session TTL.

use async_trait::async_trait;
use redis::{AsyncCommands, Client, Script};
use std::time::Duration;
use uuid::Uuid;

use crate::error::SessionError;

const SESSION_KEY_PREFIX: &str = "stream:session";
const DEVICES_KEY_PREFIX: &str = "stream:devices";

/// Key holding the serialized session for (user, device)
pub fn session_key(user_id: Uuid, device_id: &str) -> String {
    format!("{SESSION_KEY_PREFIX}:{user_id}:{device_id}")
}

/// Key holding the user's concurrent-device set
pub fn devices_key(user_id: Uuid) -> String {
    format!("{DEVICES_KEY_PREFIX}:{user_id}")
}

/// Split a session key back into (user, device). Device ids are validated
/// at the API edge to contain no `:`, so the split is unambiguous.
pub fn parse_session_key(key: &str) -> Option<(Uuid, &str)> {
    let rest = key.strip_prefix(SESSION_KEY_PREFIX)?.strip_prefix(':')?;
    let (user, device) = rest.split_once(':')?;
    let user_id = Uuid::parse_str(user).ok()?;
    if device.is_empty() {
        return None;
    }
    Some((user_id, device))
}

/// Expiring key-value store with a per-user device set
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Atomically admit `device_id` into the user's device set and write
    /// the session payload, both with `ttl`. Returns `false` without
    /// writing anything when the set already holds `max_concurrent` other
    /// devices; a device already in the set re-admits without consuming a
    /// slot.
    async fn try_admit(
        &self,
        user_id: Uuid,
        device_id: &str,
        session_json: &str,
        max_concurrent: u32,
        ttl: Duration,
    ) -> Result<bool, SessionError>;

    /// Fetch a session payload by key
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Overwrite a session payload, refreshing its TTL
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionError>;

    /// Delete a session payload
    async fn delete(&self, key: &str) -> Result<(), SessionError>;

    /// Drop a device from the user's concurrent set
    async fn remove_device(&self, user_id: Uuid, device_id: &str) -> Result<(), SessionError>;

    /// All session keys belonging to one user
    async fn user_session_keys(&self, user_id: Uuid) -> Result<Vec<String>, SessionError>;

    /// All session keys in the store (system-wide sweep)
    async fn all_session_keys(&self) -> Result<Vec<String>, SessionError>;
}

// SISMEMBER before SCARD so a re-admitting device never counts against the
// ceiling. Runs as one script: two clients racing for the last slot cannot
// both pass the check.
const ADMIT_SCRIPT: &str = r#"
if redis.call('SISMEMBER', KEYS[1], ARGV[1]) == 0 then
  if redis.call('SCARD', KEYS[1]) >= tonumber(ARGV[2]) then
    return 0
  end
  redis.call('SADD', KEYS[1], ARGV[1])
end
redis.call('EXPIRE', KEYS[1], ARGV[3])
redis.call('SET', KEYS[2], ARGV[4], 'EX', ARGV[3])
return 1
"#;

/// Redis-backed session store
#[derive(Clone)]
pub struct RedisSessionStore {
    client: Client,
    admit: Script,
}

impl RedisSessionStore {
    /// Connect to redis and verify the connection with a probe read
    pub async fn new(addr: &str) -> Result<Self, SessionError> {
        let client = Client::open(addr)?;
        let store = Self {
            client,
            admit: Script::new(ADMIT_SCRIPT),
        };
        // check conn
        let mut conn = store.client.get_multiplexed_async_connection().await?;
        let _: Option<String> = conn.get(format!("{SESSION_KEY_PREFIX}:probe")).await?;
        Ok(store)
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, SessionError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let mut keys = Vec::new();
        let mut iter = conn.scan_match::<_, String>(pattern).await?;
        while let Some(key) = iter.next_item().await {
            keys.push(key);
        }
        Ok(keys)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn try_admit(
        &self,
        user_id: Uuid,
        device_id: &str,
        session_json: &str,
        max_concurrent: u32,
        ttl: Duration,
    ) -> Result<bool, SessionError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let admitted: i64 = self
            .admit
            .key(devices_key(user_id))
            .key(session_key(user_id, device_id))
            .arg(device_id)
            .arg(max_concurrent)
            .arg(ttl.as_secs().max(1))
            .arg(session_json)
            .invoke_async(&mut conn)
            .await?;
        Ok(admitted == 1)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(key, value, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), SessionError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: i64 = conn.del(key).await?;
        Ok(())
    }

    async fn remove_device(&self, user_id: Uuid, device_id: &str) -> Result<(), SessionError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: i64 = conn.srem(devices_key(user_id), device_id).await?;
        Ok(())
    }

    async fn user_session_keys(&self, user_id: Uuid) -> Result<Vec<String>, SessionError> {
        self.scan_keys(&format!("{SESSION_KEY_PREFIX}:{user_id}:*"))
            .await
    }

    async fn all_session_keys(&self) -> Result<Vec<String>, SessionError> {
        self.scan_keys(&format!("{SESSION_KEY_PREFIX}:*")).await
    }
}

impl std::fmt::Debug for RedisSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSessionStore").finish_non_exhaustive()
    }
}
