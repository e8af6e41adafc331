//! Session registry behavior tests
//!
//! Run against the in-memory store, which mirrors the redis store's
//! atomic admission.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::MemorySessionStore;
use reelgate_sessions::{
    session_key, NewSession, SessionConfig, SessionError, SessionRegistry, SessionStore,
};
use reelgate_types::{ContentId, DeviceType, Quality, UserId};

fn registry(store: Arc<MemorySessionStore>) -> SessionRegistry<MemorySessionStore> {
    SessionRegistry::new(store, SessionConfig::default())
}

fn new_session(user_id: UserId, device_id: &str) -> NewSession {
    NewSession {
        user_id,
        content_id: ContentId::new(),
        device_id: device_id.to_string(),
        device_name: Some(format!("{device_id} player")),
        device_type: DeviceType::Tv,
        quality: Quality::Hd,
    }
}

/// Rewind a session's heartbeat so it reads as stale
async fn age_session(store: &MemorySessionStore, user_id: UserId, device_id: &str, by_ms: i64) {
    let key = session_key(user_id.0, device_id);
    let raw = store.get(&key).await.unwrap().expect("session exists");
    let mut session: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let heartbeat = session["last_heartbeat"].as_i64().unwrap();
    session["last_heartbeat"] = serde_json::Value::from(heartbeat - by_ms);
    store
        .put(&key, &session.to_string(), Duration::from_secs(3600))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_admits_up_to_limit_and_rejects_overflow() {
    let store = Arc::new(MemorySessionStore::new());
    let registry = registry(Arc::clone(&store));
    let user = UserId::new();

    for device in ["dev-a", "dev-b", "dev-c"] {
        registry
            .create_session(new_session(user, device), 3)
            .await
            .expect("within limit");
    }

    let err = registry
        .create_session(new_session(user, "dev-d"), 3)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::LimitExceeded { limit: 3 }));
    assert_eq!(store.device_count(user.0), 3);
}

#[tokio::test]
async fn test_same_device_readmits_without_consuming_slot() {
    let store = Arc::new(MemorySessionStore::new());
    let registry = registry(Arc::clone(&store));
    let user = UserId::new();

    registry
        .create_session(new_session(user, "dev-a"), 1)
        .await
        .unwrap();
    // Same device again: replaces the session, still one slot
    registry
        .create_session(new_session(user, "dev-a"), 1)
        .await
        .expect("re-admission does not consume a slot");
    assert_eq!(store.device_count(user.0), 1);

    let err = registry
        .create_session(new_session(user, "dev-b"), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::LimitExceeded { limit: 1 }));
}

#[tokio::test]
async fn test_terminate_frees_exactly_one_slot() {
    let store = Arc::new(MemorySessionStore::new());
    let registry = registry(Arc::clone(&store));
    let user = UserId::new();

    let ticket_a = registry
        .create_session(new_session(user, "dev-a"), 2)
        .await
        .unwrap();
    registry
        .create_session(new_session(user, "dev-b"), 2)
        .await
        .unwrap();

    // Third device rejected at the ceiling
    assert!(registry
        .create_session(new_session(user, "dev-c"), 2)
        .await
        .is_err());

    // Terminating one stream makes room for exactly one more
    assert!(registry.terminate(user, &ticket_a.session_id).await.unwrap());
    registry
        .create_session(new_session(user, "dev-c"), 2)
        .await
        .expect("slot freed by terminate");
    assert!(registry
        .create_session(new_session(user, "dev-d"), 2)
        .await
        .is_err());
}

#[tokio::test]
async fn test_terminate_is_idempotent() {
    let store = Arc::new(MemorySessionStore::new());
    let registry = registry(store);
    let user = UserId::new();

    let ticket = registry
        .create_session(new_session(user, "dev-a"), 2)
        .await
        .unwrap();

    assert!(registry.terminate(user, &ticket.session_id).await.unwrap());
    assert!(!registry.terminate(user, &ticket.session_id).await.unwrap());
    assert!(!registry.terminate(user, "sess_never_existed").await.unwrap());
}

#[tokio::test]
async fn test_heartbeat_refreshes_and_reports_missing_sessions() {
    let store = Arc::new(MemorySessionStore::new());
    let registry = registry(Arc::clone(&store));
    let user = UserId::new();

    let ticket = registry
        .create_session(new_session(user, "dev-a"), 2)
        .await
        .unwrap();

    assert!(registry
        .heartbeat(user, &ticket.session_id, Some(42.5))
        .await
        .unwrap());

    // Position survives in the stored payload
    let raw = store
        .get(&session_key(user.0, "dev-a"))
        .await
        .unwrap()
        .unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored["playback_position"].as_f64(), Some(42.5));

    // Unknown session: client must request a new stream
    assert!(!registry.heartbeat(user, "sess_gone", None).await.unwrap());

    registry.terminate(user, &ticket.session_id).await.unwrap();
    assert!(!registry
        .heartbeat(user, &ticket.session_id, None)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_stale_sessions_hidden_and_slot_reclaimed() {
    let store = Arc::new(MemorySessionStore::new());
    let registry = registry(Arc::clone(&store));
    let user = UserId::new();

    registry
        .create_session(new_session(user, "dev-a"), 2)
        .await
        .unwrap();
    registry
        .create_session(new_session(user, "dev-b"), 2)
        .await
        .unwrap();

    // dev-a goes silent past the 2 minute window
    age_session(&store, user, "dev-a", 180_000).await;

    let active = registry.active_streams(user).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].device_id, "dev-b");

    // The scan terminated the stale session, freeing its slot
    assert_eq!(store.device_count(user.0), 1);
    registry
        .create_session(new_session(user, "dev-c"), 2)
        .await
        .expect("stale slot reclaimed");
}

#[tokio::test]
async fn test_cleanup_stale_sweeps_across_users() {
    let store = Arc::new(MemorySessionStore::new());
    let registry = registry(Arc::clone(&store));
    let alice = UserId::new();
    let bob = UserId::new();

    registry
        .create_session(new_session(alice, "dev-a"), 2)
        .await
        .unwrap();
    registry
        .create_session(new_session(bob, "dev-b"), 2)
        .await
        .unwrap();
    registry
        .create_session(new_session(bob, "dev-c"), 2)
        .await
        .unwrap();

    age_session(&store, alice, "dev-a", 180_000).await;
    age_session(&store, bob, "dev-c", 180_000).await;

    let cleaned = registry.cleanup_stale().await.unwrap();
    assert_eq!(cleaned, 2);

    assert!(registry.active_streams(alice).await.unwrap().is_empty());
    let bob_active = registry.active_streams(bob).await.unwrap();
    assert_eq!(bob_active.len(), 1);
    assert_eq!(bob_active[0].device_id, "dev-b");

    // Second sweep finds nothing
    assert_eq!(registry.cleanup_stale().await.unwrap(), 0);
}

#[tokio::test]
async fn test_terminate_all_counts_sessions() {
    let store = Arc::new(MemorySessionStore::new());
    let registry = registry(Arc::clone(&store));
    let user = UserId::new();
    let other = UserId::new();

    for device in ["dev-a", "dev-b"] {
        registry
            .create_session(new_session(user, device), 4)
            .await
            .unwrap();
    }
    registry
        .create_session(new_session(other, "dev-z"), 4)
        .await
        .unwrap();

    assert_eq!(registry.terminate_all(user).await.unwrap(), 2);
    assert_eq!(registry.terminate_all(user).await.unwrap(), 0);
    assert_eq!(store.device_count(user.0), 0);

    // Other users untouched
    assert_eq!(registry.active_streams(other).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_stats_counts_per_user() {
    let store = Arc::new(MemorySessionStore::new());
    let registry = registry(store);
    let alice = UserId::new();
    let bob = UserId::new();

    registry
        .create_session(new_session(alice, "dev-a"), 4)
        .await
        .unwrap();
    registry
        .create_session(new_session(bob, "dev-b"), 4)
        .await
        .unwrap();
    registry
        .create_session(new_session(bob, "dev-c"), 4)
        .await
        .unwrap();

    let stats = registry.stats().await.unwrap();
    assert_eq!(stats.total_sessions, 3);
    assert_eq!(stats.sessions_per_user.get(&alice.0), Some(&1));
    assert_eq!(stats.sessions_per_user.get(&bob.0), Some(&2));
}

#[tokio::test]
async fn test_racing_admissions_fill_exactly_one_slot() {
    let store = Arc::new(MemorySessionStore::new());
    let registry = registry(Arc::clone(&store));
    let user = UserId::new();

    let mut handles = Vec::new();
    for i in 0..8 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            registry
                .create_session(new_session(user, &format!("dev-{i}")), 1)
                .await
        }));
    }

    let mut admitted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(SessionError::LimitExceeded { .. }) => rejected += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(admitted, 1);
    assert_eq!(rejected, 7);
    assert_eq!(store.device_count(user.0), 1);
}

#[tokio::test]
async fn test_ticket_shape() {
    let store = Arc::new(MemorySessionStore::new());
    let registry = registry(store);
    let user = UserId::new();

    let before = Utc::now();
    let ticket = registry
        .create_session(new_session(user, "dev-a"), 2)
        .await
        .unwrap();

    assert!(ticket.session_id.starts_with("sess_"));
    // 32 random bytes, hex encoded
    assert_eq!(ticket.stream_token.len(), 64);
    assert!(ticket.expires_at > before + chrono::Duration::minutes(59));
}
