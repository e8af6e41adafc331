//! Reelgate Sessions - Streaming session registry
//!
//! Tracks live streaming sessions in an expiring key-value store and
//! enforces per-user concurrent-stream ceilings. The store is redis in
//! production; tests run against an in-memory implementation of the same
//! trait. Every record carries a TTL so an unreachable registry can never
//! leak sessions forever.

pub mod error;
pub mod registry;
pub mod store;
pub mod sweeper;

pub use error::SessionError;
pub use registry::{NewSession, SessionConfig, SessionRegistry, SessionStats};
pub use store::{devices_key, parse_session_key, session_key, RedisSessionStore, SessionStore};
pub use sweeper::run_sweeper;
