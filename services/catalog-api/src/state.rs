//! Application state for the Catalog API service.

use std::sync::Arc;

use reelgate_core::{PlanCatalog, SubscriptionLedger};
use reelgate_db::pg::{PgContentRepository, PgPlanRepository, PgSubscriptionRepository};
use reelgate_db::DbPool;
use reelgate_sessions::{RedisSessionStore, SessionRegistry};

use crate::auth::TokenVerifier;
use crate::config::Config;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Plan catalog (cached plan lookups, admin CRUD)
    pub catalog: Arc<PlanCatalog<PgPlanRepository, PgSubscriptionRepository>>,
    /// Subscription ledger (lifecycle, history, expiry scan)
    pub ledger: SubscriptionLedger<PgPlanRepository, PgSubscriptionRepository>,
    /// Streaming session registry
    pub sessions: SessionRegistry<RedisSessionStore>,
    /// Content lookups for the stream endpoint
    pub content: Arc<PgContentRepository>,
    /// Bearer token verification
    pub tokens: TokenVerifier,
    /// Database pool (readiness probe)
    pub pool: DbPool,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
