//! PostgreSQL repository implementations

mod content;
mod plan;
mod subscription;

pub use content::PgContentRepository;
pub use plan::PgPlanRepository;
pub use subscription::PgSubscriptionRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub plans: PgPlanRepository,
    pub subscriptions: PgSubscriptionRepository,
    pub content: PgContentRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            plans: PgPlanRepository::new(pool.clone()),
            subscriptions: PgSubscriptionRepository::new(pool.clone()),
            content: PgContentRepository::new(pool),
        }
    }
}
