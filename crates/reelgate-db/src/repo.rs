//! Repository traits
//!
//! Async repository interfaces for database operations. Core services
//! depend on these traits so tests can substitute in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::{ContentRow, PlanRow, SubscriptionRow};

/// Plan repository trait
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Find a plan by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PlanRow>>;

    /// List active plans, cheapest first, optionally filtered by quality
    async fn list_active(&self, quality: Option<&str>) -> DbResult<Vec<PlanRow>>;

    /// Create a new plan
    async fn create(&self, plan: CreatePlan) -> DbResult<PlanRow>;

    /// Update plan fields (None leaves the column untouched)
    async fn update(&self, id: Uuid, update: UpdatePlan) -> DbResult<Option<PlanRow>>;

    /// Set the active flag
    async fn set_active(&self, id: Uuid, active: bool) -> DbResult<bool>;

    /// Delete a plan. Callers must check for live subscriptions first.
    async fn delete(&self, id: Uuid) -> DbResult<bool>;
}

/// Create plan input
#[derive(Debug, Clone)]
pub struct CreatePlan {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub currency: String,
    pub duration_days: i32,
    pub quality: String,
    pub access_level: String,
    pub max_devices: i32,
    pub max_concurrent_streams: i32,
    pub trial_days: i32,
}

/// Partial plan update input
#[derive(Debug, Clone, Default)]
pub struct UpdatePlan {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub duration_days: Option<i32>,
    pub quality: Option<String>,
    pub access_level: Option<String>,
    pub max_devices: Option<i32>,
    pub max_concurrent_streams: Option<i32>,
    pub trial_days: Option<i32>,
}

/// Subscription repository trait
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find a subscription by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// Find the user's active subscription at `now`:
    /// `status='active' AND start_date <= now < end_date`. Evaluated at
    /// read time so expiry needs no background job.
    async fn find_active(&self, user_id: Uuid, now: DateTime<Utc>)
        -> DbResult<Option<SubscriptionRow>>;

    /// Find the subscription that entitles the user at `now`. Unlike
    /// [`find_active`](Self::find_active) this includes cancelled rows
    /// still inside their paid period (grace period).
    async fn find_entitled(&self, user_id: Uuid, now: DateTime<Utc>)
        -> DbResult<Option<SubscriptionRow>>;

    /// Insert a new active subscription.
    ///
    /// Returns `DbError::Conflict` when the user already holds an active
    /// row; the partial unique index in the schema makes the check and the
    /// insert one atomic operation.
    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow>;

    /// Flip overdue active rows for this user to expired (bookkeeping
    /// only; entitlement reads never depend on it)
    async fn expire_overdue(&self, user_id: Uuid, now: DateTime<Utc>) -> DbResult<u64>;

    /// Mark a subscription cancelled
    async fn cancel(&self, id: Uuid, reason: Option<&str>, at: DateTime<Utc>) -> DbResult<bool>;

    /// Page through a user's subscriptions, newest first
    async fn history(&self, user_id: Uuid, limit: i64, offset: i64)
        -> DbResult<Vec<SubscriptionRow>>;

    /// Total subscriptions for a user (for pagination)
    async fn count_for_user(&self, user_id: Uuid) -> DbResult<i64>;

    /// Active subscriptions currently referencing a plan
    async fn count_active_for_plan(&self, plan_id: Uuid, now: DateTime<Utc>) -> DbResult<i64>;

    /// Active subscriptions ending within (now, until] that have not
    /// been sent an expiry warning yet
    async fn find_expiring_unnotified(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DbResult<Vec<SubscriptionRow>>;

    /// Set the expiry-notified flag so the warning is sent once
    async fn mark_expiry_notified(&self, id: Uuid) -> DbResult<()>;
}

/// Create subscription input
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub auto_renew: bool,
    pub is_trial: bool,
    pub payment_transaction_id: String,
    pub payment_amount_cents: i64,
    pub payment_currency: String,
    pub payment_method: String,
    pub payment_date: DateTime<Utc>,
}

/// Content repository trait (read-only; catalog CRUD is out of scope)
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Find a content item by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ContentRow>>;
}
