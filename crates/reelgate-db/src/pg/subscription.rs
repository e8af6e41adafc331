//! PostgreSQL subscription repository implementation
//!
//! The one-active-subscription-per-user invariant is enforced by the
//! partial unique index `ux_subscriptions_one_active` (see migrations), so
//! `create` is a single atomic insert rather than a check-then-insert pair.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::SubscriptionRow;
use crate::repo::{CreateSubscription, SubscriptionRepository};

const SUB_COLUMNS: &str = "id, user_id, plan_id, status, start_date, end_date, auto_renew, \
                           is_trial, payment_transaction_id, payment_amount_cents, \
                           payment_currency, payment_method, payment_date, cancelled_at, \
                           cancel_reason, expiry_notified, created_at";

/// PostgreSQL subscription repository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {SUB_COLUMNS} FROM subscriptions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn find_active(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> DbResult<Option<SubscriptionRow>> {
        // Time predicate evaluated here, not trusted from the stored status
        let sub = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {SUB_COLUMNS} FROM subscriptions \
             WHERE user_id = $1 AND status = 'active' \
               AND start_date <= $2 AND end_date > $2 \
             ORDER BY created_at DESC \
             LIMIT 1"
        ))
        .bind(user_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn find_entitled(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> DbResult<Option<SubscriptionRow>> {
        // Cancelled rows keep entitlement until the end date
        let sub = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {SUB_COLUMNS} FROM subscriptions \
             WHERE user_id = $1 AND status IN ('active', 'cancelled') \
               AND start_date <= $2 AND end_date > $2 \
             ORDER BY created_at DESC \
             LIMIT 1"
        ))
        .bind(user_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow> {
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "INSERT INTO subscriptions (id, user_id, plan_id, status, start_date, end_date, \
                                        auto_renew, is_trial, payment_transaction_id, \
                                        payment_amount_cents, payment_currency, payment_method, \
                                        payment_date) \
             VALUES ($1, $2, $3, 'active', $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {SUB_COLUMNS}"
        ))
        .bind(sub.id)
        .bind(sub.user_id)
        .bind(sub.plan_id)
        .bind(sub.start_date)
        .bind(sub.end_date)
        .bind(sub.auto_renew)
        .bind(sub.is_trial)
        .bind(&sub.payment_transaction_id)
        .bind(sub.payment_amount_cents)
        .bind(&sub.payment_currency)
        .bind(&sub.payment_method)
        .bind(sub.payment_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn expire_overdue(&self, user_id: Uuid, now: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query(
            "UPDATE subscriptions SET status = 'expired' \
             WHERE user_id = $1 AND status = 'active' AND end_date <= $2",
        )
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn cancel(&self, id: Uuid, reason: Option<&str>, at: DateTime<Utc>) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE subscriptions \
             SET status = 'cancelled', cancelled_at = $2, cancel_reason = $3, auto_renew = FALSE \
             WHERE id = $1 AND status = 'active'",
        )
        .bind(id)
        .bind(at)
        .bind(reason)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn history(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<SubscriptionRow>> {
        let subs = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {SUB_COLUMNS} FROM subscriptions \
             WHERE user_id = $1 \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(subs)
    }

    async fn count_for_user(&self, user_id: Uuid) -> DbResult<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.0)
    }

    async fn count_active_for_plan(&self, plan_id: Uuid, now: DateTime<Utc>) -> DbResult<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM subscriptions \
             WHERE plan_id = $1 AND status = 'active' AND end_date > $2",
        )
        .bind(plan_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    async fn find_expiring_unnotified(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DbResult<Vec<SubscriptionRow>> {
        let subs = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {SUB_COLUMNS} FROM subscriptions \
             WHERE status = 'active' AND NOT expiry_notified \
               AND end_date > $1 AND end_date <= $2 \
             ORDER BY end_date ASC"
        ))
        .bind(now)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;

        Ok(subs)
    }

    async fn mark_expiry_notified(&self, id: Uuid) -> DbResult<()> {
        sqlx::query("UPDATE subscriptions SET expiry_notified = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
