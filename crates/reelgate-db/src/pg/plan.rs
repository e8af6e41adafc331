//! PostgreSQL plan repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::PlanRow;
use crate::repo::{CreatePlan, PlanRepository, UpdatePlan};

const PLAN_COLUMNS: &str = "id, name, description, price_cents, currency, duration_days, \
                            quality, access_level, max_devices, max_concurrent_streams, \
                            trial_days, active, created_at, updated_at";

/// PostgreSQL plan repository
#[derive(Clone)]
pub struct PgPlanRepository {
    pool: PgPool,
}

impl PgPlanRepository {
    /// Create a new plan repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanRepository for PgPlanRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PlanRow>> {
        let plan = sqlx::query_as::<_, PlanRow>(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plan)
    }

    async fn list_active(&self, quality: Option<&str>) -> DbResult<Vec<PlanRow>> {
        let plans = match quality {
            Some(q) => {
                sqlx::query_as::<_, PlanRow>(&format!(
                    "SELECT {PLAN_COLUMNS} FROM plans \
                     WHERE active AND quality = $1 \
                     ORDER BY price_cents ASC"
                ))
                .bind(q)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, PlanRow>(&format!(
                    "SELECT {PLAN_COLUMNS} FROM plans WHERE active ORDER BY price_cents ASC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(plans)
    }

    async fn create(&self, plan: CreatePlan) -> DbResult<PlanRow> {
        let row = sqlx::query_as::<_, PlanRow>(&format!(
            "INSERT INTO plans (id, name, description, price_cents, currency, duration_days, \
                                quality, access_level, max_devices, max_concurrent_streams, \
                                trial_days) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {PLAN_COLUMNS}"
        ))
        .bind(plan.id)
        .bind(&plan.name)
        .bind(&plan.description)
        .bind(plan.price_cents)
        .bind(&plan.currency)
        .bind(plan.duration_days)
        .bind(&plan.quality)
        .bind(&plan.access_level)
        .bind(plan.max_devices)
        .bind(plan.max_concurrent_streams)
        .bind(plan.trial_days)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update(&self, id: Uuid, update: UpdatePlan) -> DbResult<Option<PlanRow>> {
        let row = sqlx::query_as::<_, PlanRow>(&format!(
            "UPDATE plans SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                price_cents = COALESCE($4, price_cents), \
                duration_days = COALESCE($5, duration_days), \
                quality = COALESCE($6, quality), \
                access_level = COALESCE($7, access_level), \
                max_devices = COALESCE($8, max_devices), \
                max_concurrent_streams = COALESCE($9, max_concurrent_streams), \
                trial_days = COALESCE($10, trial_days), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {PLAN_COLUMNS}"
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(update.price_cents)
        .bind(update.duration_days)
        .bind(&update.quality)
        .bind(&update.access_level)
        .bind(update.max_devices)
        .bind(update.max_concurrent_streams)
        .bind(update.trial_days)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> DbResult<bool> {
        let result = sqlx::query("UPDATE plans SET active = $1, updated_at = NOW() WHERE id = $2")
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM plans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
