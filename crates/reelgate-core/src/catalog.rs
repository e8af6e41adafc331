//! Plan catalog service
//!
//! Admin CRUD over subscription plans plus cached plan lookups for the hot
//! streaming path. Plan mutation affects future reads only; in-flight
//! entitlement decisions read whatever the cache/database holds at
//! decision time.

use chrono::Utc;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use reelgate_db::{CreatePlan, PlanRepository, SubscriptionRepository, UpdatePlan};
use reelgate_types::{AccessLevel, Plan, PlanId, Quality};

use crate::error::{CoreError, FieldError};

/// Input for creating a plan
#[derive(Debug, Clone)]
pub struct NewPlan {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub currency: String,
    pub duration_days: i32,
    pub quality: Quality,
    pub access_level: AccessLevel,
    pub max_devices: i32,
    pub max_concurrent_streams: i32,
    pub trial_days: i32,
}

/// Partial plan update
#[derive(Debug, Clone, Default)]
pub struct PlanPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub duration_days: Option<i32>,
    pub quality: Option<Quality>,
    pub access_level: Option<AccessLevel>,
    pub max_devices: Option<i32>,
    pub max_concurrent_streams: Option<i32>,
    pub trial_days: Option<i32>,
}

/// Plan catalog service
pub struct PlanCatalog<P: PlanRepository, S: SubscriptionRepository> {
    plans: Arc<P>,
    subscriptions: Arc<S>,
    /// Cache of plan_id -> plan for the streaming path
    plan_cache: Cache<Uuid, Plan>,
}

impl<P: PlanRepository, S: SubscriptionRepository> PlanCatalog<P, S> {
    /// Create a new plan catalog
    pub fn new(plans: Arc<P>, subscriptions: Arc<S>) -> Self {
        Self {
            plans,
            subscriptions,
            plan_cache: Cache::builder()
                .time_to_live(Duration::from_secs(60))
                .max_capacity(1_000)
                .build(),
        }
    }

    /// Get a plan by ID (cached)
    pub async fn get_plan(&self, id: PlanId) -> Result<Plan, CoreError> {
        if let Some(plan) = self.plan_cache.get(&id.0).await {
            return Ok(plan);
        }

        let plan = self
            .plans
            .find_by_id(id.0)
            .await
            .map_err(db_err)?
            .ok_or(CoreError::PlanNotFound)?
            .into_plan();

        self.plan_cache.insert(id.0, plan.clone()).await;
        Ok(plan)
    }

    /// List active plans, cheapest first, optionally filtered by quality
    pub async fn list_active_plans(
        &self,
        quality: Option<Quality>,
    ) -> Result<Vec<Plan>, CoreError> {
        let rows = self
            .plans
            .list_active(quality.map(|q| q.as_str()))
            .await
            .map_err(db_err)?;

        Ok(rows.into_iter().map(|r| r.into_plan()).collect())
    }

    /// Create a plan (admin)
    pub async fn create_plan(&self, input: NewPlan) -> Result<Plan, CoreError> {
        validate_plan_fields(&input)?;

        let row = self
            .plans
            .create(CreatePlan {
                id: Uuid::new_v4(),
                name: input.name,
                description: input.description,
                price_cents: input.price_cents,
                currency: input.currency,
                duration_days: input.duration_days,
                quality: input.quality.as_str().to_string(),
                access_level: input.access_level.to_string(),
                max_devices: input.max_devices,
                max_concurrent_streams: input.max_concurrent_streams,
                trial_days: input.trial_days,
            })
            .await
            .map_err(db_err)?;

        Ok(row.into_plan())
    }

    /// Update a plan (admin). Affects future reads only.
    pub async fn update_plan(&self, id: PlanId, patch: PlanPatch) -> Result<Plan, CoreError> {
        let mut errors = Vec::new();
        if let Some(price) = patch.price_cents {
            if price < 0 {
                errors.push(FieldError::new("priceCents", "price must be >= 0"));
            }
        }
        if let Some(days) = patch.duration_days {
            if days < 1 {
                errors.push(FieldError::new("durationDays", "duration must be >= 1 day"));
            }
        }
        if !errors.is_empty() {
            return Err(CoreError::Validation(errors));
        }

        let row = self
            .plans
            .update(
                id.0,
                UpdatePlan {
                    name: patch.name,
                    description: patch.description,
                    price_cents: patch.price_cents,
                    duration_days: patch.duration_days,
                    quality: patch.quality.map(|q| q.as_str().to_string()),
                    access_level: patch.access_level.map(|l| l.to_string()),
                    max_devices: patch.max_devices,
                    max_concurrent_streams: patch.max_concurrent_streams,
                    trial_days: patch.trial_days,
                },
            )
            .await
            .map_err(db_err)?
            .ok_or(CoreError::PlanNotFound)?;

        self.plan_cache.invalidate(&id.0).await;
        Ok(row.into_plan())
    }

    /// Deactivate a plan (admin); existing subscriptions are untouched
    pub async fn deactivate_plan(&self, id: PlanId) -> Result<(), CoreError> {
        let found = self.plans.set_active(id.0, false).await.map_err(db_err)?;
        if !found {
            return Err(CoreError::PlanNotFound);
        }
        self.plan_cache.invalidate(&id.0).await;
        Ok(())
    }

    /// Delete a plan (admin). Rejected while active subscriptions
    /// reference it; those callers must deactivate instead.
    pub async fn delete_plan(&self, id: PlanId) -> Result<(), CoreError> {
        let in_use = self
            .subscriptions
            .count_active_for_plan(id.0, Utc::now())
            .await
            .map_err(db_err)?;
        if in_use > 0 {
            return Err(CoreError::PlanInUse(in_use));
        }

        let found = self.plans.delete(id.0).await.map_err(db_err)?;
        if !found {
            return Err(CoreError::PlanNotFound);
        }
        self.plan_cache.invalidate(&id.0).await;

        tracing::info!(plan_id = %id, "plan deleted");
        Ok(())
    }
}

fn validate_plan_fields(input: &NewPlan) -> Result<(), CoreError> {
    let mut errors = Vec::new();
    if input.name.trim().is_empty() {
        errors.push(FieldError::new("name", "name is required"));
    }
    if input.price_cents < 0 {
        errors.push(FieldError::new("priceCents", "price must be >= 0"));
    }
    if input.duration_days < 1 {
        errors.push(FieldError::new("durationDays", "duration must be >= 1 day"));
    }
    if input.max_devices < 1 {
        errors.push(FieldError::new("maxDevices", "at least one device"));
    }
    if input.max_concurrent_streams < 1 {
        errors.push(FieldError::new(
            "maxConcurrentStreams",
            "at least one concurrent stream",
        ));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(errors))
    }
}

fn db_err(err: reelgate_db::DbError) -> CoreError {
    match err {
        reelgate_db::DbError::NotFound => CoreError::PlanNotFound,
        other => {
            tracing::error!("database error: {}", other);
            CoreError::Database(other.to_string())
        }
    }
}

impl<P: PlanRepository, S: SubscriptionRepository> std::fmt::Debug for PlanCatalog<P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanCatalog").finish_non_exhaustive()
    }
}
