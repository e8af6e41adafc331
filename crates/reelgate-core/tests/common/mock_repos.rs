//! Mock repositories for testing
//!
//! In-memory fakes of the database repositories. The subscription mock
//! serializes `create` behind a lock so the one-active-row constraint
//! holds under concurrency, the way the partial unique index does in
//! Postgres.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use reelgate_db::{
    CreatePlan, CreateSubscription, DbError, DbResult, PlanRepository, PlanRow,
    SubscriptionRepository, SubscriptionRow, UpdatePlan,
};

/// In-memory plan repository for testing
#[derive(Default, Clone)]
pub struct MockPlanRepository {
    plans: Arc<DashMap<Uuid, PlanRow>>,
}

impl MockPlanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a test plan directly
    pub fn insert_plan(&self, plan: PlanRow) {
        self.plans.insert(plan.id, plan);
    }

    /// A plan row with sane defaults
    pub fn make_plan(quality: &str, access_level: &str, max_concurrent_streams: i32) -> PlanRow {
        PlanRow {
            id: Uuid::new_v4(),
            name: format!("{access_level} {quality}"),
            description: "test plan".to_string(),
            price_cents: 999,
            currency: "USD".to_string(),
            duration_days: 30,
            quality: quality.to_string(),
            access_level: access_level.to_string(),
            max_devices: 4,
            max_concurrent_streams,
            trial_days: 0,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[async_trait]
impl PlanRepository for MockPlanRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PlanRow>> {
        Ok(self.plans.get(&id).map(|r| r.value().clone()))
    }

    async fn list_active(&self, quality: Option<&str>) -> DbResult<Vec<PlanRow>> {
        let mut rows: Vec<PlanRow> = self
            .plans
            .iter()
            .map(|r| r.value().clone())
            .filter(|p| p.active)
            .filter(|p| quality.map_or(true, |q| p.quality == q))
            .collect();
        rows.sort_by_key(|p| p.price_cents);
        Ok(rows)
    }

    async fn create(&self, plan: CreatePlan) -> DbResult<PlanRow> {
        let row = PlanRow {
            id: plan.id,
            name: plan.name,
            description: plan.description,
            price_cents: plan.price_cents,
            currency: plan.currency,
            duration_days: plan.duration_days,
            quality: plan.quality,
            access_level: plan.access_level,
            max_devices: plan.max_devices,
            max_concurrent_streams: plan.max_concurrent_streams,
            trial_days: plan.trial_days,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.plans.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, update: UpdatePlan) -> DbResult<Option<PlanRow>> {
        let Some(mut row) = self.plans.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            row.name = name;
        }
        if let Some(description) = update.description {
            row.description = description;
        }
        if let Some(price) = update.price_cents {
            row.price_cents = price;
        }
        if let Some(days) = update.duration_days {
            row.duration_days = days;
        }
        if let Some(quality) = update.quality {
            row.quality = quality;
        }
        if let Some(level) = update.access_level {
            row.access_level = level;
        }
        if let Some(devices) = update.max_devices {
            row.max_devices = devices;
        }
        if let Some(streams) = update.max_concurrent_streams {
            row.max_concurrent_streams = streams;
        }
        if let Some(trial) = update.trial_days {
            row.trial_days = trial;
        }
        row.updated_at = Utc::now();
        Ok(Some(row.value().clone()))
    }

    async fn set_active(&self, id: Uuid, active: bool) -> DbResult<bool> {
        match self.plans.get_mut(&id) {
            Some(mut row) => {
                row.active = active;
                row.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> DbResult<bool> {
        Ok(self.plans.remove(&id).is_some())
    }
}

/// In-memory subscription repository for testing
#[derive(Default, Clone)]
pub struct MockSubscriptionRepository {
    subscriptions: Arc<DashMap<Uuid, SubscriptionRow>>,
    // Serializes create so the one-active-row check is atomic
    create_lock: Arc<Mutex<()>>,
}

impl MockSubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a subscription row directly
    pub fn insert_subscription(&self, row: SubscriptionRow) {
        self.subscriptions.insert(row.id, row);
    }

    /// A subscription row with sane defaults
    pub fn make_subscription(
        user_id: Uuid,
        plan_id: Uuid,
        status: &str,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> SubscriptionRow {
        SubscriptionRow {
            id: Uuid::new_v4(),
            user_id,
            plan_id,
            status: status.to_string(),
            start_date,
            end_date,
            auto_renew: true,
            is_trial: false,
            payment_transaction_id: format!("txn_test_{}", Uuid::new_v4().simple()),
            payment_amount_cents: 999,
            payment_currency: "USD".to_string(),
            payment_method: "credit_card".to_string(),
            payment_date: start_date,
            cancelled_at: None,
            cancel_reason: None,
            expiry_notified: false,
            created_at: start_date,
        }
    }

    /// Fetch a row by id for assertions
    #[allow(dead_code)]
    pub fn get(&self, id: Uuid) -> Option<SubscriptionRow> {
        self.subscriptions.get(&id).map(|r| r.value().clone())
    }
}

fn in_period(row: &SubscriptionRow, now: DateTime<Utc>) -> bool {
    row.start_date <= now && now < row.end_date
}

#[async_trait]
impl SubscriptionRepository for MockSubscriptionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        Ok(self.subscriptions.get(&id).map(|r| r.value().clone()))
    }

    async fn find_active(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> DbResult<Option<SubscriptionRow>> {
        Ok(self
            .subscriptions
            .iter()
            .map(|r| r.value().clone())
            .filter(|s| s.user_id == user_id && s.status == "active" && in_period(s, now))
            .max_by_key(|s| s.created_at))
    }

    async fn find_entitled(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> DbResult<Option<SubscriptionRow>> {
        Ok(self
            .subscriptions
            .iter()
            .map(|r| r.value().clone())
            .filter(|s| {
                s.user_id == user_id
                    && (s.status == "active" || s.status == "cancelled")
                    && in_period(s, now)
            })
            .max_by_key(|s| s.created_at))
    }

    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow> {
        let _guard = self.create_lock.lock().unwrap();
        // The partial unique index cares only about status, not dates
        let conflict = self
            .subscriptions
            .iter()
            .any(|r| r.value().user_id == sub.user_id && r.value().status == "active");
        if conflict {
            return Err(DbError::Conflict);
        }
        let row = SubscriptionRow {
            id: sub.id,
            user_id: sub.user_id,
            plan_id: sub.plan_id,
            status: "active".to_string(),
            start_date: sub.start_date,
            end_date: sub.end_date,
            auto_renew: sub.auto_renew,
            is_trial: sub.is_trial,
            payment_transaction_id: sub.payment_transaction_id,
            payment_amount_cents: sub.payment_amount_cents,
            payment_currency: sub.payment_currency,
            payment_method: sub.payment_method,
            payment_date: sub.payment_date,
            cancelled_at: None,
            cancel_reason: None,
            expiry_notified: false,
            created_at: Utc::now(),
        };
        self.subscriptions.insert(row.id, row.clone());
        Ok(row)
    }

    async fn expire_overdue(&self, user_id: Uuid, now: DateTime<Utc>) -> DbResult<u64> {
        let _guard = self.create_lock.lock().unwrap();
        let mut flipped = 0u64;
        for mut row in self.subscriptions.iter_mut() {
            if row.user_id == user_id && row.status == "active" && row.end_date <= now {
                row.status = "expired".to_string();
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    async fn cancel(&self, id: Uuid, reason: Option<&str>, at: DateTime<Utc>) -> DbResult<bool> {
        match self.subscriptions.get_mut(&id) {
            Some(mut row) if row.status == "active" => {
                row.status = "cancelled".to_string();
                row.cancelled_at = Some(at);
                row.cancel_reason = reason.map(String::from);
                row.auto_renew = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn history(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<SubscriptionRow>> {
        let mut rows: Vec<SubscriptionRow> = self
            .subscriptions
            .iter()
            .map(|r| r.value().clone())
            .filter(|s| s.user_id == user_id)
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_for_user(&self, user_id: Uuid) -> DbResult<i64> {
        Ok(self
            .subscriptions
            .iter()
            .filter(|r| r.value().user_id == user_id)
            .count() as i64)
    }

    async fn count_active_for_plan(&self, plan_id: Uuid, now: DateTime<Utc>) -> DbResult<i64> {
        Ok(self
            .subscriptions
            .iter()
            .filter(|r| {
                let s = r.value();
                s.plan_id == plan_id && s.status == "active" && in_period(s, now)
            })
            .count() as i64)
    }

    async fn find_expiring_unnotified(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DbResult<Vec<SubscriptionRow>> {
        Ok(self
            .subscriptions
            .iter()
            .map(|r| r.value().clone())
            .filter(|s| {
                s.status == "active" && !s.expiry_notified && now < s.end_date && s.end_date <= until
            })
            .collect())
    }

    async fn mark_expiry_notified(&self, id: Uuid) -> DbResult<()> {
        if let Some(mut row) = self.subscriptions.get_mut(&id) {
            row.expiry_notified = true;
        }
        Ok(())
    }
}
