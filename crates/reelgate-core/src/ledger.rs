//! Subscription ledger
//!
//! Owns subscription lifecycle: subscribe, cancel, renew, history, and the
//! expiry-warning scan. Emits lifecycle events over an mpsc channel for
//! the notification dispatcher.

use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use reelgate_db::{CreateSubscription, DbError, PlanRepository, SubscriptionRepository};
use reelgate_types::{Plan, PlanId, Subscription};

use crate::config::LedgerConfig;
use crate::error::CoreError;
use crate::events::{LifecycleEvent, Recipient};

/// One page of subscription history, newest first
#[derive(Debug, Clone)]
pub struct HistoryPage {
    pub subscriptions: Vec<Subscription>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

/// Subscription ledger service
pub struct SubscriptionLedger<P: PlanRepository, S: SubscriptionRepository> {
    plans: Arc<P>,
    subscriptions: Arc<S>,
    events: mpsc::Sender<LifecycleEvent>,
    config: LedgerConfig,
}

impl<P: PlanRepository, S: SubscriptionRepository> Clone for SubscriptionLedger<P, S> {
    fn clone(&self) -> Self {
        Self {
            plans: Arc::clone(&self.plans),
            subscriptions: Arc::clone(&self.subscriptions),
            events: self.events.clone(),
            config: self.config.clone(),
        }
    }
}

impl<P: PlanRepository, S: SubscriptionRepository> SubscriptionLedger<P, S> {
    /// Create a new ledger
    pub fn new(
        plans: Arc<P>,
        subscriptions: Arc<S>,
        events: mpsc::Sender<LifecycleEvent>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            plans,
            subscriptions,
            events,
            config,
        }
    }

    /// Subscribe a user to a plan.
    ///
    /// Fails with `PlanNotFound` when the plan is missing or inactive and
    /// `DuplicateActiveSubscription` when the user already holds an active
    /// subscription. The duplicate check is the insert itself: the
    /// storage-level unique constraint turns concurrent subscribes into a
    /// conflict instead of two active rows.
    pub async fn subscribe(
        &self,
        recipient: Recipient,
        plan_id: PlanId,
        payment_method: &str,
        auto_renew: bool,
    ) -> Result<Subscription, CoreError> {
        let (subscription, plan) = self
            .create_subscription(&recipient, plan_id, payment_method, auto_renew)
            .await?;

        tracing::info!(
            user_id = %recipient.user_id,
            plan = %plan.name,
            subscription_id = %subscription.id,
            "subscription created"
        );

        self.publish(LifecycleEvent::Created {
            recipient,
            subscription: subscription.clone(),
            plan,
        })
        .await;

        Ok(subscription)
    }

    /// Renew after expiry or cancellation.
    ///
    /// Renewing while an active subscription exists is rejected; otherwise
    /// this is a fresh subscribe that emits `Renewed`.
    pub async fn renew(
        &self,
        recipient: Recipient,
        plan_id: PlanId,
        payment_method: &str,
        auto_renew: bool,
    ) -> Result<Subscription, CoreError> {
        if self.get_active(recipient.user_id).await?.is_some() {
            return Err(CoreError::DuplicateActiveSubscription);
        }

        let (subscription, plan) = self
            .create_subscription(&recipient, plan_id, payment_method, auto_renew)
            .await?;

        tracing::info!(
            user_id = %recipient.user_id,
            plan = %plan.name,
            "subscription renewed"
        );

        self.publish(LifecycleEvent::Renewed {
            recipient,
            subscription: subscription.clone(),
            plan,
        })
        .await;

        Ok(subscription)
    }

    /// Cancel the user's active subscription.
    ///
    /// Sets status=cancelled and disables auto-renew. Entitlement and
    /// device slots stay valid until the end date (grace period); live
    /// streaming sessions are not force-terminated.
    pub async fn cancel(
        &self,
        recipient: Recipient,
        reason: Option<&str>,
    ) -> Result<Subscription, CoreError> {
        let now = Utc::now();
        let row = self
            .subscriptions
            .find_active(recipient.user_id.0, now)
            .await?
            .ok_or(CoreError::NoActiveSubscription)?;

        let updated = self.subscriptions.cancel(row.id, reason, now).await?;
        if !updated {
            // Lost a race with another cancel
            return Err(CoreError::NoActiveSubscription);
        }

        let subscription = self
            .subscriptions
            .find_by_id(row.id)
            .await?
            .ok_or(CoreError::SubscriptionNotFound)?
            .into_subscription();

        tracing::info!(
            user_id = %recipient.user_id,
            subscription_id = %subscription.id,
            end_date = %subscription.end_date,
            "subscription cancelled"
        );

        self.publish(LifecycleEvent::Cancelled {
            recipient,
            subscription: subscription.clone(),
        })
        .await;

        Ok(subscription)
    }

    /// The user's active subscription right now, if any.
    ///
    /// Lazy expiry: the query evaluates the time predicate at read time,
    /// so a stale `active` status past its end date never grants access.
    pub async fn get_active(
        &self,
        user_id: reelgate_types::UserId,
    ) -> Result<Option<Subscription>, CoreError> {
        let row = self
            .subscriptions
            .find_active(user_id.0, Utc::now())
            .await?;

        Ok(row.map(|r| r.into_subscription()))
    }

    /// The subscription entitling the user to stream right now, if any.
    /// Unlike [`get_active`](Self::get_active) this includes a cancelled
    /// subscription still inside its paid period.
    pub async fn get_entitled(
        &self,
        user_id: reelgate_types::UserId,
    ) -> Result<Option<Subscription>, CoreError> {
        let row = self
            .subscriptions
            .find_entitled(user_id.0, Utc::now())
            .await?;

        Ok(row.map(|r| r.into_subscription()))
    }

    /// Page through a user's subscription history, newest first
    pub async fn history(
        &self,
        user_id: reelgate_types::UserId,
        page: i64,
        limit: i64,
    ) -> Result<HistoryPage, CoreError> {
        let page = page.max(1);
        let limit = limit.clamp(1, self.config.max_page_size);
        let offset = (page - 1) * limit;

        let rows = self.subscriptions.history(user_id.0, limit, offset).await?;
        let total = self.subscriptions.count_for_user(user_id.0).await?;

        Ok(HistoryPage {
            subscriptions: rows.into_iter().map(|r| r.into_subscription()).collect(),
            page,
            limit,
            total,
            pages: (total + limit - 1) / limit,
        })
    }

    /// One pass of the expiry-warning scan.
    ///
    /// Emits `Expiring` for active subscriptions ending within the warning
    /// window and flags them so the warning is sent once. Returns how many
    /// warnings were emitted.
    pub async fn run_expiry_scan(&self) -> Result<u64, CoreError> {
        let now = Utc::now();
        let until = now
            + ChronoDuration::from_std(self.config.expiry_warning)
                .unwrap_or_else(|_| ChronoDuration::days(3));

        let rows = self
            .subscriptions
            .find_expiring_unnotified(now, until)
            .await?;

        let mut sent = 0u64;
        for row in rows {
            self.subscriptions.mark_expiry_notified(row.id).await?;
            let subscription = row.into_subscription();
            let days_left = subscription.days_left(now);
            self.publish(LifecycleEvent::Expiring {
                recipient: Recipient::anonymous(subscription.user_id),
                subscription,
                days_left,
            })
            .await;
            sent += 1;
        }

        if sent > 0 {
            tracing::info!(count = sent, "expiry warnings emitted");
        }
        Ok(sent)
    }

    async fn create_subscription(
        &self,
        recipient: &Recipient,
        plan_id: PlanId,
        payment_method: &str,
        auto_renew: bool,
    ) -> Result<(Subscription, Plan), CoreError> {
        let plan = self
            .plans
            .find_by_id(plan_id.0)
            .await
            .map_err(|e| CoreError::Database(e.to_string()))?
            .ok_or(CoreError::PlanNotFound)?
            .into_plan();
        if !plan.active {
            return Err(CoreError::PlanNotFound);
        }

        let now = Utc::now();

        // Bookkeeping pass: a timed-out row still flagged active would
        // trip the unique constraint on a legitimate resubscribe.
        self.subscriptions
            .expire_overdue(recipient.user_id.0, now)
            .await?;

        let create = CreateSubscription {
            id: Uuid::new_v4(),
            user_id: recipient.user_id.0,
            plan_id: plan.id.0,
            start_date: now,
            end_date: now + ChronoDuration::days(i64::from(plan.duration_days)),
            auto_renew,
            is_trial: plan.trial_days > 0,
            payment_transaction_id: format!(
                "txn_{}_{}",
                now.timestamp_millis(),
                Uuid::new_v4().simple()
            ),
            payment_amount_cents: plan.price_cents,
            payment_currency: plan.currency.clone(),
            payment_method: payment_method.to_string(),
            payment_date: now,
        };

        let row = match self.subscriptions.create(create).await {
            Ok(row) => row,
            Err(DbError::Conflict) => return Err(CoreError::DuplicateActiveSubscription),
            Err(e) => return Err(CoreError::Database(e.to_string())),
        };

        Ok((row.into_subscription(), plan))
    }

    async fn publish(&self, event: LifecycleEvent) {
        let kind = event.kind();
        if self.events.send(event).await.is_err() {
            tracing::warn!(kind, "lifecycle event dropped: dispatcher gone");
        }
    }
}

impl<P: PlanRepository, S: SubscriptionRepository> std::fmt::Debug for SubscriptionLedger<P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionLedger")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
