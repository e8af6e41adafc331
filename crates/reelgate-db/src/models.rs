//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.
//! Enum-valued columns are stored as text; conversions into domain types
//! fall back to the most restrictive value when a row carries an unknown
//! label, mirroring how access decisions should fail safe.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use reelgate_types::{
    AccessLevel, Content, ContentId, PaymentRecord, Plan, PlanId, Quality, Subscription,
    SubscriptionId, SubscriptionStatus, UserId,
};

/// Plan row from the database
#[derive(Debug, Clone, FromRow)]
pub struct PlanRow {
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
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlanRow {
    /// Convert to the domain plan type
    pub fn into_plan(self) -> Plan {
        Plan {
            id: PlanId(self.id),
            name: self.name,
            description: self.description,
            price_cents: self.price_cents,
            currency: self.currency,
            duration_days: self.duration_days,
            quality: self.quality.parse().unwrap_or(Quality::Sd),
            access_level: self.access_level.parse().unwrap_or(AccessLevel::Free),
            max_devices: self.max_devices,
            max_concurrent_streams: self.max_concurrent_streams,
            trial_days: self.trial_days,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Subscription row from the database
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub status: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub auto_renew: bool,
    pub is_trial: bool,
    pub payment_transaction_id: String,
    pub payment_amount_cents: i64,
    pub payment_currency: String,
    pub payment_method: String,
    pub payment_date: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub expiry_notified: bool,
    pub created_at: DateTime<Utc>,
}

impl SubscriptionRow {
    /// Convert to the domain subscription type
    pub fn into_subscription(self) -> Subscription {
        Subscription {
            id: SubscriptionId(self.id),
            user_id: UserId(self.user_id),
            plan_id: PlanId(self.plan_id),
            status: self.status.parse().unwrap_or(SubscriptionStatus::Expired),
            start_date: self.start_date,
            end_date: self.end_date,
            auto_renew: self.auto_renew,
            is_trial: self.is_trial,
            payment: PaymentRecord {
                transaction_id: self.payment_transaction_id,
                amount_cents: self.payment_amount_cents,
                currency: self.payment_currency,
                method: self.payment_method,
                paid_at: self.payment_date,
            },
            cancelled_at: self.cancelled_at,
            cancel_reason: self.cancel_reason,
            expiry_notified: self.expiry_notified,
            created_at: self.created_at,
        }
    }
}

/// Content row from the database
#[derive(Debug, Clone, FromRow)]
pub struct ContentRow {
    pub id: Uuid,
    pub title: String,
    pub access_level: String,
    pub stream_url: String,
    pub active: bool,
}

impl ContentRow {
    /// Convert to the domain content type.
    ///
    /// Unknown access labels fall back to Ultimate so malformed rows can
    /// never widen access.
    pub fn into_content(self) -> Content {
        Content {
            id: ContentId(self.id),
            title: self.title,
            access_level: self.access_level.parse().unwrap_or(AccessLevel::Ultimate),
            stream_url: self.stream_url,
            active: self.active,
        }
    }
}
