//! Subscription lifecycle types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{PlanId, UserId};

/// Unique subscription identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    /// Create a new random subscription ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a subscription ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SubscriptionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Subscription status
///
/// Transitions: active -> cancelled (manual) or active -> expired
/// (time-based). Expired and cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// Subscription is live
    Active,
    /// End date has passed
    Expired,
    /// Cancelled by the user
    Cancelled,
}

impl SubscriptionStatus {
    /// Canonical wire representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(StatusParseError(s.to_string())),
        }
    }
}

/// Error parsing a subscription status string
#[derive(Debug, Clone)]
pub struct StatusParseError(pub String);

impl std::fmt::Display for StatusParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid subscription status: {}", self.0)
    }
}

impl std::error::Error for StatusParseError {}

/// Synthetic payment reference recorded at subscribe time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Transaction reference
    pub transaction_id: String,
    /// Amount charged in cents
    pub amount_cents: i64,
    /// ISO currency code
    pub currency: String,
    /// Payment method label (e.g. "card")
    pub method: String,
    /// When the payment was recorded
    pub paid_at: DateTime<Utc>,
}

/// User subscription record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscription ID
    pub id: SubscriptionId,
    /// Owning user
    pub user_id: UserId,
    /// Plan subscribed to
    pub plan_id: PlanId,
    /// Stored status (see [`Subscription::is_entitled_at`] for the
    /// authoritative read-time predicate)
    pub status: SubscriptionStatus,
    /// Entitlement start
    pub start_date: DateTime<Utc>,
    /// Entitlement end (exclusive)
    pub end_date: DateTime<Utc>,
    /// Renew automatically at end of period
    pub auto_renew: bool,
    /// Created from a plan with a trial period
    pub is_trial: bool,
    /// Payment reference
    pub payment: PaymentRecord,
    /// Set only when cancelled
    pub cancelled_at: Option<DateTime<Utc>>,
    /// User-provided cancel reason
    pub cancel_reason: Option<String>,
    /// Whether the expiry warning notification was already sent
    pub expiry_notified: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    /// Whether this subscription grants entitlement at `now`.
    ///
    /// Expiry is lazy: a row may still carry `status=active` after its end
    /// date because no sweep has run, so the stored status alone is never
    /// trusted for access decisions. Cancelled subscriptions keep their
    /// entitlement until the end date (grace period).
    pub fn is_entitled_at(&self, now: DateTime<Utc>) -> bool {
        let status_ok = match self.status {
            SubscriptionStatus::Active => true,
            // Grace period: cancellation does not revoke access early
            SubscriptionStatus::Cancelled => true,
            SubscriptionStatus::Expired => false,
        };
        status_ok && self.start_date <= now && now < self.end_date
    }

    /// Days until the end date, clamped at zero
    pub fn days_left(&self, now: DateTime<Utc>) -> i64 {
        (self.end_date - now).num_days().max(0)
    }
}
