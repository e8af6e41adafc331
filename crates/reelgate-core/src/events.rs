//! Subscription lifecycle events
//!
//! The ledger publishes typed event values over an mpsc channel; the
//! notification dispatcher owns the receiving end. No shared mutable
//! emitter is involved.

use reelgate_types::{Plan, Subscription, UserId};

/// Who a lifecycle event concerns, with an optional delivery address
#[derive(Debug, Clone)]
pub struct Recipient {
    /// User the event concerns
    pub user_id: UserId,
    /// Notification address, when known (events without one are logged
    /// and skipped by the dispatcher)
    pub email: Option<String>,
}

impl Recipient {
    /// Create a recipient with an address
    pub fn new(user_id: UserId, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: Some(email.into()),
        }
    }

    /// Create a recipient without an address
    pub fn anonymous(user_id: UserId) -> Self {
        Self {
            user_id,
            email: None,
        }
    }
}

/// Subscription lifecycle event
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// A subscription was created
    Created {
        recipient: Recipient,
        subscription: Subscription,
        plan: Plan,
    },
    /// A subscription was cancelled (grace period until end date)
    Cancelled {
        recipient: Recipient,
        subscription: Subscription,
    },
    /// An expired/cancelled user subscribed again
    Renewed {
        recipient: Recipient,
        subscription: Subscription,
        plan: Plan,
    },
    /// An active subscription ends within the warning window
    Expiring {
        recipient: Recipient,
        subscription: Subscription,
        days_left: i64,
    },
}

impl LifecycleEvent {
    /// Short label for logging and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::Cancelled { .. } => "cancelled",
            Self::Renewed { .. } => "renewed",
            Self::Expiring { .. } => "expiring",
        }
    }

    /// The recipient of the event
    pub fn recipient(&self) -> &Recipient {
        match self {
            Self::Created { recipient, .. }
            | Self::Cancelled { recipient, .. }
            | Self::Renewed { recipient, .. }
            | Self::Expiring { recipient, .. } => recipient,
        }
    }
}
