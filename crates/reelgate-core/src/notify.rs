//! Notification dispatcher
//!
//! Consumes lifecycle events from the ledger's channel and hands them to
//! the messaging collaborator. Delivery is fire-and-forget: failures are
//! logged, never retried.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::events::{LifecycleEvent, Recipient};

/// Notification content
#[derive(Debug, Clone)]
pub struct Notice {
    pub subject: String,
    pub body: String,
}

/// Delivery error
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Messaging collaborator. Implementations own address resolution for the
/// recipient (the ledger only knows user ids and sometimes an email).
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a notification to the recipient
    async fn deliver(&self, to: &Recipient, notice: Notice) -> Result<(), NotifyError>;
}

/// Mailer that only logs, for local development and tests
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn deliver(&self, to: &Recipient, notice: Notice) -> Result<(), NotifyError> {
        tracing::info!(
            user_id = %to.user_id,
            email = to.email.as_deref().unwrap_or("-"),
            subject = %notice.subject,
            "notification delivered (log only)"
        );
        Ok(())
    }
}

/// Run the dispatcher until the event channel closes.
///
/// Spawned once at service startup; owning the receiver here keeps event
/// consumption off the request path.
pub async fn run_dispatcher<M: Mailer>(mut events: mpsc::Receiver<LifecycleEvent>, mailer: M) {
    while let Some(event) = events.recv().await {
        let kind = event.kind();
        let recipient = event.recipient().clone();
        let notice = render(&event);

        if let Err(e) = mailer.deliver(&recipient, notice).await {
            tracing::error!(kind, user_id = %recipient.user_id, "notification failed: {e}");
        }
    }
    tracing::debug!("lifecycle event channel closed, dispatcher exiting");
}

fn render(event: &LifecycleEvent) -> Notice {
    match event {
        LifecycleEvent::Created { subscription, plan, .. } => Notice {
            subject: format!("Welcome to the {} plan", plan.name),
            body: format!(
                "Your subscription is active from {} until {}.",
                subscription.start_date.format("%Y-%m-%d"),
                subscription.end_date.format("%Y-%m-%d"),
            ),
        },
        LifecycleEvent::Cancelled { subscription, .. } => Notice {
            subject: "Your subscription was cancelled".to_string(),
            body: format!(
                "You can keep watching until {}.",
                subscription.end_date.format("%Y-%m-%d"),
            ),
        },
        LifecycleEvent::Renewed { subscription, plan, .. } => Notice {
            subject: format!("Your {} plan was renewed", plan.name),
            body: format!(
                "The new period runs until {}.",
                subscription.end_date.format("%Y-%m-%d"),
            ),
        },
        LifecycleEvent::Expiring { subscription, days_left, .. } => Notice {
            subject: "Your subscription is expiring soon".to_string(),
            body: format!(
                "Your subscription ends on {} ({} days left).",
                subscription.end_date.format("%Y-%m-%d"),
                days_left,
            ),
        },
    }
}
