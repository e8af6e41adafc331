//! Reelgate Core - Subscription business logic
//!
//! Plan catalog, subscription ledger with lifecycle events, and the pure
//! access evaluator that gates streaming by quality tier and content
//! access level.

pub mod access;
pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod notify;

pub use catalog::PlanCatalog;
pub use config::LedgerConfig;
pub use error::{CoreError, FieldError};
pub use events::{LifecycleEvent, Recipient};
pub use ledger::{HistoryPage, SubscriptionLedger};
pub use notify::{run_dispatcher, LogMailer, Mailer, Notice, NotifyError};
