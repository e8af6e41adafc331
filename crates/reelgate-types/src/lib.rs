//! Reelgate Types - Shared domain types
//!
//! This crate contains domain types used across Reelgate services:
//! - User identity and roles
//! - Subscription plans, quality tiers and content access levels
//! - Subscription lifecycle records
//! - Streaming session records

pub mod content;
pub mod plan;
pub mod session;
pub mod subscription;
pub mod user;

pub use content::*;
pub use plan::*;
pub use session::*;
pub use subscription::*;
pub use user::*;
