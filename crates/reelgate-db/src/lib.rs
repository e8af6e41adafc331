//! Reelgate DB - Database abstractions
//!
//! SQLx-based persistence layer for Reelgate services.
//!
//! # Example
//!
//! ```rust,ignore
//! use reelgate_db::{create_pool, PoolSettings, Repositories};
//!
//! let pool = create_pool("postgres://localhost/reelgate", PoolSettings::default()).await?;
//! let repos = Repositories::new(pool);
//!
//! let plan = repos.plans.find_by_id(plan_id).await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, DbPool, PoolSettings};
pub use repo::*;
