//! Access evaluator
//!
//! Pure decision logic over the ordered quality and access-level enums.
//! Every check is a total-order comparison, so a higher plan tier always
//! implies every capability of a lower one (no capability matrix).

use chrono::{DateTime, Utc};

use reelgate_types::{AccessLevel, Plan, Quality, Subscription};

/// True iff the plan's quality tier covers the requested quality
pub fn can_access_quality(plan: &Plan, requested: Quality) -> bool {
    plan.quality >= requested
}

/// True iff the plan's access level covers the content's access level
pub fn can_access_level(plan: &Plan, content_level: AccessLevel) -> bool {
    plan.access_level >= content_level
}

/// Coarse gate: does any entitling subscription exist at `now`?
///
/// Uses the read-time predicate, never the stored status alone.
pub fn is_entitled(subscription: Option<&Subscription>, now: DateTime<Utc>) -> bool {
    subscription.is_some_and(|s| s.is_entitled_at(now))
}
