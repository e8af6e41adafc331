//! Property-based tests for the access evaluator
//!
//! These pin the ordering properties the streaming gate relies on:
//! - Quality and access-level checks are monotonic over the tier order
//! - Upgrading a plan never loses a capability
//! - Entitlement follows the time predicate, not the stored status alone

use chrono::{Duration, Utc};
use proptest::prelude::*;

use reelgate_core::access::{can_access_level, can_access_quality, is_entitled};
use reelgate_types::{
    AccessLevel, PaymentRecord, Plan, PlanId, Quality, Subscription, SubscriptionId,
    SubscriptionStatus, UserId,
};

// ============================================================================
// Strategies
// ============================================================================

fn arb_quality() -> impl Strategy<Value = Quality> {
    prop_oneof![Just(Quality::Sd), Just(Quality::Hd), Just(Quality::Uhd)]
}

fn arb_access_level() -> impl Strategy<Value = AccessLevel> {
    prop_oneof![
        Just(AccessLevel::Free),
        Just(AccessLevel::Basic),
        Just(AccessLevel::Premium),
        Just(AccessLevel::Ultimate),
    ]
}

fn arb_status() -> impl Strategy<Value = SubscriptionStatus> {
    prop_oneof![
        Just(SubscriptionStatus::Active),
        Just(SubscriptionStatus::Cancelled),
        Just(SubscriptionStatus::Expired),
    ]
}

fn plan_with(quality: Quality, access_level: AccessLevel) -> Plan {
    let now = Utc::now();
    Plan {
        id: PlanId::new(),
        name: "Prop".to_string(),
        description: String::new(),
        price_cents: 999,
        currency: "USD".to_string(),
        duration_days: 30,
        quality,
        access_level,
        max_devices: 2,
        max_concurrent_streams: 2,
        trial_days: 0,
        active: true,
        created_at: now,
        updated_at: now,
    }
}

fn subscription_with(status: SubscriptionStatus, start_offset: i64, end_offset: i64) -> Subscription {
    let now = Utc::now();
    Subscription {
        id: SubscriptionId::new(),
        user_id: UserId::new(),
        plan_id: PlanId::new(),
        status,
        start_date: now + Duration::days(start_offset),
        end_date: now + Duration::days(end_offset),
        auto_renew: true,
        is_trial: false,
        payment: PaymentRecord {
            transaction_id: "txn_prop".to_string(),
            amount_cents: 999,
            currency: "USD".to_string(),
            method: "card".to_string(),
            paid_at: now,
        },
        cancelled_at: None,
        cancel_reason: None,
        expiry_notified: false,
        created_at: now,
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// The quality gate is exactly the rank comparison
    #[test]
    fn prop_quality_gate_matches_rank(plan_q in arb_quality(), requested in arb_quality()) {
        let plan = plan_with(plan_q, AccessLevel::Free);
        prop_assert_eq!(
            can_access_quality(&plan, requested),
            plan_q.rank() >= requested.rank()
        );
    }

    /// The access-level gate is exactly the rank comparison
    #[test]
    fn prop_level_gate_matches_rank(plan_l in arb_access_level(), content_l in arb_access_level()) {
        let plan = plan_with(Quality::Sd, plan_l);
        prop_assert_eq!(
            can_access_level(&plan, content_l),
            plan_l.rank() >= content_l.rank()
        );
    }

    /// Upgrading a plan tier never loses a quality capability
    #[test]
    fn prop_quality_upgrade_is_monotone(
        low in arb_quality(),
        high in arb_quality(),
        requested in arb_quality(),
    ) {
        prop_assume!(low <= high);
        let low_plan = plan_with(low, AccessLevel::Free);
        let high_plan = plan_with(high, AccessLevel::Free);
        if can_access_quality(&low_plan, requested) {
            prop_assert!(can_access_quality(&high_plan, requested));
        }
    }

    /// Upgrading an access level never loses a content capability
    #[test]
    fn prop_level_upgrade_is_monotone(
        low in arb_access_level(),
        high in arb_access_level(),
        content in arb_access_level(),
    ) {
        prop_assume!(low <= high);
        let low_plan = plan_with(Quality::Sd, low);
        let high_plan = plan_with(Quality::Sd, high);
        if can_access_level(&low_plan, content) {
            prop_assert!(can_access_level(&high_plan, content));
        }
    }

    /// The quality and access-level axes never influence each other
    #[test]
    fn prop_axes_are_independent(
        q1 in arb_quality(),
        q2 in arb_quality(),
        level in arb_access_level(),
        content in arb_access_level(),
    ) {
        let a = plan_with(q1, level);
        let b = plan_with(q2, level);
        prop_assert_eq!(can_access_level(&a, content), can_access_level(&b, content));
    }

    /// Entitlement requires being inside the paid period, whatever the
    /// stored status says
    #[test]
    fn prop_entitlement_needs_time_window(
        status in arb_status(),
        start_offset in -60i64..60,
        duration in 1i64..90,
    ) {
        let sub = subscription_with(status, start_offset, start_offset + duration);
        let now = Utc::now();
        let in_window = sub.start_date <= now && now < sub.end_date;
        if !in_window {
            prop_assert!(!is_entitled(Some(&sub), now));
        }
    }

    /// Expired status never grants entitlement, even inside the window
    #[test]
    fn prop_expired_status_never_entitles(
        start_offset in -60i64..0,
        duration in 61i64..120,
    ) {
        let sub = subscription_with(SubscriptionStatus::Expired, start_offset, start_offset + duration);
        prop_assert!(!is_entitled(Some(&sub), Utc::now()));
    }

    /// Cancelled status keeps entitlement inside the paid window
    #[test]
    fn prop_cancelled_keeps_grace_period(
        start_offset in -60i64..0,
        duration in 61i64..120,
    ) {
        let sub = subscription_with(SubscriptionStatus::Cancelled, start_offset, start_offset + duration);
        prop_assert!(is_entitled(Some(&sub), Utc::now()));
    }
}
