//! Core errors

use serde::Serialize;
use thiserror::Error;

/// Field-level validation failure
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    /// Field name as it appears in the API payload
    pub field: &'static str,
    /// Human-readable message
    pub message: String,
}

impl FieldError {
    /// Create a new field error
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Core business-logic errors
#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed or missing input
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// Plan does not exist or is inactive
    #[error("subscription plan not found or inactive")]
    PlanNotFound,

    /// Subscription does not exist
    #[error("subscription not found")]
    SubscriptionNotFound,

    /// Content item does not exist or is inactive
    #[error("content not found")]
    ContentNotFound,

    /// User already holds an active subscription
    #[error("user already has an active subscription")]
    DuplicateActiveSubscription,

    /// No active subscription to operate on
    #[error("no active subscription found")]
    NoActiveSubscription,

    /// Plan still referenced by active subscriptions
    #[error("plan has {0} active subscriptions; deactivate it instead")]
    PlanInUse(i64),

    /// No entitlement at all (coarse gate)
    #[error("an active subscription is required")]
    SubscriptionRequired,

    /// Plan quality tier below the requested quality
    #[error("subscription plan with {0} quality required")]
    QualityNotAllowed(reelgate_types::Quality),

    /// Plan access level below the content's access level
    #[error("subscription plan with {0} access required")]
    AccessLevelNotAllowed(reelgate_types::AccessLevel),

    /// Storage failure
    #[error("database error: {0}")]
    Database(String),
}

impl CoreError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::DuplicateActiveSubscription => 400,
            Self::PlanNotFound
            | Self::SubscriptionNotFound
            | Self::ContentNotFound
            | Self::NoActiveSubscription => 404,
            Self::SubscriptionRequired
            | Self::QualityNotAllowed(_)
            | Self::AccessLevelNotAllowed(_) => 403,
            Self::PlanInUse(_) => 409,
            Self::Database(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::PlanNotFound => "PLAN_NOT_FOUND",
            Self::SubscriptionNotFound => "SUBSCRIPTION_NOT_FOUND",
            Self::ContentNotFound => "CONTENT_NOT_FOUND",
            Self::DuplicateActiveSubscription => "DUPLICATE_ACTIVE_SUBSCRIPTION",
            Self::NoActiveSubscription => "NO_ACTIVE_SUBSCRIPTION",
            Self::PlanInUse(_) => "PLAN_IN_USE",
            Self::SubscriptionRequired => "SUBSCRIPTION_REQUIRED",
            Self::QualityNotAllowed(_) => "QUALITY_NOT_ALLOWED",
            Self::AccessLevelNotAllowed(_) => "ACCESS_LEVEL_NOT_ALLOWED",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<reelgate_db::DbError> for CoreError {
    fn from(err: reelgate_db::DbError) -> Self {
        match err {
            reelgate_db::DbError::NotFound => Self::SubscriptionNotFound,
            // Callers that can attribute a Conflict more precisely
            // (subscribe) intercept it before this conversion runs.
            reelgate_db::DbError::Conflict => Self::DuplicateActiveSubscription,
            other => {
                tracing::error!("database error: {}", other);
                Self::Database(other.to_string())
            }
        }
    }
}
