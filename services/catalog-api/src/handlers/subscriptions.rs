//! Subscription lifecycle handlers

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

use reelgate_core::Recipient;
use reelgate_types::{PlanId, Subscription};

use crate::error::{ApiError, ApiResult};
use crate::extractors::AuthUser;
use crate::handlers::Envelope;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub id: String,
    pub plan_id: String,
    pub status: String,
    pub start_date: String,
    pub end_date: String,
    pub auto_renew: bool,
    pub is_trial: bool,
    pub days_left: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(sub: Subscription) -> Self {
        let days_left = sub.days_left(Utc::now());
        Self {
            id: sub.id.0.to_string(),
            plan_id: sub.plan_id.0.to_string(),
            status: sub.status.as_str().to_string(),
            start_date: sub.start_date.to_rfc3339(),
            end_date: sub.end_date.to_rfc3339(),
            auto_renew: sub.auto_renew,
            is_trial: sub.is_trial,
            days_left,
            cancelled_at: sub.cancelled_at.map(|t| t.to_rfc3339()),
            cancel_reason: sub.cancel_reason,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub plan_id: Uuid,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
    #[serde(default)]
    pub auto_renew: bool,
}

fn default_payment_method() -> String {
    "credit_card".to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub subscription: Option<SubscriptionResponse>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub subscriptions: Vec<SubscriptionResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

#[derive(Debug, Deserialize, Default)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/subscriptions/subscribe
pub async fn subscribe(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<SubscribeRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<SubscriptionResponse>>)> {
    let start = Instant::now();

    if req.payment_method.trim().is_empty() {
        return Err(ApiError::BadRequest("paymentMethod is required".to_string()));
    }

    let subscription = state
        .ledger
        .subscribe(
            Recipient::new(user.user_id, user.email),
            PlanId(req.plan_id),
            &req.payment_method,
            req.auto_renew,
        )
        .await?;

    metrics::counter!("subscriptions_created_total").increment(1);
    metrics::histogram!("catalog_operation_duration_seconds", "operation" => "subscribe")
        .record(start.elapsed().as_secs_f64());

    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message(
            "Subscription created",
            SubscriptionResponse::from(subscription),
        )),
    ))
}

/// GET /api/v1/subscriptions/status
///
/// Always 200; `subscription` is null when the user has none active.
pub async fn subscription_status(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Envelope<StatusResponse>>> {
    let subscription = state.ledger.get_active(user.user_id).await?;

    Ok(Json(Envelope::ok(StatusResponse {
        subscription: subscription.map(SubscriptionResponse::from),
    })))
}

/// GET /api/v1/subscriptions/history
pub async fn subscription_history(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Envelope<HistoryResponse>>> {
    let page = state
        .ledger
        .history(user.user_id, query.page, query.limit)
        .await?;

    Ok(Json(Envelope::ok(HistoryResponse {
        subscriptions: page
            .subscriptions
            .into_iter()
            .map(SubscriptionResponse::from)
            .collect(),
        pagination: Pagination {
            total: page.total,
            page: page.page,
            limit: page.limit,
            pages: page.pages,
        },
    })))
}

/// PUT /api/v1/subscriptions/cancel
pub async fn cancel_subscription(
    State(state): State<AppState>,
    user: AuthUser,
    body: Option<Json<CancelRequest>>,
) -> ApiResult<Json<Envelope<SubscriptionResponse>>> {
    let reason = body.and_then(|Json(req)| req.reason);

    let subscription = state
        .ledger
        .cancel(Recipient::new(user.user_id, user.email), reason.as_deref())
        .await?;

    metrics::counter!("subscriptions_cancelled_total").increment(1);

    let message = format!(
        "Subscription cancelled. Access continues until {}",
        subscription.end_date.format("%Y-%m-%d")
    );
    Ok(Json(Envelope::with_message(
        message,
        SubscriptionResponse::from(subscription),
    )))
}

/// POST /api/v1/subscriptions/renew
pub async fn renew_subscription(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<SubscribeRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<SubscriptionResponse>>)> {
    if req.payment_method.trim().is_empty() {
        return Err(ApiError::BadRequest("paymentMethod is required".to_string()));
    }

    let subscription = state
        .ledger
        .renew(
            Recipient::new(user.user_id, user.email),
            PlanId(req.plan_id),
            &req.payment_method,
            req.auto_renew,
        )
        .await?;

    metrics::counter!("subscriptions_renewed_total").increment(1);

    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message(
            "Subscription renewed",
            SubscriptionResponse::from(subscription),
        )),
    ))
}
