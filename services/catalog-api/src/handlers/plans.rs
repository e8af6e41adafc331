//! Plan catalog handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

use reelgate_core::catalog::{NewPlan, PlanPatch};
use reelgate_core::{CoreError, FieldError};
use reelgate_types::{AccessLevel, Plan, PlanId, Quality};

use crate::error::{ApiError, ApiResult};
use crate::extractors::AdminUser;
use crate::handlers::Envelope;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub currency: String,
    pub duration_days: i32,
    pub quality: Quality,
    pub access_level: AccessLevel,
    pub max_devices: i32,
    pub max_concurrent_streams: i32,
    pub trial_days: i32,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Plan> for PlanResponse {
    fn from(plan: Plan) -> Self {
        Self {
            id: plan.id.0.to_string(),
            name: plan.name,
            description: plan.description,
            price_cents: plan.price_cents,
            currency: plan.currency,
            duration_days: plan.duration_days,
            quality: plan.quality,
            access_level: plan.access_level,
            max_devices: plan.max_devices,
            max_concurrent_streams: plan.max_concurrent_streams,
            trial_days: plan.trial_days,
            active: plan.active,
            created_at: plan.created_at.to_rfc3339(),
            updated_at: plan.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlanListResponse {
    pub plans: Vec<PlanResponse>,
}

#[derive(Debug, Deserialize)]
pub struct ListPlansQuery {
    pub quality: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub duration_days: i32,
    pub quality: String,
    #[serde(default = "default_access_level")]
    pub access_level: String,
    #[serde(default = "default_one")]
    pub max_devices: i32,
    #[serde(default = "default_one")]
    pub max_concurrent_streams: i32,
    #[serde(default)]
    pub trial_days: i32,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_access_level() -> String {
    "basic".to_string()
}

fn default_one() -> i32 {
    1
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlanRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub duration_days: Option<i32>,
    pub quality: Option<String>,
    pub access_level: Option<String>,
    pub max_devices: Option<i32>,
    pub max_concurrent_streams: Option<i32>,
    pub trial_days: Option<i32>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/plans
pub async fn list_plans(
    State(state): State<AppState>,
    Query(query): Query<ListPlansQuery>,
) -> ApiResult<Json<Envelope<PlanListResponse>>> {
    let quality = match query.quality.as_deref() {
        Some(q) => Some(parse_quality(q)?),
        None => None,
    };

    let plans = state.catalog.list_active_plans(quality).await?;

    Ok(Json(Envelope::ok(PlanListResponse {
        plans: plans.into_iter().map(PlanResponse::from).collect(),
    })))
}

/// GET /api/v1/plans/{id}
pub async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<PlanResponse>>> {
    let plan = state.catalog.get_plan(PlanId(id)).await?;
    Ok(Json(Envelope::ok(PlanResponse::from(plan))))
}

/// POST /api/v1/plans (admin)
pub async fn create_plan(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(req): Json<CreatePlanRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<PlanResponse>>)> {
    let start = Instant::now();

    let quality = parse_quality(&req.quality)?;
    let access_level = parse_access_level(&req.access_level)?;

    let plan = state
        .catalog
        .create_plan(NewPlan {
            name: req.name,
            description: req.description,
            price_cents: req.price_cents,
            currency: req.currency,
            duration_days: req.duration_days,
            quality,
            access_level,
            max_devices: req.max_devices,
            max_concurrent_streams: req.max_concurrent_streams,
            trial_days: req.trial_days,
        })
        .await?;

    metrics::histogram!("catalog_operation_duration_seconds", "operation" => "create_plan")
        .record(start.elapsed().as_secs_f64());
    tracing::info!(admin = %admin.0.user_id, plan = %plan.name, "plan created");

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(PlanResponse::from(plan))),
    ))
}

/// PUT /api/v1/plans/{id} (admin)
pub async fn update_plan(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePlanRequest>,
) -> ApiResult<Json<Envelope<PlanResponse>>> {
    let quality = match req.quality.as_deref() {
        Some(q) => Some(parse_quality(q)?),
        None => None,
    };
    let access_level = match req.access_level.as_deref() {
        Some(l) => Some(parse_access_level(l)?),
        None => None,
    };

    let plan = state
        .catalog
        .update_plan(
            PlanId(id),
            PlanPatch {
                name: req.name,
                description: req.description,
                price_cents: req.price_cents,
                duration_days: req.duration_days,
                quality,
                access_level,
                max_devices: req.max_devices,
                max_concurrent_streams: req.max_concurrent_streams,
                trial_days: req.trial_days,
            },
        )
        .await?;

    Ok(Json(Envelope::ok(PlanResponse::from(plan))))
}

/// DELETE /api/v1/plans/{id} (admin)
pub async fn delete_plan(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    state.catalog.delete_plan(PlanId(id)).await?;
    tracing::info!(admin = %admin.0.user_id, plan_id = %id, "plan deleted");

    Ok(Json(Envelope::with_message(
        "Plan deleted",
        serde_json::json!({}),
    )))
}

pub(crate) fn parse_quality(s: &str) -> Result<Quality, ApiError> {
    s.parse().map_err(|_| {
        ApiError::Core(CoreError::Validation(vec![FieldError::new(
            "quality",
            format!("unknown quality: {s}"),
        )]))
    })
}

pub(crate) fn parse_access_level(s: &str) -> Result<AccessLevel, ApiError> {
    s.parse().map_err(|_| {
        ApiError::Core(CoreError::Validation(vec![FieldError::new(
            "accessLevel",
            format!("unknown access level: {s}"),
        )]))
    })
}
