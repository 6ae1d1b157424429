//! Payout schedule handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::SplitShare;
use crate::domain::entities::{
    PayoutExecution, PayoutSchedule, PayoutScheduleId, RecipientInput, User,
};
use crate::error::AppError;
use crate::AppState;

/// Create or replace a schedule
#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub name: String,
    pub recipients: Vec<RecipientInput>,
}

#[derive(Debug, Deserialize)]
pub struct RecordExecutionRequest {
    pub tx_hash: String,
    /// Stroops distributed
    pub total_amount: String,
    pub executed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub amount: String,
}

/// GET /payouts
pub async fn list_schedules(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<PayoutSchedule>>, AppError> {
    Ok(Json(state.payout_service.list_schedules(&user).await?))
}

/// POST /payouts
pub async fn create_schedule(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<ScheduleRequest>,
) -> Result<Json<PayoutSchedule>, AppError> {
    let schedule = state
        .payout_service
        .create_schedule(&user, &request.name, &request.recipients)
        .await?;
    Ok(Json(schedule))
}

/// PUT /payouts/:id
pub async fn update_schedule(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<ScheduleRequest>,
) -> Result<Json<PayoutSchedule>, AppError> {
    let schedule = state
        .payout_service
        .update_schedule(
            &user,
            &PayoutScheduleId(id),
            &request.name,
            &request.recipients,
        )
        .await?;
    Ok(Json(schedule))
}

/// DELETE /payouts/:id
pub async fn delete_schedule(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .payout_service
        .delete_schedule(&user, &PayoutScheduleId(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /payouts/:id/executions
pub async fn list_executions(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PayoutExecution>>, AppError> {
    let executions = state
        .payout_service
        .list_executions(&user, &PayoutScheduleId(id))
        .await?;
    Ok(Json(executions))
}

/// POST /payouts/:id/executions
pub async fn record_execution(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecordExecutionRequest>,
) -> Result<Json<PayoutExecution>, AppError> {
    let execution = state
        .payout_service
        .record_execution(
            &user,
            &PayoutScheduleId(id),
            &request.tx_hash,
            &request.total_amount,
            request.executed_at,
        )
        .await?;
    Ok(Json(execution))
}

/// GET /payouts/:id/preview?amount=
pub async fn preview_split(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<Vec<SplitShare>>, AppError> {
    let shares = state
        .payout_service
        .preview_split(&user, &PayoutScheduleId(id), &query.amount)
        .await?;
    Ok(Json(shares))
}
