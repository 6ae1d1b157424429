//! Savings goal handlers

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{
    MovementType, SavingsGoal, SavingsGoalId, SavingsGoalUpdate, SavingsMovement, User,
};
use crate::domain::ledger::parse_stroops;
use crate::error::AppError;
use crate::AppState;

use super::double_option;

#[derive(Debug, Deserialize)]
pub struct CreateGoalRequest {
    pub name: String,
    /// Stroops
    pub target_amount: String,
    pub target_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Goal patch; `null` clears the date or notes
#[derive(Debug, Default, Deserialize)]
pub struct UpdateGoalRequest {
    pub name: Option<String>,
    pub target_amount: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub target_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct RecordMovementRequest {
    pub movement_type: MovementType,
    pub amount: String,
    pub tx_hash: Option<String>,
    pub memo: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MovementResponse {
    pub goal: SavingsGoal,
    pub movement: SavingsMovement,
}

/// GET /savings
pub async fn list_goals(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<SavingsGoal>>, AppError> {
    Ok(Json(state.savings_service.list_for_owner(&user).await?))
}

/// POST /savings
pub async fn create_goal(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateGoalRequest>,
) -> Result<Json<SavingsGoal>, AppError> {
    let goal = state
        .savings_service
        .create(
            &user,
            &request.name,
            &request.target_amount,
            request.target_date,
            request.notes,
        )
        .await?;
    Ok(Json(goal))
}

/// PATCH /savings/:id
pub async fn update_goal(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateGoalRequest>,
) -> Result<Json<SavingsGoal>, AppError> {
    let target_amount = request
        .target_amount
        .as_deref()
        .map(parse_stroops)
        .transpose()?;
    let update = SavingsGoalUpdate {
        name: request.name,
        target_amount,
        target_date: request.target_date,
        notes: request.notes,
    };
    let goal = state
        .savings_service
        .update_details(&user, &SavingsGoalId(id), update)
        .await?;
    Ok(Json(goal))
}

/// DELETE /savings/:id
pub async fn archive_goal(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<SavingsGoal>, AppError> {
    let goal = state
        .savings_service
        .archive(&user, &SavingsGoalId(id))
        .await?;
    Ok(Json(goal))
}

/// GET /savings/:id/movements
pub async fn list_movements(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SavingsMovement>>, AppError> {
    let movements = state
        .savings_service
        .list_movements(&user, &SavingsGoalId(id))
        .await?;
    Ok(Json(movements))
}

/// POST /savings/:id/movements
pub async fn record_movement(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecordMovementRequest>,
) -> Result<Json<MovementResponse>, AppError> {
    let (goal, movement) = state
        .savings_service
        .record_movement(
            &user,
            &SavingsGoalId(id),
            request.movement_type,
            &request.amount,
            request.tx_hash.as_deref(),
            request.memo,
        )
        .await?;
    Ok(Json(MovementResponse { goal, movement }))
}
