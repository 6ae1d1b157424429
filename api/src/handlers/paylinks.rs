//! Paylink handlers

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::app::{CreatePaylinkInput, ResourceLinks, SettlementOutcome};
use crate::domain::entities::{Paylink, User};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PaylinkResponse {
    #[serde(flatten)]
    pub paylink: Paylink,
    pub links: ResourceLinks,
}

#[derive(Debug, Deserialize)]
pub struct CreatePaylinkRequest {
    pub handle: String,
    pub receiving_address: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Payment details to check against a transaction.
///
/// `amount` is in XLM, e.g. "12.5".
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub tx_hash: String,
    pub amount: Option<String>,
    pub from: Option<String>,
    pub memo: Option<String>,
}

/// POST /paylinks
pub async fn create_paylink(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreatePaylinkRequest>,
) -> Result<Json<PaylinkResponse>, AppError> {
    let paylink = state
        .paylink_service
        .create(
            &user,
            CreatePaylinkInput {
                handle: request.handle,
                receiving_address: request.receiving_address,
                title: request.title,
                description: request.description,
            },
        )
        .await?;
    Ok(Json(paylink_response(&state, paylink)))
}

/// GET /paylinks
pub async fn list_paylinks(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<PaylinkResponse>>, AppError> {
    let paylinks = state.paylink_service.list_for_owner(&user).await?;
    Ok(Json(
        paylinks
            .into_iter()
            .map(|p| paylink_response(&state, p))
            .collect(),
    ))
}

/// GET /paylinks/:handle
pub async fn get_paylink(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<PaylinkResponse>, AppError> {
    let paylink = state.paylink_service.get_by_handle(&handle).await?;
    Ok(Json(paylink_response(&state, paylink)))
}

/// DELETE /paylinks/:handle
pub async fn archive_paylink(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(handle): Path<String>,
) -> Result<Json<PaylinkResponse>, AppError> {
    let paylink = state.paylink_service.archive(&user, &handle).await?;
    Ok(Json(paylink_response(&state, paylink)))
}

/// POST /paylinks/:handle/verify
pub async fn verify_payment(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<SettlementOutcome>, AppError> {
    let outcome = state
        .settlement_service
        .verify_paylink_payment(
            &handle,
            &request.tx_hash,
            request.amount.as_deref(),
            request.from.as_deref(),
            request.memo.as_deref(),
        )
        .await?;
    Ok(Json(outcome))
}

fn paylink_response(state: &AppState, paylink: Paylink) -> PaylinkResponse {
    PaylinkResponse {
        links: state
            .explorer
            .links(None, Some(paylink.receiving_address.as_str()), None),
        paylink,
    }
}
