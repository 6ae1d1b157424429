//! Account lookups against Horizon

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::app::{AccountBalance, ResourceLinks};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    #[serde(flatten)]
    pub balance: AccountBalance,
    pub links: ResourceLinks,
}

/// GET /accounts/:address/balance
pub async fn get_balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<BalanceResponse>, AppError> {
    let balance = state.settlement_service.account_balance(&address).await?;
    let links = state
        .explorer
        .links(None, Some(balance.address.as_str()), None);
    Ok(Json(BalanceResponse { balance, links }))
}
