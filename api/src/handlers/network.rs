//! Network settings the web client needs to build and sign transactions

use axum::{extract::State, Json};
use serde::Serialize;

use crate::config::ContractIds;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct NetworkResponse {
    pub network_passphrase: String,
    pub horizon_url: String,
    pub contracts: ContractIds,
    pub platform_treasury_address: Option<String>,
    pub platform_fee_bps: u32,
    pub membership_duration_seconds: i64,
    pub transfer_cooldown_seconds: i64,
}

/// GET /network
pub async fn get_network(State(state): State<AppState>) -> Json<NetworkResponse> {
    let config = &state.config;
    Json(NetworkResponse {
        network_passphrase: config.network_passphrase.clone(),
        horizon_url: config.horizon_url.clone(),
        contracts: config.contracts.clone(),
        platform_treasury_address: config.platform_treasury_address.clone(),
        platform_fee_bps: config.platform_fee_bps,
        membership_duration_seconds: config.membership_duration_seconds,
        transfer_cooldown_seconds: config.transfer_cooldown_seconds,
    })
}
