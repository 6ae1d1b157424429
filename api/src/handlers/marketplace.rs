//! Marketplace handlers
//!
//! Listings are created and settled on-chain by the client; these
//! endpoints mirror them and enforce the off-chain cooldowns.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::app::{FeeBreakdown, ResourceLinks, UserStatsView};
use crate::domain::entities::{Listing, User};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ListingResponse {
    #[serde(flatten)]
    pub listing: Listing,
    pub links: ResourceLinks,
}

#[derive(Debug, Deserialize)]
pub struct CreateListingRequest {
    pub listing_id: String,
    /// Stroops
    pub price: String,
    pub tx_hash: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelListingRequest {
    pub tx_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub tx_hash: String,
}

#[derive(Debug, Deserialize)]
pub struct FeeQuery {
    pub price: String,
}

/// GET /marketplace/listings
pub async fn list_listings(
    State(state): State<AppState>,
) -> Result<Json<Vec<ListingResponse>>, AppError> {
    let listings = state.marketplace_service.list_active().await?;
    Ok(Json(
        listings
            .into_iter()
            .map(|l| listing_response(&state, l))
            .collect(),
    ))
}

/// GET /marketplace/listings/mine
pub async fn list_my_listings(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<ListingResponse>>, AppError> {
    let listings = state.marketplace_service.list_mine(&user).await?;
    Ok(Json(
        listings
            .into_iter()
            .map(|l| listing_response(&state, l))
            .collect(),
    ))
}

/// POST /marketplace/listings
pub async fn create_listing(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateListingRequest>,
) -> Result<Json<ListingResponse>, AppError> {
    let listing = state
        .marketplace_service
        .create_listing(
            &user,
            &request.listing_id,
            &request.price,
            request.tx_hash.as_deref(),
        )
        .await?;
    Ok(Json(listing_response(&state, listing)))
}

/// POST /marketplace/listings/:listing_id/cancel
pub async fn cancel_listing(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(listing_id): Path<String>,
    Json(request): Json<CancelListingRequest>,
) -> Result<Json<ListingResponse>, AppError> {
    let listing = state
        .marketplace_service
        .cancel_listing(&user, &listing_id, request.tx_hash.as_deref())
        .await?;
    Ok(Json(listing_response(&state, listing)))
}

/// POST /marketplace/listings/:listing_id/purchase
pub async fn purchase_listing(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(listing_id): Path<String>,
    Json(request): Json<PurchaseRequest>,
) -> Result<Json<ListingResponse>, AppError> {
    let listing = state
        .marketplace_service
        .record_purchase(&user, &listing_id, &request.tx_hash)
        .await?;
    Ok(Json(listing_response(&state, listing)))
}

/// GET /marketplace/stats
pub async fn get_stats(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<UserStatsView>, AppError> {
    Ok(Json(state.marketplace_service.get_user_stats(&user).await?))
}

/// GET /marketplace/fees?price=
pub async fn fee_breakdown(
    State(state): State<AppState>,
    Query(query): Query<FeeQuery>,
) -> Result<Json<FeeBreakdown>, AppError> {
    Ok(Json(state.marketplace_service.fee_breakdown(&query.price)?))
}

fn listing_response(state: &AppState, listing: Listing) -> ListingResponse {
    ListingResponse {
        links: state.explorer.links(
            listing.last_tx_hash.as_deref(),
            Some(listing.seller_address.as_str()),
            Some(state.config.contracts.marketplace.as_str()),
        ),
        listing,
    }
}
