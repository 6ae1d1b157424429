//! Group handlers
//!
//! Endpoints for groups, memberships and the owner subscription.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::{
    AdministratorInput, CreateGroupInput, FeeQuote, GroupMember, ResourceLinks,
    UpdateSettingsInput,
};
use crate::domain::entities::{BillingCadence, Group, GroupId, Membership, User, Visibility};
use crate::domain::ledger::parse_non_negative_stroops;
use crate::error::AppError;
use crate::AppState;

/// Query parameters for listing groups
#[derive(Debug, Deserialize)]
pub struct ListGroupsQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> u64 {
    20
}

#[derive(Debug, Serialize)]
pub struct GroupResponse {
    #[serde(flatten)]
    pub group: Group,
    pub links: ResourceLinks,
}

/// Request to create a new group
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub about_url: Option<String>,
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub gallery_urls: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub visibility: Option<Visibility>,
    pub billing_cadence: Option<BillingCadence>,
    /// Membership price in stroops
    pub price: Option<String>,
    pub subscription_id: Option<String>,
    /// Subscription payment signed by the owner's wallet
    pub subscription_tx_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdministratorRequest {
    pub wallet_address: String,
    pub share_bps: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub short_description: Option<String>,
    pub about_url: Option<String>,
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub gallery_urls: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub billing_cadence: BillingCadence,
    pub price: Option<String>,
    #[serde(default)]
    pub administrators: Vec<AdministratorRequest>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDescriptionRequest {
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JoinGroupRequest {
    /// Expiry of the membership pass minted on-chain
    pub pass_expires_at: Option<DateTime<Utc>>,
    pub tx_hash: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RenewSubscriptionRequest {
    pub tx_hash: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RenewSubscriptionResponse {
    pub group_id: String,
    pub ends_on: DateTime<Utc>,
}

/// GET /groups
///
/// List public groups, newest first.
pub async fn list_groups(
    State(state): State<AppState>,
    Query(query): Query<ListGroupsQuery>,
) -> Result<Json<Vec<GroupResponse>>, AppError> {
    let groups = state
        .group_service
        .list_public(query.limit, query.offset)
        .await?;
    Ok(Json(group_responses(&state, groups)))
}

/// GET /groups/:id
pub async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GroupResponse>, AppError> {
    let group = state.group_service.get(&GroupId(id)).await?;
    Ok(Json(group_response(&state, group)))
}

/// GET /groups/:id/members
pub async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<GroupMember>>, AppError> {
    Ok(Json(state.group_service.list_members(&GroupId(id)).await?))
}

/// GET /groups/fee-quote
///
/// Platform subscription price shown before the owner signs.
pub async fn fee_quote(State(state): State<AppState>) -> Json<FeeQuote> {
    Json(state.group_service.platform_fee_quote())
}

/// GET /groups/mine
pub async fn list_owned(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<GroupResponse>>, AppError> {
    let groups = state.group_service.list_owned(&user).await?;
    Ok(Json(group_responses(&state, groups)))
}

/// GET /groups/joined
pub async fn list_joined(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<GroupResponse>>, AppError> {
    let groups = state.group_service.list_joined(&user).await?;
    Ok(Json(group_responses(&state, groups)))
}

/// POST /groups
pub async fn create_group(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateGroupRequest>,
) -> Result<Json<GroupResponse>, AppError> {
    let input = CreateGroupInput {
        name: request.name,
        description: request.description,
        short_description: request.short_description,
        about_url: request.about_url,
        thumbnail_url: request.thumbnail_url,
        gallery_urls: request.gallery_urls,
        tags: request.tags,
        visibility: request.visibility,
        billing_cadence: request.billing_cadence,
        price: parse_price(request.price.as_deref())?,
        subscription_id: request.subscription_id,
        subscription_tx_hash: request.subscription_tx_hash,
    };
    let group = state.group_service.create(&user, input).await?;
    Ok(Json(group_response(&state, group)))
}

/// PATCH /groups/:id/settings
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<GroupResponse>, AppError> {
    let input = UpdateSettingsInput {
        short_description: request.short_description,
        about_url: request.about_url,
        thumbnail_url: request.thumbnail_url,
        gallery_urls: request.gallery_urls,
        tags: request.tags,
        visibility: request.visibility,
        billing_cadence: request.billing_cadence,
        price: parse_price(request.price.as_deref())?,
        administrators: request
            .administrators
            .into_iter()
            .map(|a| AdministratorInput {
                wallet_address: a.wallet_address,
                share_bps: a.share_bps,
            })
            .collect(),
    };
    let group = state
        .group_service
        .update_settings(&user, &GroupId(id), input)
        .await?;
    Ok(Json(group_response(&state, group)))
}

/// PATCH /groups/:id/description
pub async fn update_description(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDescriptionRequest>,
) -> Result<Json<GroupResponse>, AppError> {
    let group = state
        .group_service
        .update_description(&user, &GroupId(id), request.description)
        .await?;
    Ok(Json(group_response(&state, group)))
}

/// POST /groups/:id/join
pub async fn join_group(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<JoinGroupRequest>,
) -> Result<Json<Membership>, AppError> {
    let membership = state
        .group_service
        .join(
            &user,
            &GroupId(id),
            request.pass_expires_at,
            request.tx_hash.as_deref(),
        )
        .await?;
    Ok(Json(membership))
}

/// POST /groups/:id/leave
pub async fn leave_group(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Membership>, AppError> {
    Ok(Json(state.group_service.leave(&user, &GroupId(id)).await?))
}

/// POST /groups/:id/renew
///
/// Extend the owner's subscription after a payment.
pub async fn renew_subscription(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<RenewSubscriptionRequest>,
) -> Result<Json<RenewSubscriptionResponse>, AppError> {
    let ends_on = state
        .group_service
        .renew_subscription(&user, &GroupId(id), request.tx_hash.as_deref())
        .await?;
    Ok(Json(RenewSubscriptionResponse {
        group_id: id.to_string(),
        ends_on,
    }))
}

fn parse_price(price: Option<&str>) -> Result<i128, AppError> {
    match price.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => Ok(parse_non_negative_stroops(p)?),
        None => Ok(0),
    }
}

fn group_response(state: &AppState, group: Group) -> GroupResponse {
    GroupResponse {
        links: state.explorer.links(
            group.last_subscription_tx_hash.as_deref(),
            None,
            Some(&state.config.contracts.membership),
        ),
        group,
    }
}

fn group_responses(state: &AppState, groups: Vec<Group>) -> Vec<GroupResponse> {
    groups
        .into_iter()
        .map(|g| group_response(state, g))
        .collect()
}
