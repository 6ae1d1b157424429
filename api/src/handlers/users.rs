//! User handlers
//!
//! Wallet registration and profile management.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::ResourceLinks;
use crate::domain::entities::{ProfileUpdate, User, UserId};
use crate::error::AppError;
use crate::AppState;

use super::double_option;

/// Request body for storing a wallet
#[derive(Debug, Deserialize)]
pub struct StoreUserRequest {
    pub wallet_address: String,
    pub display_name: Option<String>,
}

/// Response body for storing a wallet
#[derive(Debug, Serialize)]
pub struct StoreUserResponse {
    pub user: User,
    /// API key for authenticated calls (Authorization: Bearer <api_key>)
    pub api_key: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    #[serde(flatten)]
    pub user: User,
    pub links: ResourceLinks,
}

/// Profile patch; `null` clears a field, a missing key leaves it alone
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub display_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub avatar_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub about: Option<Option<String>>,
}

/// POST /users
///
/// Store a wallet and issue a fresh API key. Any earlier key stops working.
pub async fn store_user(
    State(state): State<AppState>,
    Json(request): Json<StoreUserRequest>,
) -> Result<Json<StoreUserResponse>, AppError> {
    let (user, api_key) = state
        .user_service
        .store(&request.wallet_address, request.display_name.as_deref())
        .await?;

    Ok(Json(StoreUserResponse {
        message: format!(
            "Save this API key - it won't be shown again.\n\n\
             API Usage:\n  curl -H \"Authorization: Bearer {}\" {}/me",
            api_key, state.config.api_base_url
        ),
        user,
        api_key,
    }))
}

/// GET /users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.user_service.get_by_id(&UserId(id)).await?;
    Ok(Json(user_response(&state, user)))
}

/// GET /me
pub async fn get_me(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Json<UserResponse> {
    Json(user_response(&state, user))
}

/// PATCH /me
pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .user_service
        .update_profile(
            &user.id,
            ProfileUpdate {
                display_name: request.display_name,
                avatar_url: request.avatar_url,
                about: request.about,
            },
        )
        .await?;
    Ok(Json(user_response(&state, user)))
}

fn user_response(state: &AppState, user: User) -> UserResponse {
    UserResponse {
        links: state
            .explorer
            .links(None, Some(&user.wallet_address), None),
        user,
    }
}
