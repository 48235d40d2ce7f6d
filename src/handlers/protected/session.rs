use axum::{extract::State, Extension};
use serde_json::Value;

use crate::api::resources::UserResource;
use crate::auth::token_fingerprint;
use crate::database::models::user;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedUser};
use crate::state::AppState;

/// POST /api/v1/logout - Revoke the presented token
pub async fn logout_post(State(state): State<AppState>, Extension(auth): Extension<AuthUser>) -> ApiResult<Value> {
    user::revoke_token(&state.pool, auth.user_id, &token_fingerprint(&auth.token), auth.expires_at).await?;
    tracing::info!(user_id = auth.user_id, "User logged out");
    Ok(ApiResponse::message_only("Logged out successfully"))
}

/// GET /api/v1/me - The authenticated user
pub async fn me_get(State(state): State<AppState>, Extension(current): Extension<ValidatedUser>) -> ApiResult<UserResource> {
    let found = user::find_by_id(&state.pool, current.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Unauthenticated."))?;
    Ok(ApiResponse::success(found.into()))
}
