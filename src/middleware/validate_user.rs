use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::auth::AuthUser;
use crate::auth::token_fingerprint;
use crate::database::models::user;
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::UserRole;

/// Validated user information from the users table
#[derive(Clone, Debug)]
pub struct ValidatedUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

/// Middleware that validates the user from JWT claims against the users table.
/// Rejects tokens revoked by logout and users that no longer exist.
pub async fn validate_user_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Get AuthUser from JWT middleware
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before user validation"))?;

    if user::is_token_revoked(&state.pool, &token_fingerprint(&auth_user.token)).await? {
        tracing::debug!("Revoked token presented by user {}", auth_user.user_id);
        return Err(ApiError::unauthorized("Unauthenticated."));
    }

    let db_user = user::find_by_id(&state.pool, auth_user.user_id).await?.ok_or_else(|| {
        tracing::warn!("User validation failed: user {} not found", auth_user.user_id);
        ApiError::unauthorized("Unauthenticated.")
    })?;

    // Token role must still match the stored role
    if db_user.role != auth_user.role {
        tracing::warn!(
            "User validation failed: token role '{}' doesn't match database role '{}'",
            auth_user.role,
            db_user.role
        );
        return Err(ApiError::forbidden("User role mismatch"));
    }

    let validated_user = ValidatedUser {
        id: db_user.id,
        name: db_user.name,
        email: db_user.email,
        role: db_user.role,
    };

    tracing::debug!("User validation successful: {} ({})", validated_user.email, validated_user.role);

    request.extensions_mut().insert(validated_user);

    Ok(next.run(request).await)
}
