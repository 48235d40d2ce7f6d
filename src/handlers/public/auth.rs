use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::resources::UserResource;
use crate::api::validation::FieldErrors;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{generate_jwt, Claims};
use crate::database::models::{user, NewUser, User};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::UserRole;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Token issued by register and login
#[derive(Debug, Serialize)]
pub struct TokenPayload {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub user: UserResource,
}

fn issue_token(user: User) -> Result<TokenPayload, ApiError> {
    let claims = Claims::new(user.id, user.role);
    let token = generate_jwt(&claims)?;
    Ok(TokenPayload {
        token,
        token_type: "Bearer",
        expires_at: claims.expires_at(),
        user: user.into(),
    })
}

/// Roles a user may pick for themselves; admins are provisioned from the CLI
fn self_service_role(raw: Option<&str>) -> Option<UserRole> {
    match raw.map(UserRole::from_str) {
        None => Some(UserRole::Landlord),
        Some(Ok(role @ (UserRole::Landlord | UserRole::Agent))) => Some(role),
        Some(_) => None,
    }
}

/// POST /api/v1/register - Create an account and return a token
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<TokenPayload> {
    let Json(input) = payload?;
    let security = &state.config.security;

    let mut errors = FieldErrors::new();
    let name = errors.require("name", input.name);
    let email = errors.require("email", input.email);
    let password = errors.require("password", input.password);
    errors.non_blank("name", name.as_deref());
    errors.max_len("name", name.as_deref(), 255);
    errors.email("email", email.as_deref());
    errors.max_len("email", email.as_deref(), 255);
    errors.min_len("password", password.as_deref(), security.min_password_length);
    if password.is_some() && password != input.password_confirmation {
        errors.add("password", "The password confirmation does not match.");
    }
    let role = self_service_role(input.role.as_deref());
    if role.is_none() {
        errors.add("role", "The selected role is invalid.");
    }

    errors.into_result()?;
    let (Some(name), Some(email), Some(password), Some(role)) = (name, email, password, role) else {
        return Err(ApiError::bad_request("Invalid request"));
    };

    if user::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(ApiError::invalid_field("email", "The email has already been taken."));
    }

    let password_hash = hash_password(&password).map_err(|e| {
        tracing::error!("Password hashing failed: {}", e);
        ApiError::internal_server_error("Failed to create account")
    })?;

    let new_user = NewUser {
        name: name.trim().to_string(),
        email: email.trim().to_lowercase(),
        password_hash,
        role,
    };
    let created = user::create(&state.pool, &new_user).await?;
    tracing::info!(user_id = created.id, role = %created.role, "User registered");

    Ok(ApiResponse::created(issue_token(created)?).message("User registered successfully"))
}

/// POST /api/v1/login - Exchange credentials for a token
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<TokenPayload> {
    let Json(input) = payload?;

    let mut errors = FieldErrors::new();
    let email = errors.require("email", input.email);
    let password = errors.require("password", input.password);
    errors.into_result()?;
    let (Some(email), Some(password)) = (email, password) else {
        return Err(ApiError::bad_request("Invalid request"));
    };

    let Some(found) = user::find_by_email(&state.pool, email.trim()).await? else {
        tracing::debug!("Login failed: unknown email");
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    match verify_password(&password, &found.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            tracing::debug!(user_id = found.id, "Login failed: wrong password");
            return Err(ApiError::unauthorized("Invalid credentials"));
        }
        Err(e) => {
            tracing::warn!(user_id = found.id, "Stored password hash unreadable: {}", e);
            return Err(ApiError::unauthorized("Invalid credentials"));
        }
    }

    tracing::info!(user_id = found.id, "User logged in");
    Ok(ApiResponse::success(issue_token(found)?).message("Login successful"))
}
