use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use chrono::{DateTime, Utc};

use crate::auth::{validate_jwt, Claims};
use crate::error::ApiError;
use crate::types::UserRole;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i64,
    pub role: UserRole,
    pub expires_at: DateTime<Utc>,
    /// Raw bearer token, kept so logout can revoke it
    pub token: String,
}

impl AuthUser {
    fn from_claims(claims: Claims, token: String) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
            expires_at: claims.expires_at(),
            token,
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(headers: HeaderMap, mut request: Request, next: Next) -> Result<Response, ApiError> {
    // Extract JWT from Authorization header
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;

    // Validate and decode JWT
    let claims = validate_jwt(&token).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        ApiError::unauthorized("Unauthenticated.")
    })?;

    request.extensions_mut().insert(AuthUser::from_claims(claims, token));

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
