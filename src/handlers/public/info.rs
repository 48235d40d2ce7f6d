use axum::extract::State;
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET / - Service name and version
pub async fn root_get() -> ApiResponse<Value> {
    ApiResponse::success(json!({
        "name": "Property Management API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "auth": "/api/v1/register, /api/v1/login (public - token acquisition)",
            "session": "/api/v1/logout, /api/v1/me (protected)",
            "properties": "/api/v1/properties[/:id] (protected)",
            "units": "/api/v1/properties/:id/units, /api/v1/units/:id (protected)",
            "tenants": "/api/v1/tenants[/:id] (protected)",
            "leases": "/api/v1/leases[/:id] (protected)",
            "payments": "/api/v1/payments[/:id] (protected)",
        }
    }))
}

/// GET /health - Database liveness; 503 while the database is unreachable
pub async fn health_get(State(state): State<AppState>) -> ApiResult<Value> {
    if let Err(e) = DatabaseManager::health_check(&state.pool).await {
        tracing::warn!("Health check failed: {}", e);
        return Err(ApiError::service_unavailable("Database unavailable"));
    }

    Ok(ApiResponse::success(json!({
        "status": "ok",
        "database": "connected",
        "environment": state.config.environment,
    })))
}
