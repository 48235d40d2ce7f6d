use std::sync::Arc;

use axum::{
    http::{HeaderName, HeaderValue},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::{RateLimitConfig, SecurityConfig};
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, rate_limit_middleware, validate_user_middleware, RouteLimiter};
use crate::state::AppState;

/// The full HTTP surface: `/`, `/health` and everything under `/api/v1`.
///
/// Middleware is applied bottom-up: CORS, request id, request tracing
/// (when enabled), request id echoed on the response.
pub fn app(state: AppState) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");
    let api = Router::new()
        .merge(auth_public_routes(&state.config.rate_limit))
        .merge(protected_routes(&state));

    let mut router = Router::new()
        // Public
        .route("/", get(public::root_get))
        .route("/health", get(public::health_get))
        .nest("/api/v1", api)
        .fallback(route_not_found)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()));

    if state.config.api.enable_request_logging {
        router = router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );
    }

    router
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors_layer(&state.config.security))
        .with_state(state)
}

/// Quota for one route group; `None` when limiting is off or the quota is zero
fn limiter(limits: &RateLimitConfig, group: &'static str, per_minute: u32) -> Option<Arc<RouteLimiter>> {
    if !limits.enabled {
        return None;
    }
    RouteLimiter::per_minute(group, per_minute)
}

fn throttled(routes: Router<AppState>, limiter: Option<Arc<RouteLimiter>>) -> Router<AppState> {
    match limiter {
        Some(limiter) => routes.route_layer(middleware::from_fn_with_state(limiter, rate_limit_middleware)),
        None => routes,
    }
}

fn auth_public_routes(limits: &RateLimitConfig) -> Router<AppState> {
    let register = Router::new().route("/register", post(public::register_post));
    let login = Router::new().route("/login", post(public::login_post));

    Router::new()
        .merge(throttled(register, limiter(limits, "register", limits.register_per_minute)))
        .merge(throttled(login, limiter(limits, "login", limits.login_per_minute)))
}

/// Everything that needs a bearer token. Layers run bottom-up, so the JWT
/// check happens before the user lookup, and both before the per-group
/// quotas, which count per user.
fn protected_routes(state: &AppState) -> Router<AppState> {
    let limits = &state.config.rate_limit;

    Router::new()
        .merge(session_routes())
        .merge(throttled(property_routes(), limiter(limits, "properties", limits.properties_per_minute)))
        .merge(unit_routes())
        .merge(throttled(lease_routes(), limiter(limits, "leases", limits.leases_per_minute)))
        .merge(throttled(tenant_routes(), limiter(limits, "tenants", limits.tenants_per_minute)))
        .merge(throttled(payment_routes(), limiter(limits, "payments", limits.payments_per_minute)))
        .route_layer(middleware::from_fn_with_state(state.clone(), validate_user_middleware))
        .route_layer(middleware::from_fn(jwt_auth_middleware))
}

fn session_routes() -> Router<AppState> {
    use protected::session;

    Router::new()
        .route("/logout", post(session::logout_post))
        .route("/me", get(session::me_get))
}

fn property_routes() -> Router<AppState> {
    use protected::properties;

    Router::new()
        .route("/properties", get(properties::list).post(properties::create))
        .route(
            "/properties/:id",
            get(properties::show)
                .put(properties::update)
                .patch(properties::update)
                .delete(properties::delete),
        )
}

/// Units are nested under their property only for list and create
fn unit_routes() -> Router<AppState> {
    use protected::units;

    Router::new()
        .route("/properties/:id/units", get(units::list).post(units::create))
        .route(
            "/units/:id",
            get(units::show).put(units::update).patch(units::update).delete(units::delete),
        )
}

fn lease_routes() -> Router<AppState> {
    use protected::leases;

    Router::new()
        .route("/leases", get(leases::list).post(leases::create))
        .route(
            "/leases/:id",
            get(leases::show).put(leases::update).patch(leases::update).delete(leases::delete),
        )
}

fn tenant_routes() -> Router<AppState> {
    use protected::tenants;

    Router::new()
        .route("/tenants", get(tenants::list).post(tenants::create))
        .route(
            "/tenants/:id",
            get(tenants::show).put(tenants::update).patch(tenants::update).delete(tenants::delete),
        )
}

fn payment_routes() -> Router<AppState> {
    use protected::payments;

    Router::new()
        .route("/payments", get(payments::list).post(payments::create))
        .route(
            "/payments/:id",
            get(payments::show)
                .put(payments::update)
                .patch(payments::update)
                .delete(payments::delete),
        )
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
