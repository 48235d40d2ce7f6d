use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use super::{inner, not_found};
use crate::api::resources::TenantResource;
use crate::api::validation::FieldErrors;
use crate::api::ListQuery;
use crate::database::models::{NewTenant, TenantChanges, TenantDetail};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TenantListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TenantRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

fn check_contact(errors: &mut FieldErrors, phone: Option<&str>, contact_name: Option<&str>, contact_phone: Option<&str>) {
    errors.max_len("phone", phone, 20);
    errors.max_len("emergency_contact_name", contact_name, 255);
    errors.max_len("emergency_contact_phone", contact_phone, 20);
}

/// GET /api/v1/tenants - `?search=` matches name, email or phone
pub async fn list(State(state): State<AppState>, Query(query): Query<TenantListQuery>) -> ApiResult<Vec<TenantResource>> {
    let request = ListQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .page_request(&state.config.api);

    let page = state
        .repo::<TenantDetail>()
        .search(query.search.as_deref(), request)
        .await?
        .map(TenantResource::from);
    Ok(ApiResponse::paginated(page))
}

/// POST /api/v1/tenants
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<TenantRequest>, JsonRejection>,
) -> ApiResult<TenantResource> {
    let Json(input) = payload?;

    let mut errors = FieldErrors::new();
    let name = errors.require("name", input.name);
    let email = errors.require("email", input.email);
    errors.non_blank("name", name.as_deref());
    errors.max_len("name", name.as_deref(), 255);
    errors.email("email", email.as_deref());
    errors.max_len("email", email.as_deref(), 255);
    check_contact(
        &mut errors,
        input.phone.as_deref(),
        input.emergency_contact_name.as_deref(),
        input.emergency_contact_phone.as_deref(),
    );
    errors.into_result()?;
    let (Some(name), Some(email)) = (name, email) else {
        return Err(ApiError::bad_request("Invalid request"));
    };

    let tenant = state
        .repo::<TenantDetail>()
        .create(NewTenant {
            name,
            email,
            phone: input.phone,
            address: input.address,
            date_of_birth: input.date_of_birth,
            emergency_contact_name: input.emergency_contact_name,
            emergency_contact_phone: input.emergency_contact_phone,
        })
        .await?;
    tracing::info!(tenant_id = tenant.id, "Tenant created");

    Ok(ApiResponse::created(tenant.into()).message("Tenant created successfully"))
}

/// GET /api/v1/tenants/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<TenantResource> {
    let tenant = state.repo::<TenantDetail>().find_404(id).await?;
    Ok(ApiResponse::success(tenant.into()))
}

/// PUT/PATCH /api/v1/tenants/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<TenantChanges>, JsonRejection>,
) -> ApiResult<TenantResource> {
    let Json(changes) = payload?;

    let mut errors = FieldErrors::new();
    errors.non_blank("name", changes.name.as_deref());
    errors.max_len("name", changes.name.as_deref(), 255);
    errors.email("email", changes.email.as_deref());
    errors.max_len("email", changes.email.as_deref(), 255);
    check_contact(
        &mut errors,
        inner(&changes.phone),
        inner(&changes.emergency_contact_name),
        inner(&changes.emergency_contact_phone),
    );
    errors.into_result()?;

    let repo = state.repo::<TenantDetail>();
    if !repo.update(id, changes).await? {
        return Err(not_found::<TenantDetail>());
    }

    let tenant = repo.find_404(id).await?;
    Ok(ApiResponse::success(tenant.into()).message("Tenant updated successfully"))
}

/// DELETE /api/v1/tenants/:id - Soft delete
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    if !state.repo::<TenantDetail>().delete(id).await? {
        return Err(not_found::<TenantDetail>());
    }
    tracing::info!(tenant_id = id, "Tenant deleted");
    Ok(ApiResponse::message_only("Tenant deleted successfully"))
}
