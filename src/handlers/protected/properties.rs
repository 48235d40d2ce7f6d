use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;

use super::{inner, not_found};
use crate::api::resources::PropertyResource;
use crate::api::validation::FieldErrors;
use crate::api::ListQuery;
use crate::database::models::{NewProperty, PropertyChanges, PropertyDetail};
use crate::database::{Filter, Page, PageRequest};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, ValidatedUser};
use crate::services::listing_key;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PropertyRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub features: Option<Vec<String>>,
}

fn check_lengths(errors: &mut FieldErrors, city: Option<&str>, state: Option<&str>, zip_code: Option<&str>) {
    errors.max_len("city", city, 100);
    errors.max_len("state", state, 100);
    errors.max_len("zip_code", zip_code, 20);
}

/// A cached listing only answers the page it was rendered for
fn cached_page(cached: Value, request: PageRequest) -> Option<Page<PropertyResource>> {
    match serde_json::from_value::<Page<PropertyResource>>(cached) {
        Ok(page) if page.current_page == request.page && page.per_page == request.per_page => Some(page),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("Discarding unreadable property listing cache entry: {}", e);
            None
        }
    }
}

/// GET /api/v1/properties - Landlords see their own properties, admins and agents see all
pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<ValidatedUser>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<PropertyResource>> {
    let request = query.page_request(&state.config.api);
    let key = listing_key(current.id);

    if let Some(page) = state.cache.get(&key).await.and_then(|v| cached_page(v, request)) {
        tracing::debug!(key = %key, "Property listing served from cache");
        return Ok(ApiResponse::paginated(page));
    }

    let filters = if current.role.sees_all_properties() {
        Vec::new()
    } else {
        vec![Filter::Eq("landlord_id", current.id)]
    };
    let page = state
        .repo::<PropertyDetail>()
        .paginate(&filters, request)
        .await?
        .map(PropertyResource::from);

    match serde_json::to_value(&page) {
        Ok(value) => state.cache.put(&key, value, state.config.cache.property_ttl()).await,
        Err(e) => tracing::warn!("Property listing not cached: {}", e),
    }

    Ok(ApiResponse::paginated(page))
}

/// POST /api/v1/properties - The caller becomes the landlord
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<ValidatedUser>,
    payload: Result<Json<PropertyRequest>, JsonRejection>,
) -> ApiResult<PropertyResource> {
    let Json(input) = payload?;

    let mut errors = FieldErrors::new();
    let name = errors.require("name", input.name);
    let address = errors.require("address", input.address);
    errors.non_blank("name", name.as_deref());
    errors.max_len("name", name.as_deref(), 255);
    errors.non_blank("address", address.as_deref());
    errors.max_len("address", address.as_deref(), 255);
    check_lengths(&mut errors, input.city.as_deref(), input.state.as_deref(), input.zip_code.as_deref());
    errors.into_result()?;
    let (Some(name), Some(address)) = (name, address) else {
        return Err(ApiError::bad_request("Invalid request"));
    };

    let property = state
        .repo::<PropertyDetail>()
        .create(
            current.id,
            NewProperty {
                name,
                description: input.description,
                address,
                city: input.city,
                state: input.state,
                zip_code: input.zip_code,
                features: input.features,
            },
        )
        .await?;

    state.cache.forget(&listing_key(current.id)).await;
    tracing::info!(property_id = property.id, landlord_id = current.id, "Property created");

    Ok(ApiResponse::created(property.into()).message("Property created successfully"))
}

/// GET /api/v1/properties/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<PropertyResource> {
    let property = state.repo::<PropertyDetail>().find_404(id).await?;
    Ok(ApiResponse::success(property.into()))
}

/// PUT/PATCH /api/v1/properties/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<PropertyChanges>, JsonRejection>,
) -> ApiResult<PropertyResource> {
    let Json(changes) = payload?;

    let mut errors = FieldErrors::new();
    errors.non_blank("name", changes.name.as_deref());
    errors.max_len("name", changes.name.as_deref(), 255);
    errors.non_blank("address", changes.address.as_deref());
    errors.max_len("address", changes.address.as_deref(), 255);
    check_lengths(&mut errors, inner(&changes.city), inner(&changes.state), inner(&changes.zip_code));
    errors.into_result()?;

    let repo = state.repo::<PropertyDetail>();
    let existing = repo.find_404(id).await?;
    if !repo.update(id, changes).await? {
        return Err(not_found::<PropertyDetail>());
    }
    state.cache.forget(&listing_key(existing.landlord_id)).await;

    let property = repo.find_404(id).await?;
    Ok(ApiResponse::success(property.into()).message("Property updated successfully"))
}

/// DELETE /api/v1/properties/:id - Soft delete
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    let repo = state.repo::<PropertyDetail>();
    let existing = repo.find_404(id).await?;
    if !repo.delete(id).await? {
        return Err(not_found::<PropertyDetail>());
    }
    state.cache.forget(&listing_key(existing.landlord_id)).await;
    tracing::info!(property_id = id, "Property deleted");

    Ok(ApiResponse::message_only("Property deleted successfully"))
}
