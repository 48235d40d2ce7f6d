use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::not_found;
use crate::api::resources::UnitResource;
use crate::api::validation::FieldErrors;
use crate::api::ListQuery;
use crate::database::models::{NewUnit, PropertyDetail, UnitChanges, UnitDetail};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::UnitStatus;

#[derive(Debug, Deserialize)]
pub struct UnitRequest {
    pub unit_number: Option<String>,
    pub rent_amount: Option<Decimal>,
    pub size: Option<i32>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub features: Option<Vec<String>>,
    pub status: Option<UnitStatus>,
}

fn check_dimensions(errors: &mut FieldErrors, size: Option<i32>, bedrooms: Option<i32>, bathrooms: Option<i32>) {
    errors.non_negative_int("size", size);
    errors.non_negative_int("bedrooms", bedrooms);
    errors.non_negative_int("bathrooms", bathrooms);
}

/// GET /api/v1/properties/:property/units
pub async fn list(
    State(state): State<AppState>,
    Path(property_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<UnitResource>> {
    state.repo::<PropertyDetail>().find_404(property_id).await?;

    let page = state
        .repo::<UnitDetail>()
        .for_property(property_id, query.page_request(&state.config.api))
        .await?
        .map(UnitResource::from);
    Ok(ApiResponse::paginated(page))
}

/// POST /api/v1/properties/:property/units - New units start vacant unless told otherwise
pub async fn create(
    State(state): State<AppState>,
    Path(property_id): Path<i64>,
    payload: Result<Json<UnitRequest>, JsonRejection>,
) -> ApiResult<UnitResource> {
    let Json(input) = payload?;
    state.repo::<PropertyDetail>().find_404(property_id).await?;

    let mut errors = FieldErrors::new();
    let unit_number = errors.require("unit_number", input.unit_number);
    let rent_amount = errors.require("rent_amount", input.rent_amount);
    errors.non_blank("unit_number", unit_number.as_deref());
    errors.max_len("unit_number", unit_number.as_deref(), 50);
    errors.money("rent_amount", rent_amount);
    check_dimensions(&mut errors, input.size, input.bedrooms, input.bathrooms);
    errors.into_result()?;
    let (Some(unit_number), Some(rent_amount)) = (unit_number, rent_amount) else {
        return Err(ApiError::bad_request("Invalid request"));
    };

    let unit = state
        .repo::<UnitDetail>()
        .create(
            property_id,
            NewUnit {
                unit_number,
                rent_amount,
                size: input.size,
                bedrooms: input.bedrooms,
                bathrooms: input.bathrooms,
                features: input.features,
                status: input.status.unwrap_or_default(),
            },
        )
        .await?;
    tracing::info!(unit_id = unit.id, property_id, "Unit created");

    Ok(ApiResponse::created(unit.into()).message("Unit created successfully"))
}

/// GET /api/v1/units/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<UnitResource> {
    let unit = state.repo::<UnitDetail>().find_404(id).await?;
    Ok(ApiResponse::success(unit.into()))
}

/// PUT/PATCH /api/v1/units/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UnitChanges>, JsonRejection>,
) -> ApiResult<UnitResource> {
    let Json(changes) = payload?;

    let mut errors = FieldErrors::new();
    errors.non_blank("unit_number", changes.unit_number.as_deref());
    errors.max_len("unit_number", changes.unit_number.as_deref(), 50);
    errors.money("rent_amount", changes.rent_amount);
    check_dimensions(
        &mut errors,
        changes.size.flatten(),
        changes.bedrooms.flatten(),
        changes.bathrooms.flatten(),
    );
    errors.into_result()?;

    let repo = state.repo::<UnitDetail>();
    if !repo.update(id, changes).await? {
        return Err(not_found::<UnitDetail>());
    }

    let unit = repo.find_404(id).await?;
    Ok(ApiResponse::success(unit.into()).message("Unit updated successfully"))
}

/// DELETE /api/v1/units/:id - Soft delete
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    if !state.repo::<UnitDetail>().delete(id).await? {
        return Err(not_found::<UnitDetail>());
    }
    tracing::info!(unit_id = id, "Unit deleted");
    Ok(ApiResponse::message_only("Unit deleted successfully"))
}
