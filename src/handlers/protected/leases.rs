use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::not_found;
use crate::api::resources::LeaseResource;
use crate::api::validation::FieldErrors;
use crate::api::ListQuery;
use crate::database::models::{LeaseChanges, LeaseDetail, NewLease};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::lease_admission::validate_date_range;
use crate::state::AppState;
use crate::types::LeaseStatus;

#[derive(Debug, Default, Deserialize)]
pub struct LeaseListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub unit_id: Option<i64>,
    pub tenant_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LeaseRequest {
    pub unit_id: Option<i64>,
    pub tenant_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub monthly_rent: Option<Decimal>,
    pub security_deposit: Option<Decimal>,
    pub status: Option<LeaseStatus>,
    pub terms: Option<String>,
}

impl LeaseRequest {
    /// Field-level checks; the date range and the one-active-lease rule
    /// belong to admission.
    fn validate(self) -> Result<NewLease, ApiError> {
        let mut errors = FieldErrors::new();
        let unit_id = errors.require("unit_id", self.unit_id);
        let tenant_id = errors.require("tenant_id", self.tenant_id);
        let start_date = errors.require("start_date", self.start_date);
        let end_date = errors.require("end_date", self.end_date);
        let monthly_rent = errors.require("monthly_rent", self.monthly_rent);
        errors.money("monthly_rent", monthly_rent);
        errors.money("security_deposit", self.security_deposit);
        errors.into_result()?;

        match (unit_id, tenant_id, start_date, end_date, monthly_rent) {
            (Some(unit_id), Some(tenant_id), Some(start_date), Some(end_date), Some(monthly_rent)) => Ok(NewLease {
                unit_id,
                tenant_id,
                start_date,
                end_date,
                monthly_rent,
                security_deposit: self.security_deposit,
                status: self.status.unwrap_or_default(),
                terms: self.terms,
            }),
            _ => Err(ApiError::bad_request("Invalid request")),
        }
    }
}

/// GET /api/v1/leases - Optionally narrowed with `?unit_id=` and `?tenant_id=`
pub async fn list(State(state): State<AppState>, Query(query): Query<LeaseListQuery>) -> ApiResult<Vec<LeaseResource>> {
    let request = ListQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .page_request(&state.config.api);

    let page = state
        .repo::<LeaseDetail>()
        .list(query.unit_id, query.tenant_id, request)
        .await?
        .map(LeaseResource::from);
    Ok(ApiResponse::paginated(page))
}

/// POST /api/v1/leases - Admit a lease and mark its unit occupied
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<LeaseRequest>, JsonRejection>,
) -> ApiResult<LeaseResource> {
    let Json(input) = payload?;
    let new_lease = input.validate()?;

    let lease = state.admission.create_lease(new_lease).await?;
    let detail = state.repo::<LeaseDetail>().find_404(lease.id).await?;

    Ok(ApiResponse::created(detail.into()).message("Lease created successfully"))
}

/// GET /api/v1/leases/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<LeaseResource> {
    let lease = state.repo::<LeaseDetail>().find_404(id).await?;
    Ok(ApiResponse::success(lease.into()))
}

/// PUT/PATCH /api/v1/leases/:id - Any status may move to any other; a change
/// that would give a unit a second active lease is rejected.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<LeaseChanges>, JsonRejection>,
) -> ApiResult<LeaseResource> {
    let Json(changes) = payload?;

    let mut errors = FieldErrors::new();
    errors.money("monthly_rent", changes.monthly_rent);
    errors.money("security_deposit", changes.security_deposit.flatten());
    errors.into_result()?;

    let repo = state.repo::<LeaseDetail>();
    let existing = repo.find_404(id).await?;

    let start = changes.start_date.unwrap_or(existing.start_date);
    let end = changes.end_date.unwrap_or(existing.end_date);
    validate_date_range(start, end)?;

    let status_change = changes.status.filter(|s| *s != existing.status);
    if !repo.update(id, changes).await? {
        return Err(not_found::<LeaseDetail>());
    }
    if let Some(to) = status_change {
        tracing::info!(lease_id = id, unit_id = existing.unit_id, from = ?existing.status, to = ?to, "Lease status changed");
    }

    let lease = repo.find_404(id).await?;
    Ok(ApiResponse::success(lease.into()).message("Lease updated successfully"))
}

/// DELETE /api/v1/leases/:id - Soft delete; the unit keeps its status
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    if !state.repo::<LeaseDetail>().delete(id).await? {
        return Err(not_found::<LeaseDetail>());
    }
    tracing::info!(lease_id = id, "Lease deleted");
    Ok(ApiResponse::message_only("Lease deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> LeaseRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn validated_request_defaults_to_active() {
        let lease = request(json!({
            "unit_id": 1,
            "tenant_id": 2,
            "start_date": "2025-06-01",
            "end_date": "2026-06-01",
            "monthly_rent": 1000,
            "security_deposit": 500
        }))
        .validate()
        .unwrap();

        assert_eq!(lease.status, LeaseStatus::Active);
        assert_eq!(lease.monthly_rent, Decimal::new(1000, 0));
        assert_eq!(lease.security_deposit, Some(Decimal::new(500, 0)));
        assert_eq!(lease.start_date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    }

    #[test]
    fn missing_fields_are_reported_together() {
        let err = request(json!({"unit_id": 1, "monthly_rent": -5})).validate().unwrap_err();
        assert_eq!(err.status_code(), 422);

        let body = err.to_json();
        let fields = body["field_errors"].as_object().unwrap();
        for field in ["tenant_id", "start_date", "end_date", "monthly_rent"] {
            assert!(fields.contains_key(field), "missing {}", field);
        }
        assert!(!fields.contains_key("unit_id"));
    }

    #[test]
    fn explicit_status_is_kept() {
        let lease = request(json!({
            "unit_id": 1,
            "tenant_id": 2,
            "start_date": "2025-06-01",
            "end_date": "2026-06-01",
            "monthly_rent": 1250.5,
            "status": "ended"
        }))
        .validate()
        .unwrap();
        assert_eq!(lease.status, LeaseStatus::Ended);
        assert_eq!(lease.monthly_rent, Decimal::new(125050, 2));
    }
}
