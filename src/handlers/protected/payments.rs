use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::{inner, not_found};
use crate::api::resources::PaymentResource;
use crate::api::validation::FieldErrors;
use crate::api::ListQuery;
use crate::database::models::{LeaseDetail, NewPayment, PaymentChanges, PaymentDetail};
use crate::database::Filter;
use crate::error::ApiError;
use crate::jobs::Job;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::PaymentStatus;

#[derive(Debug, Default, Deserialize)]
pub struct PaymentListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub lease_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub lease_id: Option<i64>,
    pub amount: Option<Decimal>,
    pub payment_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub transaction_reference: Option<String>,
    pub status: Option<PaymentStatus>,
    pub notes: Option<String>,
}

/// GET /api/v1/payments - Optionally narrowed with `?lease_id=`
pub async fn list(State(state): State<AppState>, Query(query): Query<PaymentListQuery>) -> ApiResult<Vec<PaymentResource>> {
    let request = ListQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .page_request(&state.config.api);
    let filters: Vec<Filter> = query.lease_id.map(|id| Filter::Eq("lease_id", id)).into_iter().collect();

    let page = state
        .repo::<PaymentDetail>()
        .paginate(&filters, request)
        .await?
        .map(PaymentResource::from);
    Ok(ApiResponse::paginated(page))
}

/// POST /api/v1/payments - Records the payment and queues a receipt
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> ApiResult<PaymentResource> {
    let Json(input) = payload?;

    let mut errors = FieldErrors::new();
    let lease_id = errors.require("lease_id", input.lease_id);
    let amount = errors.require("amount", input.amount);
    let payment_date = errors.require("payment_date", input.payment_date);
    let payment_method = errors.require("payment_method", input.payment_method);
    errors.money("amount", amount);
    errors.non_blank("payment_method", payment_method.as_deref());
    errors.max_len("payment_method", payment_method.as_deref(), 50);
    errors.max_len("transaction_reference", input.transaction_reference.as_deref(), 255);
    errors.into_result()?;
    let (Some(lease_id), Some(amount), Some(payment_date), Some(payment_method)) =
        (lease_id, amount, payment_date, payment_method)
    else {
        return Err(ApiError::bad_request("Invalid request"));
    };

    if state.repo::<LeaseDetail>().find(lease_id).await?.is_none() {
        return Err(ApiError::invalid_field("lease_id", "The selected lease id is invalid."));
    }

    let payment = state
        .repo::<PaymentDetail>()
        .create(NewPayment {
            lease_id,
            amount,
            payment_date,
            payment_method,
            transaction_reference: input.transaction_reference,
            status: input.status.unwrap_or_default(),
            notes: input.notes,
        })
        .await?;
    tracing::info!(payment_id = payment.id, lease_id, "Payment recorded");

    state.jobs.dispatch(
        Job::PaymentReceipt { payment_id: payment.id },
        state.config.jobs.payment_receipt_delay(),
    );

    Ok(ApiResponse::created(payment.into()).message("Payment created successfully"))
}

/// GET /api/v1/payments/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<PaymentResource> {
    let payment = state.repo::<PaymentDetail>().find_404(id).await?;
    Ok(ApiResponse::success(payment.into()))
}

/// PUT/PATCH /api/v1/payments/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<PaymentChanges>, JsonRejection>,
) -> ApiResult<PaymentResource> {
    let Json(changes) = payload?;

    let mut errors = FieldErrors::new();
    errors.money("amount", changes.amount);
    errors.non_blank("payment_method", changes.payment_method.as_deref());
    errors.max_len("payment_method", changes.payment_method.as_deref(), 50);
    errors.max_len("transaction_reference", inner(&changes.transaction_reference), 255);
    errors.into_result()?;

    if let Some(lease_id) = changes.lease_id {
        if state.repo::<LeaseDetail>().find(lease_id).await?.is_none() {
            return Err(ApiError::invalid_field("lease_id", "The selected lease id is invalid."));
        }
    }

    let repo = state.repo::<PaymentDetail>();
    if !repo.update(id, changes).await? {
        return Err(not_found::<PaymentDetail>());
    }

    let payment = repo.find_404(id).await?;
    Ok(ApiResponse::success(payment.into()).message("Payment updated successfully"))
}

/// DELETE /api/v1/payments/:id - Payments are removed outright
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    if !state.repo::<PaymentDetail>().delete(id).await? {
        return Err(not_found::<PaymentDetail>());
    }
    tracing::info!(payment_id = id, "Payment deleted");
    Ok(ApiResponse::message_only("Payment deleted successfully"))
}
