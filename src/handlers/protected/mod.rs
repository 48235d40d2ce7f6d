// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Every route here runs behind jwt_auth_middleware and then
// validate_user_middleware, so handlers may rely on both AuthUser and
// ValidatedUser being present in request extensions.

pub mod leases; // /api/v1/leases, runs lease admission on create
pub mod payments; // /api/v1/payments, queues receipts
pub mod properties; // /api/v1/properties, cached listing
pub mod session; // /api/v1/logout, /api/v1/me
pub mod tenants; // /api/v1/tenants
pub mod units; // /api/v1/properties/:id/units, /api/v1/units/:id

use crate::database::Model;
use crate::error::ApiError;

/// 404 "<Resource> not found"
pub(crate) fn not_found<T: Model>() -> ApiError {
    ApiError::not_found(format!("{} not found", T::NAME))
}

/// Borrow the inner value of a nullable partial-update field
pub(crate) fn inner(value: &Option<Option<String>>) -> Option<&str> {
    value.as_ref().and_then(|v| v.as_deref())
}
