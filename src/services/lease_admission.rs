//! Lease admission: at most one active lease per unit.
//!
//! Every admission runs inside a transaction scoped to the unit (the unit row
//! is locked for its duration), so a check for an existing active lease and
//! the insert that follows cannot interleave with another admission for the
//! same unit. The storage layer additionally carries a partial unique index
//! on active leases; a violation of it is reported as `UnitAlreadyLeased`.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

use crate::database::manager::{DatabaseError, ACTIVE_LEASE_CONSTRAINT};
use crate::database::models::{Lease, NewLease, Unit};
use crate::types::UnitStatus;

#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("Unit {unit_id} is already leased")]
    UnitAlreadyLeased { unit_id: i64 },

    #[error("Lease end date {end} must be after start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Unit {0} not found")]
    UnitNotFound(i64),

    #[error("Tenant {0} not found")]
    TenantNotFound(i64),

    #[error(transparent)]
    Store(#[from] DatabaseError),
}

/// Opens admission transactions. Implementations must serialize
/// transactions for the same unit from `begin_for_unit` until the
/// transaction is committed or dropped.
#[async_trait]
pub trait AdmissionStore: Send + Sync {
    type Tx: AdmissionTx;

    async fn begin_for_unit(&self, unit_id: i64) -> Result<Self::Tx, DatabaseError>;
}

/// Unit and lease operations inside one admission transaction.
/// Dropping the transaction without `commit` discards every change.
#[async_trait]
pub trait AdmissionTx: Send {
    async fn find_unit(&mut self, unit_id: i64) -> Result<Option<Unit>, DatabaseError>;

    async fn tenant_exists(&mut self, tenant_id: i64) -> Result<bool, DatabaseError>;

    async fn find_active_for_unit(&mut self, unit_id: i64) -> Result<Option<Lease>, DatabaseError>;

    async fn insert_lease(&mut self, lease: &NewLease) -> Result<Lease, DatabaseError>;

    async fn update_unit_status(&mut self, unit_id: i64, status: UnitStatus) -> Result<(), DatabaseError>;

    async fn commit(self) -> Result<(), DatabaseError>;
}

pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), AdmissionError> {
    if end <= start {
        return Err(AdmissionError::InvalidDateRange { start, end });
    }
    Ok(())
}

pub struct LeaseAdmission<S> {
    store: S,
}

impl<S: AdmissionStore> LeaseAdmission<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Admit a new lease and mark its unit occupied, or reject it with no
    /// side effects.
    pub async fn create_lease(&self, lease: NewLease) -> Result<Lease, AdmissionError> {
        validate_date_range(lease.start_date, lease.end_date)?;

        let unit_id = lease.unit_id;
        let mut tx = self.store.begin_for_unit(unit_id).await?;

        if tx.find_unit(unit_id).await?.is_none() {
            return Err(AdmissionError::UnitNotFound(unit_id));
        }
        if !tx.tenant_exists(lease.tenant_id).await? {
            return Err(AdmissionError::TenantNotFound(lease.tenant_id));
        }

        if let Some(existing) = tx.find_active_for_unit(unit_id).await? {
            warn!(unit_id, existing_lease_id = existing.id, "Lease rejected: unit already leased");
            return Err(AdmissionError::UnitAlreadyLeased { unit_id });
        }

        let created = match tx.insert_lease(&lease).await {
            Ok(created) => created,
            Err(e) if e.is_unique_violation_on(ACTIVE_LEASE_CONSTRAINT) => {
                warn!(unit_id, "Lease rejected by active lease constraint");
                return Err(AdmissionError::UnitAlreadyLeased { unit_id });
            }
            Err(e) => return Err(e.into()),
        };

        tx.update_unit_status(unit_id, UnitStatus::Occupied).await?;
        tx.commit().await?;

        info!(
            lease_id = created.id,
            unit_id,
            tenant_id = created.tenant_id,
            status = ?created.status,
            "Lease admitted"
        );
        Ok(created)
    }
}
