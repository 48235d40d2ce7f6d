//! In-memory collaborators for unit tests

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::database::manager::{DatabaseError, ACTIVE_LEASE_CONSTRAINT};
use crate::database::models::{Lease, NewLease, Unit};
use crate::jobs::{Job, JobDispatcher};
use crate::services::lease_admission::{AdmissionStore, AdmissionTx};
use crate::types::{LeaseStatus, UnitStatus};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    units: BTreeMap<i64, Unit>,
    tenants: BTreeSet<i64>,
    leases: Vec<Lease>,
    next_id: i64,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Admission store backed by a single mutex. A transaction holds the lock
/// and a working copy; commit writes the copy back, drop discards it.
#[derive(Clone, Default)]
pub struct MemoryAdmissionStore {
    state: Arc<Mutex<MemoryState>>,
    fail_status_update: Arc<AtomicBool>,
}

impl MemoryAdmissionStore {
    pub async fn add_unit(&self, unit_number: &str, status: UnitStatus) -> i64 {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        state.units.insert(
            id,
            Unit {
                id,
                property_id: 1,
                unit_number: unit_number.to_string(),
                rent_amount: Decimal::new(1000, 0),
                status,
            },
        );
        id
    }

    pub async fn add_tenant(&self) -> i64 {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        state.tenants.insert(id);
        id
    }

    pub async fn unit_status(&self, unit_id: i64) -> Option<UnitStatus> {
        self.state.lock().await.units.get(&unit_id).map(|u| u.status)
    }

    pub async fn leases(&self) -> Vec<Lease> {
        self.state.lock().await.leases.clone()
    }

    pub async fn active_leases(&self, unit_id: i64) -> Vec<Lease> {
        self.state
            .lock()
            .await
            .leases
            .iter()
            .filter(|l| l.unit_id == unit_id && l.status == LeaseStatus::Active)
            .cloned()
            .collect()
    }

    pub async fn active_lease_count(&self, unit_id: i64) -> usize {
        self.active_leases(unit_id).await.len()
    }

    /// Explicit status update, as the lease update endpoint does it
    pub async fn set_lease_status(&self, lease_id: i64, status: LeaseStatus) {
        let mut state = self.state.lock().await;
        if let Some(lease) = state.leases.iter_mut().find(|l| l.id == lease_id) {
            lease.status = status;
        }
    }

    pub async fn fail_next_status_update(&self) {
        self.fail_status_update.store(true, Ordering::SeqCst);
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    fail_status_update: Arc<AtomicBool>,
}

#[async_trait]
impl AdmissionStore for MemoryAdmissionStore {
    type Tx = MemoryTx;

    async fn begin_for_unit(&self, _unit_id: i64) -> Result<MemoryTx, DatabaseError> {
        let guard = self.state.clone().lock_owned().await;
        let working = (*guard).clone();
        Ok(MemoryTx {
            guard,
            working,
            fail_status_update: self.fail_status_update.clone(),
        })
    }
}

#[async_trait]
impl AdmissionTx for MemoryTx {
    async fn find_unit(&mut self, unit_id: i64) -> Result<Option<Unit>, DatabaseError> {
        Ok(self.working.units.get(&unit_id).cloned())
    }

    async fn tenant_exists(&mut self, tenant_id: i64) -> Result<bool, DatabaseError> {
        Ok(self.working.tenants.contains(&tenant_id))
    }

    async fn find_active_for_unit(&mut self, unit_id: i64) -> Result<Option<Lease>, DatabaseError> {
        tokio::task::yield_now().await;
        Ok(self
            .working
            .leases
            .iter()
            .find(|l| l.unit_id == unit_id && l.status == LeaseStatus::Active)
            .cloned())
    }

    async fn insert_lease(&mut self, lease: &NewLease) -> Result<Lease, DatabaseError> {
        let duplicate = lease.status == LeaseStatus::Active
            && self
                .working
                .leases
                .iter()
                .any(|l| l.unit_id == lease.unit_id && l.status == LeaseStatus::Active);
        if duplicate {
            return Err(DatabaseError::UniqueViolation {
                constraint: ACTIVE_LEASE_CONSTRAINT.to_string(),
            });
        }

        let created = Lease {
            id: self.working.next_id(),
            unit_id: lease.unit_id,
            tenant_id: lease.tenant_id,
            start_date: lease.start_date,
            end_date: lease.end_date,
            monthly_rent: lease.monthly_rent,
            security_deposit: lease.security_deposit,
            status: lease.status,
            terms: lease.terms.clone(),
        };
        self.working.leases.push(created.clone());
        Ok(created)
    }

    async fn update_unit_status(&mut self, unit_id: i64, status: UnitStatus) -> Result<(), DatabaseError> {
        if self.fail_status_update.swap(false, Ordering::SeqCst) {
            return Err(DatabaseError::QueryError("simulated failure".to_string()));
        }
        if let Some(unit) = self.working.units.get_mut(&unit_id) {
            unit.status = status;
        }
        Ok(())
    }

    async fn commit(mut self) -> Result<(), DatabaseError> {
        *self.guard = self.working;
        Ok(())
    }
}

/// Wraps a memory store so that existing active leases are never seen by
/// the pre-insert check, leaving only the insert-time constraint.
#[derive(Clone)]
pub struct StaleReadStore(pub MemoryAdmissionStore);

pub struct StaleReadTx(MemoryTx);

#[async_trait]
impl AdmissionStore for StaleReadStore {
    type Tx = StaleReadTx;

    async fn begin_for_unit(&self, unit_id: i64) -> Result<StaleReadTx, DatabaseError> {
        Ok(StaleReadTx(self.0.begin_for_unit(unit_id).await?))
    }
}

#[async_trait]
impl AdmissionTx for StaleReadTx {
    async fn find_unit(&mut self, unit_id: i64) -> Result<Option<Unit>, DatabaseError> {
        self.0.find_unit(unit_id).await
    }

    async fn tenant_exists(&mut self, tenant_id: i64) -> Result<bool, DatabaseError> {
        self.0.tenant_exists(tenant_id).await
    }

    async fn find_active_for_unit(&mut self, _unit_id: i64) -> Result<Option<Lease>, DatabaseError> {
        Ok(None)
    }

    async fn insert_lease(&mut self, lease: &NewLease) -> Result<Lease, DatabaseError> {
        self.0.insert_lease(lease).await
    }

    async fn update_unit_status(&mut self, unit_id: i64, status: UnitStatus) -> Result<(), DatabaseError> {
        self.0.update_unit_status(unit_id, status).await
    }

    async fn commit(self) -> Result<(), DatabaseError> {
        self.0.commit().await
    }
}

/// Dispatcher that records jobs instead of running them
#[derive(Clone, Default)]
pub struct RecordingDispatcher {
    dispatched: Arc<StdMutex<Vec<(Job, Duration)>>>,
}

impl RecordingDispatcher {
    pub fn dispatched(&self) -> Vec<(Job, Duration)> {
        self.dispatched.lock().map(|jobs| jobs.clone()).unwrap_or_default()
    }
}

impl JobDispatcher for RecordingDispatcher {
    fn dispatch(&self, job: Job, delay: Duration) {
        if let Ok(mut jobs) = self.dispatched.lock() {
            jobs.push((job, delay));
        }
    }
}
