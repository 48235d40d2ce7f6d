use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::database::manager::DatabaseError;
use crate::database::models::{Lease, NewLease, Unit};
use crate::services::lease_admission::{AdmissionStore, AdmissionTx};
use crate::types::UnitStatus;

const LEASE_COLUMNS: &str =
    "id, unit_id, tenant_id, start_date, end_date, monthly_rent, security_deposit, status, terms";

/// Postgres admission store: each transaction holds `FOR UPDATE` on the unit row
#[derive(Clone)]
pub struct PgAdmissionStore {
    pool: PgPool,
}

impl PgAdmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub struct PgAdmissionTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl AdmissionStore for PgAdmissionStore {
    type Tx = PgAdmissionTx;

    async fn begin_for_unit(&self, unit_id: i64) -> Result<Self::Tx, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        // A missing unit locks nothing; find_unit reports it
        sqlx::query("SELECT id FROM units WHERE id = $1 FOR UPDATE")
            .bind(unit_id)
            .fetch_optional(&mut *tx)
            .await?;
        Ok(PgAdmissionTx { tx })
    }
}

#[async_trait]
impl AdmissionTx for PgAdmissionTx {
    async fn find_unit(&mut self, unit_id: i64) -> Result<Option<Unit>, DatabaseError> {
        let unit = sqlx::query_as::<_, Unit>(
            "SELECT id, property_id, unit_number, rent_amount, status FROM units \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(unit_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(unit)
    }

    async fn tenant_exists(&mut self, tenant_id: i64) -> Result<bool, DatabaseError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tenants WHERE id = $1 AND deleted_at IS NULL)")
                .bind(tenant_id)
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(exists)
    }

    async fn find_active_for_unit(&mut self, unit_id: i64) -> Result<Option<Lease>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM leases WHERE unit_id = $1 AND status = 'active' AND deleted_at IS NULL LIMIT 1",
            LEASE_COLUMNS
        );
        let lease = sqlx::query_as::<_, Lease>(&sql)
            .bind(unit_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(lease)
    }

    async fn insert_lease(&mut self, lease: &NewLease) -> Result<Lease, DatabaseError> {
        let sql = format!(
            "INSERT INTO leases (unit_id, tenant_id, start_date, end_date, monthly_rent, security_deposit, status, terms) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            LEASE_COLUMNS
        );
        let created = sqlx::query_as::<_, Lease>(&sql)
            .bind(lease.unit_id)
            .bind(lease.tenant_id)
            .bind(lease.start_date)
            .bind(lease.end_date)
            .bind(lease.monthly_rent)
            .bind(lease.security_deposit)
            .bind(lease.status)
            .bind(&lease.terms)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(created)
    }

    async fn update_unit_status(&mut self, unit_id: i64, status: UnitStatus) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE units SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status)
            .bind(unit_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self) -> Result<(), DatabaseError> {
        self.tx.commit().await?;
        Ok(())
    }
}
