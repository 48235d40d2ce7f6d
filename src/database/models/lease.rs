use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::FromRow;

use crate::api::double_option;
use crate::database::manager::DatabaseError;
use crate::database::repository::{Filter, Model, Page, PageRequest, Repository};
use crate::types::LeaseStatus;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Lease {
    pub id: i64,
    pub unit_id: i64,
    pub tenant_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_rent: Decimal,
    pub security_deposit: Option<Decimal>,
    pub status: LeaseStatus,
    pub terms: Option<String>,
}

/// Input to lease admission
#[derive(Debug, Clone, PartialEq)]
pub struct NewLease {
    pub unit_id: i64,
    pub tenant_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_rent: Decimal,
    pub security_deposit: Option<Decimal>,
    pub status: LeaseStatus,
    pub terms: Option<String>,
}

/// A lease joined with its tenant, unit and property
#[derive(Debug, Clone, FromRow)]
pub struct LeaseDetail {
    pub id: i64,
    pub unit_id: i64,
    pub tenant_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_rent: Decimal,
    pub security_deposit: Option<Decimal>,
    pub status: LeaseStatus,
    pub terms: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tenant_name: String,
    pub tenant_email: String,
    pub unit_number: String,
    pub property_id: i64,
    pub property_name: String,
    pub payments_count: i64,
}

impl Model for LeaseDetail {
    const TABLE: &'static str = "leases";
    const NAME: &'static str = "Lease";
    const SELECT: &'static str = "SELECT t.id, t.unit_id, t.tenant_id, t.start_date, t.end_date, \
        t.monthly_rent, t.security_deposit, t.status, t.terms, t.created_at, t.updated_at, \
        tn.name AS tenant_name, tn.email AS tenant_email, \
        un.unit_number, un.property_id, pr.name AS property_name, \
        (SELECT COUNT(*) FROM payments py WHERE py.lease_id = t.id) AS payments_count \
        FROM leases t \
        JOIN tenants tn ON tn.id = t.tenant_id \
        JOIN units un ON un.id = t.unit_id \
        JOIN properties pr ON pr.id = un.property_id";
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaseChanges {
    pub unit_id: Option<i64>,
    pub tenant_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub monthly_rent: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option::deserialize")]
    pub security_deposit: Option<Option<Decimal>>,
    pub status: Option<LeaseStatus>,
    #[serde(default, deserialize_with = "double_option::deserialize")]
    pub terms: Option<Option<String>>,
}

impl Repository<LeaseDetail> {
    /// Leases optionally narrowed to one unit and/or tenant
    pub async fn list(
        &self,
        unit_id: Option<i64>,
        tenant_id: Option<i64>,
        page: PageRequest,
    ) -> Result<Page<LeaseDetail>, DatabaseError> {
        let mut filters = Vec::new();
        if let Some(unit_id) = unit_id {
            filters.push(Filter::Eq("unit_id", unit_id));
        }
        if let Some(tenant_id) = tenant_id {
            filters.push(Filter::Eq("tenant_id", tenant_id));
        }
        self.paginate(&filters, page).await
    }

    /// Ids of every live active lease, oldest first
    pub async fn active_ids(&self) -> Result<Vec<i64>, DatabaseError> {
        let ids = sqlx::query_scalar(
            "SELECT id FROM leases WHERE status = 'active' AND deleted_at IS NULL ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// Fails with a unique violation on `uq_leases_active_unit` when the
    /// change would leave a unit with two active leases.
    pub async fn update(&self, id: i64, changes: LeaseChanges) -> Result<bool, DatabaseError> {
        let mut update = self.assignments(id);
        update
            .set("unit_id", changes.unit_id)
            .set("tenant_id", changes.tenant_id)
            .set("start_date", changes.start_date)
            .set("end_date", changes.end_date)
            .set("monthly_rent", changes.monthly_rent)
            .set("security_deposit", changes.security_deposit)
            .set("status", changes.status)
            .set("terms", changes.terms);
        update.execute().await
    }
}
