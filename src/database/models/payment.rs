use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::FromRow;

use crate::api::double_option;
use crate::database::manager::DatabaseError;
use crate::database::repository::{Model, Repository};
use crate::types::PaymentStatus;

/// A payment joined with its lease, tenant and unit
#[derive(Debug, Clone, FromRow)]
pub struct PaymentDetail {
    pub id: i64,
    pub lease_id: i64,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_method: String,
    pub transaction_reference: Option<String>,
    pub status: PaymentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lease_monthly_rent: Decimal,
    pub tenant_id: i64,
    pub tenant_name: String,
    pub unit_id: i64,
    pub unit_number: String,
}

impl Model for PaymentDetail {
    const TABLE: &'static str = "payments";
    const NAME: &'static str = "Payment";
    const SOFT_DELETES: bool = false;
    const SELECT: &'static str = "SELECT t.id, t.lease_id, t.amount, t.payment_date, t.payment_method, \
        t.transaction_reference, t.status, t.notes, t.created_at, t.updated_at, \
        l.monthly_rent AS lease_monthly_rent, \
        tn.id AS tenant_id, tn.name AS tenant_name, \
        un.id AS unit_id, un.unit_number \
        FROM payments t \
        JOIN leases l ON l.id = t.lease_id \
        JOIN tenants tn ON tn.id = l.tenant_id \
        JOIN units un ON un.id = l.unit_id";
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub lease_id: i64,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_method: String,
    pub transaction_reference: Option<String>,
    pub status: PaymentStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentChanges {
    pub lease_id: Option<i64>,
    pub amount: Option<Decimal>,
    pub payment_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    #[serde(default, deserialize_with = "double_option::deserialize")]
    pub transaction_reference: Option<Option<String>>,
    pub status: Option<PaymentStatus>,
    #[serde(default, deserialize_with = "double_option::deserialize")]
    pub notes: Option<Option<String>>,
}

impl Repository<PaymentDetail> {
    pub async fn create(&self, input: NewPayment) -> Result<PaymentDetail, DatabaseError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO payments (lease_id, amount, payment_date, payment_method, transaction_reference, \
             status, notes) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(input.lease_id)
        .bind(input.amount)
        .bind(input.payment_date)
        .bind(input.payment_method)
        .bind(input.transaction_reference)
        .bind(input.status)
        .bind(input.notes)
        .fetch_one(&self.pool)
        .await?;
        self.find_404(id).await
    }

    pub async fn update(&self, id: i64, changes: PaymentChanges) -> Result<bool, DatabaseError> {
        let mut update = self.assignments(id);
        update
            .set("lease_id", changes.lease_id)
            .set("amount", changes.amount)
            .set("payment_date", changes.payment_date)
            .set("payment_method", changes.payment_method)
            .set("transaction_reference", changes.transaction_reference)
            .set("status", changes.status)
            .set("notes", changes.notes);
        update.execute().await
    }
}
