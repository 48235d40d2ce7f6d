use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::database::models::PaymentDetail;
use crate::database::{DatabaseError, Repository};

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    pub payment_id: i64,
    pub amount: Decimal,
    pub tenant: String,
    pub date: NaiveDate,
}

impl From<&PaymentDetail> for PaymentReceipt {
    fn from(payment: &PaymentDetail) -> Self {
        Self {
            payment_id: payment.id,
            amount: payment.amount,
            tenant: payment.tenant_name.clone(),
            date: payment.payment_date,
        }
    }
}

impl PaymentReceipt {
    pub fn send(&self) {
        info!(
            amount = %self.amount,
            tenant = %self.tenant,
            date = %self.date,
            "Payment receipt sent for Payment ID: {}",
            self.payment_id
        );
    }
}

pub async fn handle(pool: &PgPool, payment_id: i64) -> Result<(), DatabaseError> {
    let payments = Repository::<PaymentDetail>::new(pool.clone());
    match payments.find(payment_id).await? {
        Some(payment) => PaymentReceipt::from(&payment).send(),
        None => warn!(payment_id, "Payment receipt skipped: payment no longer exists"),
    }
    Ok(())
}
