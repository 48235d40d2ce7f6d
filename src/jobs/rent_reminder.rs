use chrono::{Duration, Local, NaiveDate};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::time::Duration as StdDuration;
use tracing::{info, warn};

use super::{Job, JobDispatcher};
use crate::database::models::LeaseDetail;
use crate::database::{DatabaseError, Repository};

#[derive(Debug, Clone, PartialEq)]
pub struct RentReminder {
    pub tenant: String,
    pub property: String,
    pub unit: String,
    pub amount_due: Decimal,
    pub due_date: NaiveDate,
}

impl RentReminder {
    pub fn for_lease(lease: &LeaseDetail, today: NaiveDate, due_in_days: i64) -> Self {
        Self {
            tenant: lease.tenant_name.clone(),
            property: lease.property_name.clone(),
            unit: lease.unit_number.clone(),
            amount_due: lease.monthly_rent,
            due_date: today + Duration::days(due_in_days),
        }
    }

    pub fn send(&self) {
        info!(
            property = %self.property,
            unit = %self.unit,
            amount_due = %self.amount_due,
            due_date = %self.due_date,
            "Rent reminder sent for Tenant: {}",
            self.tenant
        );
    }
}

pub async fn handle(pool: &PgPool, lease_id: i64, due_in_days: i64) -> Result<(), DatabaseError> {
    let leases = Repository::<LeaseDetail>::new(pool.clone());
    match leases.find(lease_id).await? {
        Some(lease) => {
            RentReminder::for_lease(&lease, Local::now().date_naive(), due_in_days).send();
        }
        None => warn!(lease_id, "Rent reminder skipped: lease no longer exists"),
    }
    Ok(())
}

/// Queue one reminder per live active lease; returns how many were queued
pub async fn queue_all(
    pool: &PgPool,
    dispatcher: &dyn JobDispatcher,
    delay: StdDuration,
) -> Result<usize, DatabaseError> {
    let ids = Repository::<LeaseDetail>::new(pool.clone()).active_ids().await?;
    for &lease_id in &ids {
        dispatcher.dispatch(Job::RentReminder { lease_id }, delay);
    }
    Ok(ids.len())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::LeaseStatus;
    use chrono::Utc;

    pub(crate) fn lease_detail() -> LeaseDetail {
        LeaseDetail {
            id: 3,
            unit_id: 10,
            tenant_id: 20,
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            monthly_rent: Decimal::new(125050, 2),
            security_deposit: None,
            status: LeaseStatus::Active,
            terms: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            tenant_name: "Ada Tenant".to_string(),
            tenant_email: "ada@example.com".to_string(),
            unit_number: "4B".to_string(),
            property_id: 7,
            property_name: "Maple Court".to_string(),
            payments_count: 0,
        }
    }

    #[test]
    fn reminder_is_due_five_days_out() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 28).unwrap();
        let reminder = RentReminder::for_lease(&lease_detail(), today, 5);

        assert_eq!(reminder.tenant, "Ada Tenant");
        assert_eq!(reminder.property, "Maple Court");
        assert_eq!(reminder.unit, "4B");
        assert_eq!(reminder.amount_due, Decimal::new(125050, 2));
        assert_eq!(reminder.due_date, NaiveDate::from_ymd_opt(2025, 7, 3).unwrap());
    }
}
