//! Deferred notification jobs.
//!
//! Jobs are fire-and-forget: each is spawned with a fixed delay, attempted
//! once, and any failure is logged. Notifications are delivered to the log.

pub mod payment_receipt;
pub mod rent_reminder;

use sqlx::PgPool;
use std::time::Duration;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

use crate::database::DatabaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    RentReminder { lease_id: i64 },
    PaymentReceipt { payment_id: i64 },
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::RentReminder { .. } => "rent_reminder",
            Job::PaymentReceipt { .. } => "payment_receipt",
        }
    }
}

pub trait JobDispatcher: Send + Sync {
    /// Queue a job to run once after `delay`. Never blocks the caller.
    fn dispatch(&self, job: Job, delay: Duration);
}

/// Runs jobs as tracked tokio tasks against the application database
#[derive(Clone)]
pub struct TokioDispatcher {
    pool: PgPool,
    tracker: TaskTracker,
    rent_due_in_days: i64,
}

impl TokioDispatcher {
    pub fn new(pool: PgPool, rent_due_in_days: i64) -> Self {
        Self {
            pool,
            tracker: TaskTracker::new(),
            rent_due_in_days,
        }
    }

    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every queued job to run, including ones still sleeping
    pub async fn shutdown(&self) {
        self.tracker.close();
        if !self.tracker.is_empty() {
            info!("Waiting for {} queued jobs", self.tracker.len());
        }
        self.tracker.wait().await;
    }

    async fn run(pool: PgPool, job: Job, rent_due_in_days: i64) -> Result<(), DatabaseError> {
        match job {
            Job::RentReminder { lease_id } => rent_reminder::handle(&pool, lease_id, rent_due_in_days).await,
            Job::PaymentReceipt { payment_id } => payment_receipt::handle(&pool, payment_id).await,
        }
    }
}

impl JobDispatcher for TokioDispatcher {
    fn dispatch(&self, job: Job, delay: Duration) {
        let pool = self.pool.clone();
        let due_in_days = self.rent_due_in_days;
        tracing::debug!(job = job.name(), delay_secs = delay.as_secs(), "Job queued");
        self.tracker.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = Self::run(pool, job, due_in_days).await {
                error!(job = job.name(), error = %e, "Job failed: {:?}", job);
            }
        });
    }
}

/// Discards every job; for deployments that do not send notifications
pub struct NoopDispatcher;

impl JobDispatcher for NoopDispatcher {
    fn dispatch(&self, job: Job, _delay: Duration) {
        tracing::debug!(job = job.name(), "Job discarded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingDispatcher;

    #[test]
    fn job_names() {
        assert_eq!(Job::RentReminder { lease_id: 1 }.name(), "rent_reminder");
        assert_eq!(Job::PaymentReceipt { payment_id: 1 }.name(), "payment_receipt");
    }

    #[test]
    fn recording_dispatcher_keeps_order_and_delay() {
        let dispatcher = RecordingDispatcher::default();
        dispatcher.dispatch(Job::PaymentReceipt { payment_id: 4 }, Duration::from_secs(10));
        dispatcher.dispatch(Job::RentReminder { lease_id: 2 }, Duration::from_secs(5));

        assert_eq!(
            dispatcher.dispatched(),
            vec![
                (Job::PaymentReceipt { payment_id: 4 }, Duration::from_secs(10)),
                (Job::RentReminder { lease_id: 2 }, Duration::from_secs(5)),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_dispatcher_waits_for_delay_and_drains() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(50))
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .unwrap();
        let dispatcher = TokioDispatcher::new(pool, 5);

        dispatcher.dispatch(Job::PaymentReceipt { payment_id: 1 }, Duration::from_secs(10));
        assert_eq!(dispatcher.pending(), 1);

        // The job fails to reach the database; the failure is logged, not raised
        dispatcher.shutdown().await;
        assert_eq!(dispatcher.pending(), 0);
    }
}
