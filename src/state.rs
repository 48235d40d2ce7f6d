use sqlx::PgPool;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::{PgAdmissionStore, Repository};
use crate::jobs::JobDispatcher;
use crate::services::{LeaseAdmission, PropertyCache};

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: &'static AppConfig,
    pub cache: Arc<dyn PropertyCache>,
    pub jobs: Arc<dyn JobDispatcher>,
    pub admission: Arc<LeaseAdmission<PgAdmissionStore>>,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        config: &'static AppConfig,
        cache: Arc<dyn PropertyCache>,
        jobs: Arc<dyn JobDispatcher>,
    ) -> Self {
        let admission = Arc::new(LeaseAdmission::new(PgAdmissionStore::new(pool.clone())));
        Self {
            pool,
            config,
            cache,
            jobs,
            admission,
        }
    }

    pub fn repo<T>(&self) -> Repository<T> {
        Repository::new(self.pool.clone())
    }
}
