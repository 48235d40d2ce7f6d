use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::DatabaseConfig;

pub const UNIQUE_VIOLATION: &str = "23505";
pub const FOREIGN_KEY_VIOLATION: &str = "23503";
pub const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Partial unique index guarding one active lease per unit
pub const ACTIVE_LEASE_CONSTRAINT: &str = "uq_leases_active_unit";

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("Foreign key constraint violated: {constraint}")]
    ForeignKeyViolation { constraint: String },

    #[error("Numeric value out of range")]
    NumericOutOfRange,

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl DatabaseError {
    pub fn is_unique_violation_on(&self, name: &str) -> bool {
        matches!(self, DatabaseError::UniqueViolation { constraint } if constraint == name)
    }

    /// Pool exhaustion or an unreachable server
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            DatabaseError::Sqlx(sqlx::Error::PoolTimedOut)
                | DatabaseError::Sqlx(sqlx::Error::PoolClosed)
                | DatabaseError::Sqlx(sqlx::Error::Io(_))
        )
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => return DatabaseError::UniqueViolation { constraint },
                Some(FOREIGN_KEY_VIOLATION) => {
                    return DatabaseError::ForeignKeyViolation { constraint }
                }
                Some(NUMERIC_OUT_OF_RANGE) => return DatabaseError::NumericOutOfRange,
                _ => {}
            }
        }
        DatabaseError::Sqlx(err)
    }
}

/// Owns pool construction and schema setup for the single application database
pub struct DatabaseManager;

impl DatabaseManager {
    /// Build a pool that connects on first use, so the server can start
    /// (and report degraded health) while the database is still down.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = Self::validate_url(&config.url)?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_lazy(&url)?;
        info!(
            "Configured database pool for {} (max {} connections)",
            Self::redacted(&url),
            config.max_connections
        );
        Ok(pool)
    }

    /// Apply the bundled migrations
    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(pool).await?;
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Drop logout fingerprints whose tokens have expired anyway
    pub async fn prune_revoked_tokens(pool: &PgPool) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < NOW()")
            .execute(pool)
            .await?;
        if result.rows_affected() > 0 {
            info!("Pruned {} expired revoked tokens", result.rows_affected());
        }
        Ok(result.rows_affected())
    }

    fn validate_url(raw: &str) -> Result<String, DatabaseError> {
        if raw.trim().is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }
        let url = url::Url::parse(raw).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        match url.scheme() {
            "postgres" | "postgresql" => Ok(url.into()),
            other => {
                warn!("Unsupported database scheme: {}", other);
                Err(DatabaseError::InvalidDatabaseUrl)
            }
        }
    }

    /// Connection string with the password masked, for logs
    fn redacted(raw: &str) -> String {
        match url::Url::parse(raw) {
            Ok(mut url) => {
                if url.password().is_some() {
                    let _ = url.set_password(Some("***"));
                }
                url.into()
            }
            Err(_) => "<invalid url>".to_string(),
        }
    }
}
