use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::types::UserRole;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, DatabaseError> {
    let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
    Ok(sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(pool).await?)
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, DatabaseError> {
    let sql = format!("SELECT {} FROM users WHERE lower(email) = lower($1)", USER_COLUMNS);
    Ok(sqlx::query_as::<_, User>(&sql).bind(email).fetch_optional(pool).await?)
}

/// Fails with `UniqueViolation { constraint: "uq_users_email" }` on duplicates
pub async fn create(pool: &PgPool, user: &NewUser) -> Result<User, DatabaseError> {
    let sql = format!(
        "INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING {}",
        USER_COLUMNS
    );
    let row = sqlx::query_as::<_, User>(&sql)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

pub async fn revoke_token(
    pool: &PgPool,
    user_id: i64,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    sqlx::query(
        "INSERT INTO revoked_tokens (token_hash, user_id, expires_at) VALUES ($1, $2, $3) \
         ON CONFLICT (token_hash) DO NOTHING",
    )
    .bind(token_hash)
    .bind(user_id)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn is_token_revoked(pool: &PgPool, token_hash: &str) -> Result<bool, DatabaseError> {
    let revoked: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE token_hash = $1)")
        .bind(token_hash)
        .fetch_one(pool)
        .await?;
    Ok(revoked)
}
