use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::FromRow;

use crate::api::double_option;
use crate::database::manager::DatabaseError;
use crate::database::repository::{Filter, Model, Page, PageRequest, Repository};

#[derive(Debug, Clone, FromRow)]
pub struct TenantDetail {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub leases_count: i64,
}

impl Model for TenantDetail {
    const TABLE: &'static str = "tenants";
    const NAME: &'static str = "Tenant";
    const SELECT: &'static str = "SELECT t.id, t.name, t.email, t.phone, t.address, t.date_of_birth, \
        t.emergency_contact_name, t.emergency_contact_phone, t.created_at, t.updated_at, \
        (SELECT COUNT(*) FROM leases l WHERE l.tenant_id = t.id AND l.deleted_at IS NULL) AS leases_count \
        FROM tenants t";
}

const SEARCH_COLUMNS: &[&str] = &["name", "email", "phone"];

#[derive(Debug, Clone)]
pub struct NewTenant {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TenantChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option::deserialize")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option::deserialize")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option::deserialize")]
    pub date_of_birth: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option::deserialize")]
    pub emergency_contact_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option::deserialize")]
    pub emergency_contact_phone: Option<Option<String>>,
}

impl Repository<TenantDetail> {
    pub async fn search(&self, term: Option<&str>, page: PageRequest) -> Result<Page<TenantDetail>, DatabaseError> {
        let filters: Vec<Filter> = term
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| Filter::Search(SEARCH_COLUMNS, t.to_string()))
            .into_iter()
            .collect();
        self.paginate(&filters, page).await
    }

    pub async fn create(&self, input: NewTenant) -> Result<TenantDetail, DatabaseError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO tenants (name, email, phone, address, date_of_birth, emergency_contact_name, \
             emergency_contact_phone) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(input.name)
        .bind(input.email)
        .bind(input.phone)
        .bind(input.address)
        .bind(input.date_of_birth)
        .bind(input.emergency_contact_name)
        .bind(input.emergency_contact_phone)
        .fetch_one(&self.pool)
        .await?;
        self.find_404(id).await
    }

    pub async fn update(&self, id: i64, changes: TenantChanges) -> Result<bool, DatabaseError> {
        let mut update = self.assignments(id);
        update
            .set("name", changes.name)
            .set("email", changes.email)
            .set("phone", changes.phone)
            .set("address", changes.address)
            .set("date_of_birth", changes.date_of_birth)
            .set("emergency_contact_name", changes.emergency_contact_name)
            .set("emergency_contact_phone", changes.emergency_contact_phone);
        update.execute().await
    }
}
