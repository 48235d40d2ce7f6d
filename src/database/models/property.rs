use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::FromRow;

use crate::api::double_option;
use crate::database::manager::DatabaseError;
use crate::database::repository::{Model, Repository};

/// A property joined with its landlord and live unit count
#[derive(Debug, Clone, FromRow)]
pub struct PropertyDetail {
    pub id: i64,
    pub landlord_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub features: Option<Json<Vec<String>>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub landlord_name: String,
    pub landlord_email: String,
    pub units_count: i64,
}

impl Model for PropertyDetail {
    const TABLE: &'static str = "properties";
    const NAME: &'static str = "Property";
    const SELECT: &'static str = "SELECT t.id, t.landlord_id, t.name, t.description, t.address, t.city, \
        t.state, t.zip_code, t.features, t.created_at, t.updated_at, \
        u.name AS landlord_name, u.email AS landlord_email, \
        (SELECT COUNT(*) FROM units x WHERE x.property_id = t.id AND x.deleted_at IS NULL) AS units_count \
        FROM properties t JOIN users u ON u.id = t.landlord_id";
}

#[derive(Debug, Clone)]
pub struct NewProperty {
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub features: Option<Vec<String>>,
}

/// Partial update; `Some(None)` clears a nullable column
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyChanges {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option::deserialize")]
    pub description: Option<Option<String>>,
    pub address: Option<String>,
    #[serde(default, deserialize_with = "double_option::deserialize")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option::deserialize")]
    pub state: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option::deserialize")]
    pub zip_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option::deserialize")]
    pub features: Option<Option<Vec<String>>>,
}

impl Repository<PropertyDetail> {
    pub async fn create(&self, landlord_id: i64, input: NewProperty) -> Result<PropertyDetail, DatabaseError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO properties (landlord_id, name, description, address, city, state, zip_code, features) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
        )
        .bind(landlord_id)
        .bind(input.name)
        .bind(input.description)
        .bind(input.address)
        .bind(input.city)
        .bind(input.state)
        .bind(input.zip_code)
        .bind(input.features.map(Json))
        .fetch_one(&self.pool)
        .await?;
        self.find_404(id).await
    }

    pub async fn update(&self, id: i64, changes: PropertyChanges) -> Result<bool, DatabaseError> {
        let mut update = self.assignments(id);
        update
            .set("name", changes.name)
            .set("description", changes.description)
            .set("address", changes.address)
            .set("city", changes.city)
            .set("state", changes.state)
            .set("zip_code", changes.zip_code)
            .set("features", changes.features.map(|f| f.map(Json)));
        update.execute().await
    }
}
