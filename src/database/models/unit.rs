use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::FromRow;

use crate::api::double_option;
use crate::database::manager::DatabaseError;
use crate::database::repository::{Filter, Model, Page, PageRequest, Repository};
use crate::types::UnitStatus;

/// Bare unit row, as seen by lease admission
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Unit {
    pub id: i64,
    pub property_id: i64,
    pub unit_number: String,
    pub rent_amount: Decimal,
    pub status: UnitStatus,
}

#[derive(Debug, Clone, FromRow)]
pub struct UnitDetail {
    pub id: i64,
    pub property_id: i64,
    pub unit_number: String,
    pub rent_amount: Decimal,
    pub size: Option<i32>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub features: Option<Json<Vec<String>>>,
    pub status: UnitStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub property_name: String,
}

impl Model for UnitDetail {
    const TABLE: &'static str = "units";
    const NAME: &'static str = "Unit";
    const ORDER: &'static str = "t.id ASC";
    const SELECT: &'static str = "SELECT t.id, t.property_id, t.unit_number, t.rent_amount, t.size, \
        t.bedrooms, t.bathrooms, t.features, t.status, t.created_at, t.updated_at, \
        p.name AS property_name \
        FROM units t JOIN properties p ON p.id = t.property_id";
}

#[derive(Debug, Clone)]
pub struct NewUnit {
    pub unit_number: String,
    pub rent_amount: Decimal,
    pub size: Option<i32>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub features: Option<Vec<String>>,
    pub status: UnitStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnitChanges {
    pub unit_number: Option<String>,
    pub rent_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option::deserialize")]
    pub size: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option::deserialize")]
    pub bedrooms: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option::deserialize")]
    pub bathrooms: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option::deserialize")]
    pub features: Option<Option<Vec<String>>>,
    pub status: Option<UnitStatus>,
}

impl Repository<UnitDetail> {
    pub async fn for_property(&self, property_id: i64, page: PageRequest) -> Result<Page<UnitDetail>, DatabaseError> {
        self.paginate(&[Filter::Eq("property_id", property_id)], page).await
    }

    pub async fn create(&self, property_id: i64, input: NewUnit) -> Result<UnitDetail, DatabaseError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO units (property_id, unit_number, rent_amount, size, bedrooms, bathrooms, features, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
        )
        .bind(property_id)
        .bind(input.unit_number)
        .bind(input.rent_amount)
        .bind(input.size)
        .bind(input.bedrooms)
        .bind(input.bathrooms)
        .bind(input.features.map(Json))
        .bind(input.status)
        .fetch_one(&self.pool)
        .await?;
        self.find_404(id).await
    }

    pub async fn update(&self, id: i64, changes: UnitChanges) -> Result<bool, DatabaseError> {
        let mut update = self.assignments(id);
        update
            .set("unit_number", changes.unit_number)
            .set("rent_amount", changes.rent_amount)
            .set("size", changes.size)
            .set("bedrooms", changes.bedrooms)
            .set("bathrooms", changes.bathrooms)
            .set("features", changes.features.map(|f| f.map(Json)))
            .set("status", changes.status);
        update.execute().await
    }
}
