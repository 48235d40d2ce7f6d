//! Response shapes for each resource, built from the joined database rows

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::database::models::{LeaseDetail, PaymentDetail, PropertyDetail, TenantDetail, UnitDetail, User};
use crate::types::{LeaseStatus, PaymentStatus, UnitStatus, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResource {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResource {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ref {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRef {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyResource {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub features: Option<Vec<String>>,
    pub landlord: ContactRef,
    pub units_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PropertyDetail> for PropertyResource {
    fn from(p: PropertyDetail) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            address: p.address,
            city: p.city,
            state: p.state,
            zip_code: p.zip_code,
            features: p.features.map(|f| f.0),
            landlord: ContactRef {
                id: p.landlord_id,
                name: p.landlord_name,
                email: p.landlord_email,
            },
            units_count: p.units_count,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitResource {
    pub id: i64,
    pub unit_number: String,
    pub rent_amount: Decimal,
    pub size: Option<i32>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub features: Option<Vec<String>>,
    pub status: UnitStatus,
    pub property: Ref,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UnitDetail> for UnitResource {
    fn from(u: UnitDetail) -> Self {
        Self {
            id: u.id,
            unit_number: u.unit_number,
            rent_amount: u.rent_amount,
            size: u.size,
            bedrooms: u.bedrooms,
            bathrooms: u.bathrooms,
            features: u.features.map(|f| f.0),
            status: u.status,
            property: Ref {
                id: u.property_id,
                name: u.property_name,
            },
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TenantResource {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub leases_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TenantDetail> for TenantResource {
    fn from(t: TenantDetail) -> Self {
        Self {
            id: t.id,
            name: t.name,
            email: t.email,
            phone: t.phone,
            address: t.address,
            date_of_birth: t.date_of_birth,
            emergency_contact_name: t.emergency_contact_name,
            emergency_contact_phone: t.emergency_contact_phone,
            leases_count: t.leases_count,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaseUnitRef {
    pub id: i64,
    pub unit_number: String,
    pub property: Ref,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaseResource {
    pub id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_rent: Decimal,
    pub security_deposit: Option<Decimal>,
    pub status: LeaseStatus,
    pub terms: Option<String>,
    pub tenant: ContactRef,
    pub unit: LeaseUnitRef,
    pub payments_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LeaseDetail> for LeaseResource {
    fn from(l: LeaseDetail) -> Self {
        Self {
            id: l.id,
            start_date: l.start_date,
            end_date: l.end_date,
            monthly_rent: l.monthly_rent,
            security_deposit: l.security_deposit,
            status: l.status,
            terms: l.terms,
            tenant: ContactRef {
                id: l.tenant_id,
                name: l.tenant_name,
                email: l.tenant_email,
            },
            unit: LeaseUnitRef {
                id: l.unit_id,
                unit_number: l.unit_number,
                property: Ref {
                    id: l.property_id,
                    name: l.property_name,
                },
            },
            payments_count: l.payments_count,
            created_at: l.created_at,
            updated_at: l.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentUnitRef {
    pub id: i64,
    pub unit_number: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentLeaseRef {
    pub id: i64,
    pub monthly_rent: Decimal,
    pub tenant: Ref,
    pub unit: PaymentUnitRef,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentResource {
    pub id: i64,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_method: String,
    pub transaction_reference: Option<String>,
    pub status: PaymentStatus,
    pub notes: Option<String>,
    pub lease: PaymentLeaseRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PaymentDetail> for PaymentResource {
    fn from(p: PaymentDetail) -> Self {
        Self {
            id: p.id,
            amount: p.amount,
            payment_date: p.payment_date,
            payment_method: p.payment_method,
            transaction_reference: p.transaction_reference,
            status: p.status,
            notes: p.notes,
            lease: PaymentLeaseRef {
                id: p.lease_id,
                monthly_rent: p.lease_monthly_rent,
                tenant: Ref {
                    id: p.tenant_id,
                    name: p.tenant_name,
                },
                unit: PaymentUnitRef {
                    id: p.unit_id,
                    unit_number: p.unit_number,
                },
            },
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::rent_reminder::tests::lease_detail;
    use serde_json::json;

    #[test]
    fn lease_resource_nests_tenant_unit_and_property() {
        let value = serde_json::to_value(LeaseResource::from(lease_detail())).unwrap();

        assert_eq!(value["id"], 3);
        assert_eq!(value["status"], "active");
        assert_eq!(value["monthly_rent"], json!(1250.5));
        assert_eq!(value["start_date"], "2025-06-01");
        assert_eq!(value["tenant"], json!({"id": 20, "name": "Ada Tenant", "email": "ada@example.com"}));
        assert_eq!(value["unit"]["unit_number"], "4B");
        assert_eq!(value["unit"]["property"], json!({"id": 7, "name": "Maple Court"}));
        assert_eq!(value["payments_count"], 0);
    }
}
