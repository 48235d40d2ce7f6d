/// Shared enums used across models, handlers and jobs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Agent,
    Landlord,
}

impl UserRole {
    /// Admins and agents see every property; landlords only their own
    pub fn sees_all_properties(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Agent)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Agent => "agent",
            UserRole::Landlord => "landlord",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "agent" => Ok(UserRole::Agent),
            "landlord" => Ok(UserRole::Landlord),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "unit_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    #[default]
    Vacant,
    Occupied,
    Maintenance,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "lease_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeaseStatus {
    #[default]
    Active,
    Ended,
    Terminated,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    #[default]
    Completed,
    Failed,
    Refunded,
}
