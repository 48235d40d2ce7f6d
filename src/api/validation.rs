use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::error::{ApiError, INVALID_DATA};

/// Largest amount a `NUMERIC(10, 2)` column holds: 9_999_999_999 at scale 2
pub const MAX_MONEY: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Collects per-field messages and turns them into a single 422
#[derive(Debug, Default)]
pub struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        // First failure per field wins
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return the value of a required field, recording an error if it is missing
    pub fn require<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.add(field, format!("The {} field is required.", field.replace('_', " ")));
        }
        value
    }

    pub fn non_blank(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            if v.trim().is_empty() {
                self.add(field, format!("The {} field is required.", field.replace('_', " ")));
            }
        }
    }

    pub fn max_len(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(v) = value {
            if v.chars().count() > max {
                self.add(
                    field,
                    format!("The {} must not be greater than {} characters.", field.replace('_', " "), max),
                );
            }
        }
    }

    pub fn min_len(&mut self, field: &str, value: Option<&str>, min: usize) {
        if let Some(v) = value {
            if v.chars().count() < min {
                self.add(
                    field,
                    format!("The {} must be at least {} characters.", field.replace('_', " "), min),
                );
            }
        }
    }

    /// Non-negative and within the stored precision, after rounding to cents
    pub fn money(&mut self, field: &str, value: Option<Decimal>) {
        if let Some(v) = value {
            if v.is_sign_negative() && !v.is_zero() {
                self.add(field, format!("The {} must be at least 0.", field.replace('_', " ")));
            } else if v.round_dp(2) > MAX_MONEY {
                self.add(
                    field,
                    format!("The {} must not be greater than {}.", field.replace('_', " "), MAX_MONEY),
                );
            }
        }
    }

    pub fn non_negative_int(&mut self, field: &str, value: Option<i32>) {
        if let Some(v) = value {
            if v < 0 {
                self.add(field, format!("The {} must be at least 0.", field.replace('_', " ")));
            }
        }
    }

    pub fn email(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            if !looks_like_email(v) {
                self.add(field, format!("The {} must be a valid email address.", field.replace('_', " ")));
            }
        }
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::unprocessable_entity(INVALID_DATA, self.0))
        }
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
