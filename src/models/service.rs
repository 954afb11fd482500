//! Service catalog models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

/// A bookable service. Services form a forest through `parent_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Service {
    pub id: i32,
    /// Parent service, if this is a sub-service
    pub parent_id: Option<i32>,
    pub name: String,
    pub description: String,
    /// Price, if the service is priced
    pub price: Option<f64>,
    /// Whether the price is shown to customers
    pub public_price: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker, `None` while the service is active
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Create or full-replace service request
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
#[validate(schema(function = "validate_price_is_finite"))]
pub struct ServiceInput {
    pub parent_id: Option<i32>,
    #[validate(length(
        min = 1,
        max = 100,
        message = "Service name must be between 1 and 100 characters"
    ))]
    pub name: String,
    #[validate(length(
        max = 300,
        message = "Service description must be at most 300 characters"
    ))]
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0.0, message = "Service price must not be negative"))]
    pub price: Option<f64>,
    #[serde(default)]
    pub public_price: bool,
}

impl ServiceInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent_id: i32) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_price(mut self, price: f64, public: bool) -> Self {
        self.price = Some(price);
        self.public_price = public;
        self
    }
}

/// NaN passes `range`, so non-finite prices are rejected here
fn validate_price_is_finite(input: &ServiceInput) -> Result<(), ValidationError> {
    match input.price {
        Some(price) if !price.is_finite() => Err(ValidationError::new("price")
            .with_message("Service price must be a finite number".into())),
        _ => Ok(()),
    }
}
