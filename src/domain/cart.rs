use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

/// Highest unit price accepted for a cart item.
pub const MAX_PRICE_KRW: i64 = 1_000_000_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct CartLineItem {
    pub id: Uuid,
    pub product_name: String,
    /// Unit price in KRW; items without a price contribute nothing.
    pub price_krw: Option<i64>,
    pub image_url: Option<String>,
    pub source_url: Option<String>,
    /// Measured weight in grams.
    pub weight_g: Option<f64>,
    /// Measured volume in cubic centimetres.
    pub volume_cm3: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCartItem {
    pub product_name: String,
    pub price_krw: Option<i64>,
    pub image_url: Option<String>,
    pub source_url: Option<String>,
    pub weight_g: Option<f64>,
    pub volume_cm3: Option<f64>,
}

impl NewCartItem {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.product_name.trim().is_empty() {
            return Err(DomainError::InvalidInput("product_name is required".to_string()));
        }
        if self.price_krw.is_some_and(|p| p < 0) {
            return Err(DomainError::InvalidInput("price_krw must not be negative".to_string()));
        }
        if self.price_krw.is_some_and(|p| p > MAX_PRICE_KRW) {
            return Err(DomainError::InvalidInput(format!(
                "price_krw must be at most {MAX_PRICE_KRW}"
            )));
        }
        for (field, value) in [("weight_g", self.weight_g), ("volume_cm3", self.volume_cm3)] {
            if value.is_some_and(|v| !v.is_finite() || v < 0.0) {
                return Err(DomainError::InvalidInput(format!(
                    "{field} must be a non-negative number"
                )));
            }
        }
        Ok(())
    }
}

/// Sum of the unit prices, treating missing prices as zero.
pub fn product_total(items: &[CartLineItem]) -> Result<i64, DomainError> {
    items
        .iter()
        .map(|i| i.price_krw.unwrap_or(0))
        .try_fold(0i64, |total, price| checked_krw_add(total, price))
}

/// Adds two KRW amounts, rejecting totals that do not fit in an `i64`.
pub fn checked_krw_add(a: i64, b: i64) -> Result<i64, DomainError> {
    a.checked_add(b)
        .ok_or_else(|| DomainError::InvalidInput("amount exceeds the supported range".to_string()))
}
