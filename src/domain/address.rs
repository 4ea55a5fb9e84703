use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::errors::DomainError;

/// Delivery details. Also used as the frozen snapshot on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressDetails {
    pub receiver_name: String,
    pub phone: String,
    pub postal_code: String,
    pub road_address: String,
    pub detail_address: String,
    pub delivery_request: Option<String>,
}

impl AddressDetails {
    pub fn validate(&self) -> Result<(), DomainError> {
        let required = [
            ("receiver_name", &self.receiver_name),
            ("phone", &self.phone),
            ("postal_code", &self.postal_code),
            ("road_address", &self.road_address),
            ("detail_address", &self.detail_address),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DomainError::InvalidInput(format!("{field} is required")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingAddress {
    pub id: Uuid,
    pub session_id: String,
    pub details: AddressDetails,
    pub created_at: DateTime<Utc>,
}
