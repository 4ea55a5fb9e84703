use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use uuid::Uuid;

use super::address::AddressDetails;
use super::cart::CartLineItem;
use super::errors::DomainError;
use super::estimate::CostBreakdown;

pub const MAX_CUSTOMS_CODE_LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Paid,
    Canceled,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "PAID" => Ok(OrderStatus::Paid),
            "CANCELED" => Ok(OrderStatus::Canceled),
            "FAILED" => Ok(OrderStatus::Failed),
            other => Err(DomainError::Internal(format!("unknown order status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub product_name: String,
    pub price_krw: i64,
    pub quantity: i32,
    pub image_url: Option<String>,
}

impl From<&CartLineItem> for OrderItem {
    fn from(item: &CartLineItem) -> Self {
        Self {
            product_name: item.product_name.clone(),
            price_krw: item.price_krw.unwrap_or(0),
            // Cart lines have no quantity of their own.
            quantity: 1,
            image_url: item.image_url.clone(),
        }
    }
}

/// Everything needed to persist an order; the store assigns id and status.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub session_id: String,
    pub total_amount_krw: i64,
    pub customs_code: Option<String>,
    pub address: AddressDetails,
    pub breakdown: CostBreakdown,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

/// Immutable order snapshot. Only `status` and `paid_at` change after
/// creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub session_id: String,
    pub total_amount_krw: i64,
    pub status: OrderStatus,
    pub customs_code: Option<String>,
    pub address: AddressDetails,
    pub breakdown: CostBreakdown,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Produces order-number candidates. `attempt` starts at 0 and increases each
/// time the previous candidate was already taken.
pub trait OrderNumberGenerator: Send + Sync {
    fn candidate(&self, now: DateTime<Utc>, attempt: u32) -> String;

    /// Highest attempt the generator can produce a distinct candidate for.
    fn max_attempts(&self) -> u32;
}

/// Fourteen-digit `yyyyMMddHHmmss` stamp in a fixed offset; collisions within
/// the same second get a two-digit counter suffix (`…01` to `…99`).
#[derive(Debug, Clone, Copy)]
pub struct TimestampOrderNumbers {
    offset: FixedOffset,
}

impl TimestampOrderNumbers {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl OrderNumberGenerator for TimestampOrderNumbers {
    fn candidate(&self, now: DateTime<Utc>, attempt: u32) -> String {
        let stamp = now.with_timezone(&self.offset).format("%Y%m%d%H%M%S");
        if attempt == 0 {
            stamp.to_string()
        } else {
            format!("{stamp}{attempt:02}")
        }
    }

    fn max_attempts(&self) -> u32 {
        100
    }
}

fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Optional gates for the order lookup. A blank or absent value skips its
/// check entirely.
pub fn verify_identity(
    order: &Order,
    receiver: Option<&str>,
    phone: Option<&str>,
) -> Result<(), DomainError> {
    if let Some(receiver) = receiver.map(str::trim).filter(|r| !r.is_empty()) {
        if order.address.receiver_name.trim() != receiver {
            return Err(DomainError::IdentityMismatch("receiver name"));
        }
    }
    if let Some(phone) = phone.filter(|p| !p.trim().is_empty()) {
        if digits_only(&order.address.phone) != digits_only(phone) {
            return Err(DomainError::IdentityMismatch("phone number"));
        }
    }
    Ok(())
}
