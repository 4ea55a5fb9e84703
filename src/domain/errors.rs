use std::fmt;

use thiserror::Error;

/// The record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    CartItem,
    ShippingAddress,
    Estimate,
    Order,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::CartItem => "Cart item",
            Resource::ShippingAddress => "Shipping address",
            Resource::Estimate => "Estimate",
            Resource::Order => "Order",
        })
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("{0} not found")]
    NotFound(Resource),
    #[error("Nothing to process: {0}")]
    EmptyCollection(&'static str),
    #[error("Identity verification failed: {0} does not match")]
    IdentityMismatch(&'static str),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
    /// Another transaction committed the same order number first.
    #[error("Order number {0} is already taken")]
    DuplicateOrderNumber(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures of the best-effort steps that run after an order commits.
#[derive(Debug, Error)]
pub enum FollowUpError {
    #[error("quotation could not be written: {0}")]
    Artifact(String),
    #[error("notification could not be delivered: {0}")]
    Delivery(String),
}
