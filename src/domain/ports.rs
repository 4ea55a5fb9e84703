use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::address::{AddressDetails, ShippingAddress};
use super::cart::{CartLineItem, NewCartItem};
use super::errors::{DomainError, FollowUpError};
use super::estimate::StoredEstimate;
use super::order::{NewOrder, Order};
use super::session::SessionId;

pub trait CartStore {
    fn add_cart_item(
        &mut self,
        session: &SessionId,
        item: &NewCartItem,
    ) -> Result<CartLineItem, DomainError>;
    /// Newest first.
    fn cart_items(&mut self, session: &SessionId) -> Result<Vec<CartLineItem>, DomainError>;
    /// The subset of `ids` that belongs to the session; unknown ids are ignored.
    fn cart_items_by_ids(
        &mut self,
        session: &SessionId,
        ids: &[Uuid],
    ) -> Result<Vec<CartLineItem>, DomainError>;
    fn remove_cart_item(&mut self, session: &SessionId, id: Uuid) -> Result<bool, DomainError>;
    fn clear_cart(&mut self, session: &SessionId) -> Result<usize, DomainError>;
}

pub trait AddressStore {
    fn insert_address(
        &mut self,
        session: &SessionId,
        details: &AddressDetails,
    ) -> Result<ShippingAddress, DomainError>;
    /// Newest first.
    fn addresses(&mut self, session: &SessionId) -> Result<Vec<ShippingAddress>, DomainError>;
    fn find_address(
        &mut self,
        session: &SessionId,
        id: Uuid,
    ) -> Result<Option<ShippingAddress>, DomainError>;
}

/// At most one live estimate per session.
pub trait EstimateStore {
    /// Replace the session's estimate wholesale, creating it if absent.
    fn upsert_estimate(
        &mut self,
        session: &SessionId,
        estimate: &StoredEstimate,
    ) -> Result<(), DomainError>;
    /// Reads the estimate and locks it for the rest of the transaction.
    fn find_estimate(&mut self, session: &SessionId) -> Result<Option<StoredEstimate>, DomainError>;
    /// Deleting an absent estimate is not an error.
    fn delete_estimate(&mut self, session: &SessionId) -> Result<(), DomainError>;
}

pub trait OrderStore {
    fn order_number_taken(&mut self, order_number: &str) -> Result<bool, DomainError>;
    fn insert_order(&mut self, order: &NewOrder) -> Result<Order, DomainError>;
    fn find_order(&mut self, order_number: &str) -> Result<Option<Order>, DomainError>;
    /// Moves a PENDING order to PAID. `None` when no order with that number
    /// is still pending, so concurrent confirmations pay at most once.
    fn mark_paid(
        &mut self,
        order_number: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Order>, DomainError>;
}

pub trait UnitOfWork: CartStore + AddressStore + EstimateStore + OrderStore {}

impl<T: CartStore + AddressStore + EstimateStore + OrderStore> UnitOfWork for T {}

/// Runs a closure against the stores inside one transaction: everything the
/// closure wrote is committed if it returns `Ok` and rolled back otherwise.
pub trait Storage: Clone + Send + Sync + 'static {
    fn transaction<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, DomainError>;
}

/// Renders the printable quotation for a paid order.
pub trait QuotationWriter: Send + Sync {
    fn write(&self, order: &Order) -> Result<PathBuf, FollowUpError>;
}

/// Outbound operational channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn payment_completed(&self, order: &Order, quotation: &Path) -> Result<(), FollowUpError>;

    async fn internal_error(&self, message: &str, request_uri: &str) -> Result<(), FollowUpError>;
}
