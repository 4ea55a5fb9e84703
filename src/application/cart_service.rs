use uuid::Uuid;

use crate::domain::cart::{product_total, CartLineItem, NewCartItem};
use crate::domain::errors::{DomainError, Resource};
use crate::domain::estimate::{EstimateCalculator, EstimateOptions, StoredEstimate};
use crate::domain::ports::Storage;
use crate::domain::session::SessionId;

#[derive(Debug, Clone, PartialEq)]
pub struct CartView {
    pub items: Vec<CartLineItem>,
    pub product_total_krw: i64,
}

#[derive(Clone)]
pub struct CartService<S> {
    storage: S,
    calculator: EstimateCalculator,
}

impl<S: Storage> CartService<S> {
    pub fn new(storage: S, calculator: EstimateCalculator) -> Self {
        Self {
            storage,
            calculator,
        }
    }

    pub fn list(&self, session: &SessionId) -> Result<CartView, DomainError> {
        let items = self.storage.transaction(|uow| uow.cart_items(session))?;
        Ok(CartView {
            product_total_krw: product_total(&items)?,
            items,
        })
    }

    pub fn add_item(
        &self,
        session: &SessionId,
        item: NewCartItem,
    ) -> Result<CartLineItem, DomainError> {
        item.validate()?;
        self.storage
            .transaction(|uow| uow.add_cart_item(session, &item))
    }

    pub fn remove_item(&self, session: &SessionId, id: Uuid) -> Result<(), DomainError> {
        let removed = self
            .storage
            .transaction(|uow| uow.remove_cart_item(session, id))?;
        if !removed {
            return Err(DomainError::NotFound(Resource::CartItem));
        }
        Ok(())
    }

    /// Prices the selected items (or the whole cart when `item_ids` is empty)
    /// and replaces the session's stored estimate with the result.
    pub fn estimate(
        &self,
        session: &SessionId,
        item_ids: &[Uuid],
        options: EstimateOptions,
    ) -> Result<StoredEstimate, DomainError> {
        let stored = self.storage.transaction(|uow| {
            let items = if item_ids.is_empty() {
                let items = uow.cart_items(session)?;
                if items.is_empty() {
                    return Err(DomainError::EmptyCollection("cart is empty"));
                }
                items
            } else {
                let items = uow.cart_items_by_ids(session, item_ids)?;
                if items.is_empty() {
                    return Err(DomainError::EmptyCollection(
                        "selected items are not in the cart",
                    ));
                }
                items
            };

            let breakdown = self.calculator.estimate(&items, options)?;
            let stored = StoredEstimate {
                item_ids: items.iter().map(|i| i.id).collect(),
                breakdown,
            };
            uow.upsert_estimate(session, &stored)?;
            Ok(stored)
        })?;

        log::info!(
            "Stored estimate for session {}: {} items, grand total {} KRW",
            session,
            stored.item_ids.len(),
            stored.breakdown.grand_total_krw
        );
        Ok(stored)
    }
}
