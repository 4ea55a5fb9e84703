//! In-memory storage used when no database is configured and by the service
//! and handler tests.
//!
//! A transaction works on a clone of the whole state and swaps it in only
//! when the closure succeeds, so a failed unit of work leaves nothing behind.
//! The state lock is held for the duration of the closure, which serializes
//! transactions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::address::{AddressDetails, ShippingAddress};
use crate::domain::cart::{CartLineItem, NewCartItem};
use crate::domain::errors::DomainError;
use crate::domain::estimate::StoredEstimate;
use crate::domain::order::{NewOrder, Order, OrderStatus};
use crate::domain::ports::{
    AddressStore, CartStore, EstimateStore, OrderStore, Storage, UnitOfWork,
};
use crate::domain::session::SessionId;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    /// Insertion order; the newest entry is last.
    cart_items: Vec<(String, CartLineItem)>,
    addresses: Vec<ShippingAddress>,
    estimates: HashMap<String, StoredEstimate>,
    orders: Vec<Order>,
}

#[derive(Clone, Default)]
pub struct InMemoryStorage {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for InMemoryStorage {
    fn transaction<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, DomainError>,
    {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| DomainError::Internal("in-memory storage lock poisoned".to_string()))?;

        let mut working = guard.clone();
        let value = f(&mut working)?;
        *guard = working;
        Ok(value)
    }
}

impl CartStore for MemoryState {
    fn add_cart_item(
        &mut self,
        session: &SessionId,
        item: &NewCartItem,
    ) -> Result<CartLineItem, DomainError> {
        let line = CartLineItem {
            id: Uuid::new_v4(),
            product_name: item.product_name.trim().to_string(),
            price_krw: item.price_krw,
            image_url: item.image_url.clone(),
            source_url: item.source_url.clone(),
            weight_g: item.weight_g,
            volume_cm3: item.volume_cm3,
            created_at: Utc::now(),
        };
        self.cart_items
            .push((session.as_str().to_string(), line.clone()));
        Ok(line)
    }

    fn cart_items(&mut self, session: &SessionId) -> Result<Vec<CartLineItem>, DomainError> {
        Ok(self
            .cart_items
            .iter()
            .rev()
            .filter(|(owner, _)| owner == session.as_str())
            .map(|(_, line)| line.clone())
            .collect())
    }

    fn cart_items_by_ids(
        &mut self,
        session: &SessionId,
        ids: &[Uuid],
    ) -> Result<Vec<CartLineItem>, DomainError> {
        let mut lines = self.cart_items(session)?;
        lines.retain(|line| ids.contains(&line.id));
        Ok(lines)
    }

    fn remove_cart_item(&mut self, session: &SessionId, id: Uuid) -> Result<bool, DomainError> {
        let before = self.cart_items.len();
        self.cart_items
            .retain(|(owner, line)| !(owner == session.as_str() && line.id == id));
        Ok(self.cart_items.len() < before)
    }

    fn clear_cart(&mut self, session: &SessionId) -> Result<usize, DomainError> {
        let before = self.cart_items.len();
        self.cart_items.retain(|(owner, _)| owner != session.as_str());
        Ok(before - self.cart_items.len())
    }
}

impl AddressStore for MemoryState {
    fn insert_address(
        &mut self,
        session: &SessionId,
        details: &AddressDetails,
    ) -> Result<ShippingAddress, DomainError> {
        let address = ShippingAddress {
            id: Uuid::new_v4(),
            session_id: session.as_str().to_string(),
            details: AddressDetails {
                receiver_name: details.receiver_name.trim().to_string(),
                phone: details.phone.trim().to_string(),
                postal_code: details.postal_code.trim().to_string(),
                road_address: details.road_address.trim().to_string(),
                detail_address: details.detail_address.trim().to_string(),
                delivery_request: details.delivery_request.clone(),
            },
            created_at: Utc::now(),
        };
        self.addresses.push(address.clone());
        Ok(address)
    }

    fn addresses(&mut self, session: &SessionId) -> Result<Vec<ShippingAddress>, DomainError> {
        Ok(self
            .addresses
            .iter()
            .rev()
            .filter(|a| a.session_id == session.as_str())
            .cloned()
            .collect())
    }

    fn find_address(
        &mut self,
        session: &SessionId,
        id: Uuid,
    ) -> Result<Option<ShippingAddress>, DomainError> {
        Ok(self
            .addresses
            .iter()
            .find(|a| a.id == id && a.session_id == session.as_str())
            .cloned())
    }
}

impl EstimateStore for MemoryState {
    fn upsert_estimate(
        &mut self,
        session: &SessionId,
        estimate: &StoredEstimate,
    ) -> Result<(), DomainError> {
        self.estimates
            .insert(session.as_str().to_string(), estimate.clone());
        Ok(())
    }

    fn find_estimate(&mut self, session: &SessionId) -> Result<Option<StoredEstimate>, DomainError> {
        Ok(self.estimates.get(session.as_str()).cloned())
    }

    fn delete_estimate(&mut self, session: &SessionId) -> Result<(), DomainError> {
        self.estimates.remove(session.as_str());
        Ok(())
    }
}

impl OrderStore for MemoryState {
    fn order_number_taken(&mut self, order_number: &str) -> Result<bool, DomainError> {
        Ok(self.orders.iter().any(|o| o.order_number == order_number))
    }

    fn insert_order(&mut self, order: &NewOrder) -> Result<Order, DomainError> {
        if self.order_number_taken(&order.order_number)? {
            return Err(DomainError::DuplicateOrderNumber(order.order_number.clone()));
        }
        let created = Order {
            id: Uuid::new_v4(),
            order_number: order.order_number.clone(),
            session_id: order.session_id.clone(),
            total_amount_krw: order.total_amount_krw,
            status: OrderStatus::Pending,
            customs_code: order.customs_code.clone(),
            address: order.address.clone(),
            breakdown: order.breakdown.clone(),
            items: order.items.clone(),
            created_at: order.created_at,
            paid_at: None,
        };
        self.orders.push(created.clone());
        Ok(created)
    }

    fn find_order(&mut self, order_number: &str) -> Result<Option<Order>, DomainError> {
        Ok(self
            .orders
            .iter()
            .find(|o| o.order_number == order_number)
            .cloned())
    }

    fn mark_paid(
        &mut self,
        order_number: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Order>, DomainError> {
        let Some(order) = self
            .orders
            .iter_mut()
            .find(|o| o.order_number == order_number && o.status == OrderStatus::Pending)
        else {
            return Ok(None);
        };
        order.status = OrderStatus::Paid;
        order.paid_at = Some(paid_at);
        Ok(Some(order.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::estimate::tests::{item, stub_calculator};
    use crate::domain::estimate::EstimateOptions;

    fn session(raw: &str) -> SessionId {
        SessionId::parse(raw).unwrap()
    }

    fn new_item(name: &str) -> NewCartItem {
        NewCartItem {
            product_name: name.to_string(),
            price_krw: Some(500),
            image_url: None,
            source_url: None,
            weight_g: None,
            volume_cm3: None,
        }
    }

    fn estimate(price: i64) -> StoredEstimate {
        StoredEstimate {
            item_ids: vec![],
            breakdown: stub_calculator()
                .estimate(&[item(Some(price), None, None)], EstimateOptions::default())
                .unwrap(),
        }
    }

    #[test]
    fn failed_transaction_leaves_state_untouched() {
        let storage = InMemoryStorage::new();
        let sid = session("sid-1");

        let result: Result<(), DomainError> = storage.transaction(|uow| {
            uow.add_cart_item(&sid, &new_item("mug"))?;
            uow.upsert_estimate(&sid, &estimate(1000))?;
            Err(DomainError::Internal("boom".to_string()))
        });
        assert!(result.is_err());

        let (items, estimate) = storage
            .transaction(|uow| Ok((uow.cart_items(&sid)?, uow.find_estimate(&sid)?)))
            .unwrap();
        assert!(items.is_empty());
        assert!(estimate.is_none());
    }

    #[test]
    fn cart_lists_newest_first_per_session() {
        let storage = InMemoryStorage::new();
        let sid = session("sid-1");
        let other = session("sid-2");

        storage
            .transaction(|uow| {
                uow.add_cart_item(&sid, &new_item("first"))?;
                uow.add_cart_item(&other, &new_item("foreign"))?;
                uow.add_cart_item(&sid, &new_item("second"))
            })
            .unwrap();

        let names: Vec<String> = storage
            .transaction(|uow| uow.cart_items(&sid))
            .unwrap()
            .into_iter()
            .map(|i| i.product_name)
            .collect();
        assert_eq!(names, vec!["second", "first"]);

        let cleared = storage.transaction(|uow| uow.clear_cart(&sid)).unwrap();
        assert_eq!(cleared, 2);
        assert_eq!(storage.transaction(|uow| uow.cart_items(&other)).unwrap().len(), 1);
    }

    #[test]
    fn upsert_replaces_the_previous_estimate() {
        let storage = InMemoryStorage::new();
        let sid = session("sid-1");
        let second = estimate(9000);

        storage
            .transaction(|uow| {
                uow.upsert_estimate(&sid, &estimate(1000))?;
                uow.upsert_estimate(&sid, &second)
            })
            .unwrap();

        let state = storage.state.lock().unwrap();
        assert_eq!(state.estimates.len(), 1);
        assert_eq!(state.estimates.get("sid-1"), Some(&second));
    }

    #[test]
    fn duplicate_order_number_is_rejected() {
        let storage = InMemoryStorage::new();
        let breakdown = estimate(1000).breakdown;
        let draft = NewOrder {
            order_number: "20250101000000".to_string(),
            session_id: "sid-1".to_string(),
            total_amount_krw: breakdown.grand_total_krw,
            customs_code: None,
            address: AddressDetails {
                receiver_name: "Lee".to_string(),
                phone: "010".to_string(),
                postal_code: "1".to_string(),
                road_address: "road".to_string(),
                detail_address: "1F".to_string(),
                delivery_request: None,
            },
            breakdown,
            items: vec![],
            created_at: Utc::now(),
        };

        storage.transaction(|uow| uow.insert_order(&draft)).unwrap();
        let again = storage.transaction(|uow| uow.insert_order(&draft));
        assert!(matches!(again, Err(DomainError::DuplicateOrderNumber(_))));
    }

    #[test]
    fn mark_paid_on_unknown_order_changes_nothing() {
        let storage = InMemoryStorage::new();
        let result = storage.transaction(|uow| uow.mark_paid("nope", Utc::now()));
        assert!(matches!(result, Ok(None)));
    }
}
