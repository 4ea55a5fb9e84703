use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::cart::product_total;
use crate::domain::errors::{DomainError, Resource};
use crate::domain::order::{
    verify_identity, NewOrder, Order, OrderItem, OrderNumberGenerator, OrderStatus,
    MAX_CUSTOMS_CODE_LEN,
};
use crate::domain::ports::{Storage, UnitOfWork};
use crate::domain::session::SessionId;

/// Whole-transaction retries when another promotion commits the same order
/// number between our availability check and our insert.
const PROMOTION_ATTEMPTS: u32 = 3;

/// Result of a payment confirmation.
#[derive(Debug, Clone, PartialEq)]
pub enum Confirmation {
    /// The order moved from PENDING to PAID just now.
    Confirmed(Order),
    /// The order had already been paid; nothing changed.
    AlreadyPaid(Order),
}

impl Confirmation {
    pub fn order(&self) -> &Order {
        match self {
            Confirmation::Confirmed(order) | Confirmation::AlreadyPaid(order) => order,
        }
    }
}

#[derive(Clone)]
pub struct CheckoutService<S> {
    storage: S,
    numbers: Arc<dyn OrderNumberGenerator>,
    auto_confirm_payment: bool,
}

impl<S: Storage> CheckoutService<S> {
    pub fn new(
        storage: S,
        numbers: Arc<dyn OrderNumberGenerator>,
        auto_confirm_payment: bool,
    ) -> Self {
        Self {
            storage,
            numbers,
            auto_confirm_payment,
        }
    }

    /// Freezes the session's stored estimate, cart and chosen address into an
    /// order. Either every step commits or none does.
    pub fn promote(
        &self,
        session: &SessionId,
        address_id: Uuid,
        customs_code: Option<String>,
    ) -> Result<Order, DomainError> {
        let customs_code = normalize_customs_code(customs_code)?;

        for attempt in 1..=PROMOTION_ATTEMPTS {
            match self.try_promote(session, address_id, customs_code.as_deref()) {
                Err(DomainError::DuplicateOrderNumber(number)) => {
                    log::warn!(
                        "Order number {} was taken concurrently (attempt {}/{})",
                        number,
                        attempt,
                        PROMOTION_ATTEMPTS
                    );
                }
                Ok(order) => {
                    log::info!(
                        "Created order {} for session {}: {} KRW, status {}",
                        order.order_number,
                        session,
                        order.total_amount_krw,
                        order.status
                    );
                    return Ok(order);
                }
                Err(other) => return Err(other),
            }
        }

        Err(DomainError::Internal(
            "could not allocate a unique order number".to_string(),
        ))
    }

    fn try_promote(
        &self,
        session: &SessionId,
        address_id: Uuid,
        customs_code: Option<&str>,
    ) -> Result<Order, DomainError> {
        self.storage.transaction(|uow| {
            let address = uow
                .find_address(session, address_id)?
                .ok_or(DomainError::NotFound(Resource::ShippingAddress))?;

            let cart = uow.cart_items(session)?;
            if cart.is_empty() {
                return Err(DomainError::EmptyCollection("cart is empty"));
            }

            let estimate = uow
                .find_estimate(session)?
                .ok_or(DomainError::NotFound(Resource::Estimate))?;

            let total_amount_krw = if estimate.breakdown.grand_total_krw > 0 {
                estimate.breakdown.grand_total_krw
            } else {
                product_total(&cart)?
            };

            let now = Utc::now();
            let order_number = self.allocate_order_number(uow, now)?;

            let draft = NewOrder {
                order_number,
                session_id: session.as_str().to_string(),
                total_amount_krw,
                customs_code: customs_code.map(str::to_string),
                address: address.details,
                breakdown: estimate.breakdown,
                items: cart.iter().map(OrderItem::from).collect(),
                created_at: now,
            };
            let order = uow.insert_order(&draft)?;

            uow.clear_cart(session)?;
            uow.delete_estimate(session)?;

            if self.auto_confirm_payment {
                uow.mark_paid(&order.order_number, Utc::now())?.ok_or_else(|| {
                    DomainError::Internal(format!(
                        "order {} was not pending after insert",
                        order.order_number
                    ))
                })
            } else {
                Ok(order)
            }
        })
    }

    fn allocate_order_number(
        &self,
        uow: &mut dyn UnitOfWork,
        now: DateTime<Utc>,
    ) -> Result<String, DomainError> {
        let mut candidate = self.numbers.candidate(now, 0);
        for attempt in 1..self.numbers.max_attempts() {
            if !uow.order_number_taken(&candidate)? {
                return Ok(candidate);
            }
            log::warn!("Order number {} already exists, trying a suffix", candidate);
            candidate = self.numbers.candidate(now, attempt);
        }
        if !uow.order_number_taken(&candidate)? {
            return Ok(candidate);
        }
        Err(DomainError::DuplicateOrderNumber(candidate))
    }

    /// Looks an order up by number. Blank or absent gates are skipped.
    pub fn order_detail(
        &self,
        order_number: &str,
        receiver: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Order, DomainError> {
        let order = self
            .storage
            .transaction(|uow| uow.find_order(order_number))?
            .ok_or(DomainError::NotFound(Resource::Order))?;
        verify_identity(&order, receiver, phone)?;
        Ok(order)
    }

    pub fn confirm_payment(&self, order_number: &str) -> Result<Confirmation, DomainError> {
        let confirmation = self.storage.transaction(|uow| {
            let order = uow
                .find_order(order_number)?
                .ok_or(DomainError::NotFound(Resource::Order))?;
            match order.status {
                OrderStatus::Pending => match uow.mark_paid(order_number, Utc::now())? {
                    Some(paid) => Ok(Confirmation::Confirmed(paid)),
                    // Another confirmation won the row; report what it left.
                    None => uow
                        .find_order(order_number)?
                        .filter(|o| o.status == OrderStatus::Paid)
                        .map(Confirmation::AlreadyPaid)
                        .ok_or_else(|| {
                            DomainError::InvalidInput(format!(
                                "order {order_number} can no longer be paid"
                            ))
                        }),
                },
                OrderStatus::Paid => Ok(Confirmation::AlreadyPaid(order)),
                status @ (OrderStatus::Canceled | OrderStatus::Failed) => Err(
                    DomainError::InvalidInput(format!(
                        "order {order_number} is {status} and cannot be paid"
                    )),
                ),
            }
        })?;

        if let Confirmation::Confirmed(order) = &confirmation {
            log::info!("Payment confirmed for order {}", order.order_number);
        }
        Ok(confirmation)
    }
}

/// Checks a personal customs clearance code the way promotion will store it.
/// Only shape is checked; there is no lookup against the customs service.
pub fn verify_customs_code(code: &str) -> Result<String, DomainError> {
    normalize_customs_code(Some(code.to_string()))?
        .ok_or_else(|| DomainError::InvalidInput("customs_code is required".to_string()))
}

fn normalize_customs_code(code: Option<String>) -> Result<Option<String>, DomainError> {
    let Some(code) = code.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    if code.chars().count() > MAX_CUSTOMS_CODE_LEN {
        return Err(DomainError::InvalidInput(format!(
            "customs_code must be at most {MAX_CUSTOMS_CODE_LEN} characters"
        )));
    }
    Ok(Some(code))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{FixedOffset, TimeZone};

    use super::*;
    use crate::application::cart_service::CartService;
    use crate::domain::address::AddressDetails;
    use crate::domain::cart::NewCartItem;
    use crate::domain::estimate::tests::stub_calculator;
    use crate::domain::estimate::EstimateOptions;
    use crate::domain::order::TimestampOrderNumbers;
    use crate::infrastructure::InMemoryStorage;

    /// Always proposes the same stamp, with the default counter suffixes.
    struct FrozenClockNumbers {
        max_attempts: u32,
        seen_attempts: Mutex<Vec<u32>>,
    }

    impl FrozenClockNumbers {
        fn new(max_attempts: u32) -> Self {
            Self {
                max_attempts,
                seen_attempts: Mutex::new(Vec::new()),
            }
        }
    }

    impl OrderNumberGenerator for FrozenClockNumbers {
        fn candidate(&self, _now: DateTime<Utc>, attempt: u32) -> String {
            self.seen_attempts.lock().unwrap().push(attempt);
            let frozen = Utc.with_ymd_and_hms(2025, 10, 24, 0, 30, 15).unwrap();
            TimestampOrderNumbers::new(FixedOffset::east_opt(9 * 3600).unwrap())
                .candidate(frozen, attempt)
        }

        fn max_attempts(&self) -> u32 {
            self.max_attempts
        }
    }

    struct Fixture {
        storage: InMemoryStorage,
        cart: CartService<InMemoryStorage>,
        sid: SessionId,
    }

    impl Fixture {
        fn new() -> Self {
            let storage = InMemoryStorage::new();
            Self {
                cart: CartService::new(storage.clone(), stub_calculator()),
                storage,
                sid: SessionId::parse("sid-checkout").unwrap(),
            }
        }

        fn checkout(&self, auto_confirm: bool) -> CheckoutService<InMemoryStorage> {
            CheckoutService::new(
                self.storage.clone(),
                Arc::new(FrozenClockNumbers::new(100)),
                auto_confirm,
            )
        }

        fn add(&self, price: i64) {
            self.cart
                .add_item(
                    &self.sid,
                    NewCartItem {
                        product_name: format!("item {price}"),
                        price_krw: Some(price),
                        image_url: None,
                        source_url: None,
                        weight_g: None,
                        volume_cm3: None,
                    },
                )
                .unwrap();
        }

        fn address_for(&self, session: &SessionId) -> Uuid {
            self.storage
                .transaction(|uow| {
                    uow.insert_address(
                        session,
                        &AddressDetails {
                            receiver_name: "Kim Minji".to_string(),
                            phone: "010-1234-5678".to_string(),
                            postal_code: "04524".to_string(),
                            road_address: "110 Sejong-daero".to_string(),
                            detail_address: "3F".to_string(),
                            delivery_request: None,
                        },
                    )
                })
                .unwrap()
                .id
        }

        fn estimate(&self) {
            self.cart
                .estimate(&self.sid, &[], EstimateOptions::default())
                .unwrap();
        }

        fn order_count(&self) -> usize {
            self.storage
                .transaction(|uow| {
                    Ok(["20251024093015", "2025102409301501", "2025102409301502"]
                        .iter()
                        .filter(|n| uow.order_number_taken(n).unwrap_or(false))
                        .count())
                })
                .unwrap()
        }
    }

    #[test]
    fn promotion_freezes_the_estimate_and_empties_the_session() {
        let f = Fixture::new();
        f.add(10000);
        f.add(20000);
        f.add(5000);
        let address = f.address_for(&f.sid);
        f.estimate();

        let order = f
            .checkout(true)
            .promote(&f.sid, address, Some(" P123456789012 ".to_string()))
            .unwrap();

        assert_eq!(order.order_number, "20251024093015");
        assert_eq!(order.status, OrderStatus::Paid);
        assert!(order.paid_at.is_some());
        assert_eq!(order.total_amount_krw, 51450);
        assert_eq!(order.breakdown.payment_fee_krw, 1700);
        assert_eq!(order.customs_code.as_deref(), Some("P123456789012"));
        assert_eq!(order.items.len(), 3);
        assert!(order.items.iter().all(|i| i.quantity == 1));
        assert_eq!(order.address.receiver_name, "Kim Minji");

        let (cart, estimate) = f
            .storage
            .transaction(|uow| Ok((uow.cart_items(&f.sid)?, uow.find_estimate(&f.sid)?)))
            .unwrap();
        assert!(cart.is_empty());
        assert!(estimate.is_none());
    }

    #[test]
    fn promotion_without_auto_confirm_stays_pending() {
        let f = Fixture::new();
        f.add(1000);
        let address = f.address_for(&f.sid);
        f.estimate();

        let order = f.checkout(false).promote(&f.sid, address, None).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.paid_at.is_none());
    }

    #[test]
    fn foreign_address_fails_without_side_effects() {
        let f = Fixture::new();
        f.add(1000);
        f.estimate();
        let foreign = f.address_for(&SessionId::parse("sid-other").unwrap());

        let result = f.checkout(true).promote(&f.sid, foreign, None);
        assert!(matches!(
            result,
            Err(DomainError::NotFound(Resource::ShippingAddress))
        ));
        assert_eq!(f.order_count(), 0);
        assert_eq!(f.cart.list(&f.sid).unwrap().items.len(), 1);
    }

    #[test]
    fn missing_estimate_fails_without_side_effects() {
        let f = Fixture::new();
        f.add(1000);
        let address = f.address_for(&f.sid);

        let result = f.checkout(true).promote(&f.sid, address, None);
        assert!(matches!(result, Err(DomainError::NotFound(Resource::Estimate))));
        assert_eq!(f.order_count(), 0);
        assert_eq!(f.cart.list(&f.sid).unwrap().items.len(), 1);
    }

    #[test]
    fn empty_cart_is_rejected() {
        let f = Fixture::new();
        let address = f.address_for(&f.sid);

        let result = f.checkout(true).promote(&f.sid, address, None);
        assert!(matches!(result, Err(DomainError::EmptyCollection("cart is empty"))));
    }

    #[test]
    fn overlong_customs_code_is_rejected() {
        let f = Fixture::new();
        f.add(1000);
        let address = f.address_for(&f.sid);
        f.estimate();

        let result = f
            .checkout(true)
            .promote(&f.sid, address, Some("X".repeat(MAX_CUSTOMS_CODE_LEN + 1)));
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
        assert_eq!(f.order_count(), 0);
    }

    #[test]
    fn same_second_promotions_get_counter_suffixes() {
        let f = Fixture::new();
        let checkout = f.checkout(true);
        let address = f.address_for(&f.sid);

        let mut numbers = Vec::new();
        for _ in 0..3 {
            f.add(1000);
            f.estimate();
            numbers.push(checkout.promote(&f.sid, address, None).unwrap().order_number);
        }
        assert_eq!(
            numbers,
            vec!["20251024093015", "2025102409301501", "2025102409301502"]
        );
    }

    #[test]
    fn exhausted_suffixes_are_retried_then_reported() {
        let f = Fixture::new();
        let address = f.address_for(&f.sid);
        f.add(1000);
        f.estimate();
        f.checkout(true).promote(&f.sid, address, None).unwrap();

        f.add(1000);
        f.estimate();
        let numbers = Arc::new(FrozenClockNumbers::new(1));
        let checkout = CheckoutService::new(f.storage.clone(), numbers.clone(), true);

        let result = checkout.promote(&f.sid, address, None);
        assert!(matches!(result, Err(DomainError::Internal(_))));
        // One candidate per transaction, every transaction retried.
        assert_eq!(
            numbers.seen_attempts.lock().unwrap().len(),
            PROMOTION_ATTEMPTS as usize
        );
        // The second cart and estimate survive the failed promotion.
        assert_eq!(f.cart.list(&f.sid).unwrap().items.len(), 1);
        assert!(f
            .storage
            .transaction(|uow| uow.find_estimate(&f.sid))
            .unwrap()
            .is_some());
    }

    #[test]
    fn order_detail_applies_identity_gates() {
        let f = Fixture::new();
        f.add(1000);
        let address = f.address_for(&f.sid);
        f.estimate();
        let checkout = f.checkout(true);
        let order = checkout.promote(&f.sid, address, None).unwrap();

        let found = checkout
            .order_detail(&order.order_number, Some(" Kim Minji "), Some("01012345678"))
            .unwrap();
        assert_eq!(found, order);
        assert!(matches!(
            checkout.order_detail(&order.order_number, Some("Park"), None),
            Err(DomainError::IdentityMismatch(_))
        ));
        assert!(matches!(
            checkout.order_detail("19990101000000", None, None),
            Err(DomainError::NotFound(Resource::Order))
        ));
    }

    #[test]
    fn confirm_payment_moves_pending_to_paid_once() {
        let f = Fixture::new();
        f.add(1000);
        let address = f.address_for(&f.sid);
        f.estimate();
        let checkout = f.checkout(false);
        let order = checkout.promote(&f.sid, address, None).unwrap();

        let first = checkout.confirm_payment(&order.order_number).unwrap();
        let Confirmation::Confirmed(paid) = &first else {
            panic!("expected a fresh confirmation, got {first:?}");
        };
        assert_eq!(paid.status, OrderStatus::Paid);
        assert!(paid.paid_at.is_some());

        let second = checkout.confirm_payment(&order.order_number).unwrap();
        assert_eq!(second, Confirmation::AlreadyPaid(paid.clone()));
    }

    #[test]
    fn confirm_payment_on_unknown_order_is_not_found() {
        let f = Fixture::new();
        let result = f.checkout(false).confirm_payment("nope");
        assert!(matches!(result, Err(DomainError::NotFound(Resource::Order))));
    }

    #[test]
    fn blank_customs_code_is_dropped() {
        assert_eq!(normalize_customs_code(Some("   ".to_string())).unwrap(), None);
        assert_eq!(normalize_customs_code(None).unwrap(), None);
    }

    #[test]
    fn customs_code_verification_trims_and_bounds() {
        assert_eq!(verify_customs_code("  P123456789012 ").unwrap(), "P123456789012");
        assert!(matches!(verify_customs_code("   "), Err(DomainError::InvalidInput(_))));
        assert!(matches!(
            verify_customs_code(&"P".repeat(MAX_CUSTOMS_CODE_LEN + 1)),
            Err(DomainError::InvalidInput(_))
        ));
    }
}
