use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::address::{AddressDetails, ShippingAddress};
use crate::domain::cart::{CartLineItem, NewCartItem};
use crate::domain::errors::DomainError;
use crate::domain::estimate::StoredEstimate;
use crate::domain::order::{NewOrder, Order, OrderItem, OrderStatus};
use crate::domain::ports::{
    AddressStore, CartStore, EstimateStore, OrderStore, Storage, UnitOfWork,
};
use crate::domain::session::SessionId;
use crate::schema::{cart_estimates, cart_items, order_items, orders, shipping_addresses};

use super::models::{
    CartEstimateRow, CartEstimateValues, CartItemRow, NewCartItemRow, NewOrderItemRow,
    NewOrderRow, NewShippingAddressRow, OrderItemRow, OrderRow, ShippingAddressRow,
};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Storage ──────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct PgStorage {
    pool: DbPool,
}

impl PgStorage {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl Storage for PgStorage {
    fn transaction<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, DomainError>,
    {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let mut uow = PgUnitOfWork { conn };
            f(&mut uow)
        })
    }
}

/// Store operations bound to one open transaction.
pub struct PgUnitOfWork<'c> {
    conn: &'c mut PgConnection,
}

impl PgUnitOfWork<'_> {
    fn load_order(&mut self, row: OrderRow) -> Result<Order, DomainError> {
        let items = order_items::table
            .filter(order_items::order_id.eq(row.id))
            .order(order_items::position.asc())
            .select(OrderItemRow::as_select())
            .load(self.conn)?;

        Ok(Order {
            id: row.id,
            status: row.status.parse()?,
            address: row.address(),
            breakdown: row.breakdown(),
            order_number: row.order_number,
            session_id: row.session_id,
            total_amount_krw: row.total_amount_krw,
            customs_code: row.customs_code,
            created_at: row.created_at,
            paid_at: row.paid_at,
            items: items
                .into_iter()
                .map(|i| OrderItem {
                    product_name: i.product_name,
                    price_krw: i.price_krw,
                    quantity: i.quantity,
                    image_url: i.image_url,
                })
                .collect(),
        })
    }
}

impl CartStore for PgUnitOfWork<'_> {
    fn add_cart_item(
        &mut self,
        session: &SessionId,
        item: &NewCartItem,
    ) -> Result<CartLineItem, DomainError> {
        let row = diesel::insert_into(cart_items::table)
            .values(&NewCartItemRow {
                id: Uuid::new_v4(),
                session_id: session.as_str(),
                product_name: item.product_name.trim(),
                price_krw: item.price_krw,
                image_url: item.image_url.as_deref(),
                source_url: item.source_url.as_deref(),
                weight_g: item.weight_g,
                volume_cm3: item.volume_cm3,
                created_at: Utc::now(),
            })
            .returning(CartItemRow::as_returning())
            .get_result(self.conn)?;
        Ok(row.into())
    }

    fn cart_items(&mut self, session: &SessionId) -> Result<Vec<CartLineItem>, DomainError> {
        let rows = cart_items::table
            .filter(cart_items::session_id.eq(session.as_str()))
            .order((cart_items::created_at.desc(), cart_items::id.asc()))
            .select(CartItemRow::as_select())
            .load(self.conn)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn cart_items_by_ids(
        &mut self,
        session: &SessionId,
        ids: &[Uuid],
    ) -> Result<Vec<CartLineItem>, DomainError> {
        let rows = cart_items::table
            .filter(cart_items::session_id.eq(session.as_str()))
            .filter(cart_items::id.eq_any(ids))
            .order((cart_items::created_at.desc(), cart_items::id.asc()))
            .select(CartItemRow::as_select())
            .load(self.conn)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn remove_cart_item(&mut self, session: &SessionId, id: Uuid) -> Result<bool, DomainError> {
        let deleted = diesel::delete(
            cart_items::table
                .filter(cart_items::session_id.eq(session.as_str()))
                .filter(cart_items::id.eq(id)),
        )
        .execute(self.conn)?;
        Ok(deleted > 0)
    }

    fn clear_cart(&mut self, session: &SessionId) -> Result<usize, DomainError> {
        let deleted =
            diesel::delete(cart_items::table.filter(cart_items::session_id.eq(session.as_str())))
                .execute(self.conn)?;
        Ok(deleted)
    }
}

impl AddressStore for PgUnitOfWork<'_> {
    fn insert_address(
        &mut self,
        session: &SessionId,
        details: &AddressDetails,
    ) -> Result<ShippingAddress, DomainError> {
        let row = diesel::insert_into(shipping_addresses::table)
            .values(&NewShippingAddressRow {
                id: Uuid::new_v4(),
                session_id: session.as_str(),
                receiver_name: details.receiver_name.trim(),
                phone: details.phone.trim(),
                postal_code: details.postal_code.trim(),
                road_address: details.road_address.trim(),
                detail_address: details.detail_address.trim(),
                delivery_request: details.delivery_request.as_deref(),
                created_at: Utc::now(),
            })
            .returning(ShippingAddressRow::as_returning())
            .get_result(self.conn)?;
        Ok(row.into())
    }

    fn addresses(&mut self, session: &SessionId) -> Result<Vec<ShippingAddress>, DomainError> {
        let rows = shipping_addresses::table
            .filter(shipping_addresses::session_id.eq(session.as_str()))
            .order(shipping_addresses::created_at.desc())
            .select(ShippingAddressRow::as_select())
            .load(self.conn)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn find_address(
        &mut self,
        session: &SessionId,
        id: Uuid,
    ) -> Result<Option<ShippingAddress>, DomainError> {
        let row = shipping_addresses::table
            .filter(shipping_addresses::id.eq(id))
            .filter(shipping_addresses::session_id.eq(session.as_str()))
            .select(ShippingAddressRow::as_select())
            .first(self.conn)
            .optional()?;
        Ok(row.map(Into::into))
    }
}

impl EstimateStore for PgUnitOfWork<'_> {
    fn upsert_estimate(
        &mut self,
        session: &SessionId,
        estimate: &StoredEstimate,
    ) -> Result<(), DomainError> {
        // The unique index on session_id turns a concurrent second insert
        // into an update of the winner's row.
        let values = CartEstimateValues::new(estimate, Utc::now());
        diesel::insert_into(cart_estimates::table)
            .values((
                cart_estimates::id.eq(Uuid::new_v4()),
                cart_estimates::session_id.eq(session.as_str()),
                values,
            ))
            .on_conflict(cart_estimates::session_id)
            .do_update()
            .set(values)
            .execute(self.conn)?;
        Ok(())
    }

    fn find_estimate(&mut self, session: &SessionId) -> Result<Option<StoredEstimate>, DomainError> {
        let row = cart_estimates::table
            .filter(cart_estimates::session_id.eq(session.as_str()))
            .select(CartEstimateRow::as_select())
            .for_update()
            .first(self.conn)
            .optional()?;
        Ok(row.map(Into::into))
    }

    fn delete_estimate(&mut self, session: &SessionId) -> Result<(), DomainError> {
        diesel::delete(
            cart_estimates::table.filter(cart_estimates::session_id.eq(session.as_str())),
        )
        .execute(self.conn)?;
        Ok(())
    }
}

impl OrderStore for PgUnitOfWork<'_> {
    fn order_number_taken(&mut self, order_number: &str) -> Result<bool, DomainError> {
        let taken = diesel::select(diesel::dsl::exists(
            orders::table.filter(orders::order_number.eq(order_number)),
        ))
        .get_result(self.conn)?;
        Ok(taken)
    }

    fn insert_order(&mut self, order: &NewOrder) -> Result<Order, DomainError> {
        let order_id = Uuid::new_v4();
        let b = &order.breakdown;
        let a = &order.address;

        // 1. Insert the order
        let row = diesel::insert_into(orders::table)
            .values(&NewOrderRow {
                id: order_id,
                order_number: &order.order_number,
                session_id: &order.session_id,
                total_amount_krw: order.total_amount_krw,
                status: OrderStatus::Pending.as_str(),
                customs_code: order.customs_code.as_deref(),
                receiver_name: &a.receiver_name,
                phone: &a.phone,
                postal_code: &a.postal_code,
                road_address: &a.road_address,
                detail_address: &a.detail_address,
                delivery_request: a.delivery_request.as_deref(),
                product_total_krw: b.product_total_krw,
                service_fee_krw: b.service_fee_krw,
                total_actual_weight_g: b.total_actual_weight_g,
                total_volume_cm3: b.total_volume_cm3,
                volumetric_weight_g: b.volumetric_weight_g,
                chargeable_weight_g: b.chargeable_weight_g,
                carrier_charge_jpy: b.carrier_charge_jpy,
                international_shipping_krw: b.international_shipping_krw,
                domestic_shipping_krw: b.domestic_shipping_krw,
                total_shipping_krw: b.total_shipping_krw,
                payment_fee_krw: b.payment_fee_krw,
                extra_packaging_fee_krw: b.extra_packaging_fee_krw,
                insurance_fee_krw: b.insurance_fee_krw,
                grand_total_krw: b.grand_total_krw,
                extra_packaging: b.extra_packaging,
                insurance: b.insurance,
                created_at: order.created_at,
            })
            .returning(OrderRow::as_returning())
            .get_result(self.conn)
            .map_err(|e| match e {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    DomainError::DuplicateOrderNumber(order.order_number.clone())
                }
                other => other.into(),
            })?;

        // 2. Insert the item snapshots
        let new_items: Vec<NewOrderItemRow> = order
            .items
            .iter()
            .enumerate()
            .map(|(position, item)| NewOrderItemRow {
                id: Uuid::new_v4(),
                order_id,
                position: position as i32,
                product_name: &item.product_name,
                price_krw: item.price_krw,
                quantity: item.quantity,
                image_url: item.image_url.as_deref(),
            })
            .collect();
        diesel::insert_into(order_items::table)
            .values(&new_items)
            .execute(self.conn)?;

        self.load_order(row)
    }

    fn find_order(&mut self, order_number: &str) -> Result<Option<Order>, DomainError> {
        let row = orders::table
            .filter(orders::order_number.eq(order_number))
            .select(OrderRow::as_select())
            .first(self.conn)
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };
        self.load_order(row).map(Some)
    }

    fn mark_paid(
        &mut self,
        order_number: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Order>, DomainError> {
        // The status filter is re-checked after a concurrent writer commits.
        let row = diesel::update(
            orders::table
                .filter(orders::order_number.eq(order_number))
                .filter(orders::status.eq(OrderStatus::Pending.as_str())),
        )
        .set((
            orders::status.eq(OrderStatus::Paid.as_str()),
            orders::paid_at.eq(Some(paid_at)),
        ))
        .returning(OrderRow::as_returning())
        .get_result(self.conn)
        .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };
        self.load_order(row).map(Some)
    }
}
