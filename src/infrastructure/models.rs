use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::address::{AddressDetails, ShippingAddress};
use crate::domain::cart::CartLineItem;
use crate::domain::estimate::{CostBreakdown, StoredEstimate};
use crate::schema::{cart_estimates, cart_items, order_items, orders, shipping_addresses};

// ── Cart ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = cart_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItemRow {
    pub id: Uuid,
    pub session_id: String,
    pub product_name: String,
    pub price_krw: Option<i64>,
    pub image_url: Option<String>,
    pub source_url: Option<String>,
    pub weight_g: Option<f64>,
    pub volume_cm3: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartLineItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: row.id,
            product_name: row.product_name,
            price_krw: row.price_krw,
            image_url: row.image_url,
            source_url: row.source_url,
            weight_g: row.weight_g,
            volume_cm3: row.volume_cm3,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cart_items)]
pub struct NewCartItemRow<'a> {
    pub id: Uuid,
    pub session_id: &'a str,
    pub product_name: &'a str,
    pub price_krw: Option<i64>,
    pub image_url: Option<&'a str>,
    pub source_url: Option<&'a str>,
    pub weight_g: Option<f64>,
    pub volume_cm3: Option<f64>,
    pub created_at: DateTime<Utc>,
}

// ── Addresses ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = shipping_addresses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ShippingAddressRow {
    pub id: Uuid,
    pub session_id: String,
    pub receiver_name: String,
    pub phone: String,
    pub postal_code: String,
    pub road_address: String,
    pub detail_address: String,
    pub delivery_request: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ShippingAddressRow> for ShippingAddress {
    fn from(row: ShippingAddressRow) -> Self {
        Self {
            id: row.id,
            session_id: row.session_id,
            details: AddressDetails {
                receiver_name: row.receiver_name,
                phone: row.phone,
                postal_code: row.postal_code,
                road_address: row.road_address,
                detail_address: row.detail_address,
                delivery_request: row.delivery_request,
            },
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = shipping_addresses)]
pub struct NewShippingAddressRow<'a> {
    pub id: Uuid,
    pub session_id: &'a str,
    pub receiver_name: &'a str,
    pub phone: &'a str,
    pub postal_code: &'a str,
    pub road_address: &'a str,
    pub detail_address: &'a str,
    pub delivery_request: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

// ── Estimates ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = cart_estimates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartEstimateRow {
    pub item_ids: Vec<Uuid>,
    pub product_total_krw: i64,
    pub service_fee_krw: i64,
    pub total_actual_weight_g: f64,
    pub total_volume_cm3: f64,
    pub volumetric_weight_g: f64,
    pub chargeable_weight_g: f64,
    pub carrier_charge_jpy: i64,
    pub international_shipping_krw: i64,
    pub domestic_shipping_krw: i64,
    pub total_shipping_krw: i64,
    pub payment_fee_krw: i64,
    pub extra_packaging_fee_krw: i64,
    pub insurance_fee_krw: i64,
    pub grand_total_krw: i64,
    pub extra_packaging: bool,
    pub insurance: bool,
}

impl From<CartEstimateRow> for StoredEstimate {
    fn from(row: CartEstimateRow) -> Self {
        Self {
            item_ids: row.item_ids,
            breakdown: CostBreakdown {
                product_total_krw: row.product_total_krw,
                service_fee_krw: row.service_fee_krw,
                total_actual_weight_g: row.total_actual_weight_g,
                total_volume_cm3: row.total_volume_cm3,
                volumetric_weight_g: row.volumetric_weight_g,
                chargeable_weight_g: row.chargeable_weight_g,
                carrier_charge_jpy: row.carrier_charge_jpy,
                international_shipping_krw: row.international_shipping_krw,
                domestic_shipping_krw: row.domestic_shipping_krw,
                total_shipping_krw: row.total_shipping_krw,
                payment_fee_krw: row.payment_fee_krw,
                extra_packaging_fee_krw: row.extra_packaging_fee_krw,
                insurance_fee_krw: row.insurance_fee_krw,
                grand_total_krw: row.grand_total_krw,
                extra_packaging: row.extra_packaging,
                insurance: row.insurance,
            },
        }
    }
}

/// Columns written on both insert and conflict update of an estimate.
#[derive(Debug, Clone, Copy, Insertable, AsChangeset)]
#[diesel(table_name = cart_estimates)]
pub struct CartEstimateValues<'a> {
    pub item_ids: &'a [Uuid],
    pub product_total_krw: i64,
    pub service_fee_krw: i64,
    pub total_actual_weight_g: f64,
    pub total_volume_cm3: f64,
    pub volumetric_weight_g: f64,
    pub chargeable_weight_g: f64,
    pub carrier_charge_jpy: i64,
    pub international_shipping_krw: i64,
    pub domestic_shipping_krw: i64,
    pub total_shipping_krw: i64,
    pub payment_fee_krw: i64,
    pub extra_packaging_fee_krw: i64,
    pub insurance_fee_krw: i64,
    pub grand_total_krw: i64,
    pub extra_packaging: bool,
    pub insurance: bool,
    pub updated_at: DateTime<Utc>,
}

impl<'a> CartEstimateValues<'a> {
    pub fn new(estimate: &'a StoredEstimate, updated_at: DateTime<Utc>) -> Self {
        let b = &estimate.breakdown;
        Self {
            item_ids: &estimate.item_ids,
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
            updated_at,
        }
    }
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub session_id: String,
    pub total_amount_krw: i64,
    pub status: String,
    pub customs_code: Option<String>,
    pub receiver_name: String,
    pub phone: String,
    pub postal_code: String,
    pub road_address: String,
    pub detail_address: String,
    pub delivery_request: Option<String>,
    pub product_total_krw: i64,
    pub service_fee_krw: i64,
    pub total_actual_weight_g: f64,
    pub total_volume_cm3: f64,
    pub volumetric_weight_g: f64,
    pub chargeable_weight_g: f64,
    pub carrier_charge_jpy: i64,
    pub international_shipping_krw: i64,
    pub domestic_shipping_krw: i64,
    pub total_shipping_krw: i64,
    pub payment_fee_krw: i64,
    pub extra_packaging_fee_krw: i64,
    pub insurance_fee_krw: i64,
    pub grand_total_krw: i64,
    pub extra_packaging: bool,
    pub insurance: bool,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl OrderRow {
    pub fn address(&self) -> AddressDetails {
        AddressDetails {
            receiver_name: self.receiver_name.clone(),
            phone: self.phone.clone(),
            postal_code: self.postal_code.clone(),
            road_address: self.road_address.clone(),
            detail_address: self.detail_address.clone(),
            delivery_request: self.delivery_request.clone(),
        }
    }

    pub fn breakdown(&self) -> CostBreakdown {
        CostBreakdown {
            product_total_krw: self.product_total_krw,
            service_fee_krw: self.service_fee_krw,
            total_actual_weight_g: self.total_actual_weight_g,
            total_volume_cm3: self.total_volume_cm3,
            volumetric_weight_g: self.volumetric_weight_g,
            chargeable_weight_g: self.chargeable_weight_g,
            carrier_charge_jpy: self.carrier_charge_jpy,
            international_shipping_krw: self.international_shipping_krw,
            domestic_shipping_krw: self.domestic_shipping_krw,
            total_shipping_krw: self.total_shipping_krw,
            payment_fee_krw: self.payment_fee_krw,
            extra_packaging_fee_krw: self.extra_packaging_fee_krw,
            insurance_fee_krw: self.insurance_fee_krw,
            grand_total_krw: self.grand_total_krw,
            extra_packaging: self.extra_packaging,
            insurance: self.insurance,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow<'a> {
    pub id: Uuid,
    pub order_number: &'a str,
    pub session_id: &'a str,
    pub total_amount_krw: i64,
    pub status: &'a str,
    pub customs_code: Option<&'a str>,
    pub receiver_name: &'a str,
    pub phone: &'a str,
    pub postal_code: &'a str,
    pub road_address: &'a str,
    pub detail_address: &'a str,
    pub delivery_request: Option<&'a str>,
    pub product_total_krw: i64,
    pub service_fee_krw: i64,
    pub total_actual_weight_g: f64,
    pub total_volume_cm3: f64,
    pub volumetric_weight_g: f64,
    pub chargeable_weight_g: f64,
    pub carrier_charge_jpy: i64,
    pub international_shipping_krw: i64,
    pub domestic_shipping_krw: i64,
    pub total_shipping_krw: i64,
    pub payment_fee_krw: i64,
    pub extra_packaging_fee_krw: i64,
    pub insurance_fee_krw: i64,
    pub grand_total_krw: i64,
    pub extra_packaging: bool,
    pub insurance: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub product_name: String,
    pub price_krw: i64,
    pub quantity: i32,
    pub image_url: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow<'a> {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub product_name: &'a str,
    pub price_krw: i64,
    pub quantity: i32,
    pub image_url: Option<&'a str>,
}
