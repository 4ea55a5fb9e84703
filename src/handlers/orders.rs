use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::checkout_service::{verify_customs_code, Confirmation};
use crate::domain::address::AddressDetails;
use crate::domain::estimate::CostBreakdown;
use crate::domain::order::{Order, OrderItem, OrderStatus};
use crate::errors::AppError;
use crate::handlers::session::Session;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// One of the session's registered addresses.
    pub address_id: Uuid,
    /// Personal customs clearance code, at most 20 characters.
    pub customs_code: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomsCodeRequest {
    pub customs_code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomsCodeResponse {
    pub valid: bool,
    /// The code as an order would store it; absent when invalid.
    pub customs_code: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderDetailQuery {
    /// Receiver name recorded on the order; checked when present.
    pub receiver: Option<String>,
    /// Phone number recorded on the order, compared by digits; checked when present.
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShippingSnapshotResponse {
    pub receiver_name: String,
    pub phone: String,
    pub postal_code: String,
    pub road_address: String,
    pub detail_address: String,
    pub delivery_request: Option<String>,
}

impl From<AddressDetails> for ShippingSnapshotResponse {
    fn from(a: AddressDetails) -> Self {
        Self {
            receiver_name: a.receiver_name,
            phone: a.phone,
            postal_code: a.postal_code,
            road_address: a.road_address,
            detail_address: a.detail_address,
            delivery_request: a.delivery_request,
        }
    }
}

/// Frozen cost breakdown; weights in grams and volume in cm³ as stored.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderCostsResponse {
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

impl From<CostBreakdown> for OrderCostsResponse {
    fn from(b: CostBreakdown) -> Self {
        Self {
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
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub product_name: String,
    pub price_krw: i64,
    pub quantity: i32,
    pub image_url: Option<String>,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(i: OrderItem) -> Self {
        Self {
            product_name: i.product_name,
            price_krw: i.price_krw,
            quantity: i.quantity,
            image_url: i.image_url,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub order_number: String,
    pub status: String,
    pub total_amount_krw: i64,
    pub customs_code: Option<String>,
    pub created_at: String,
    pub paid_at: Option<String>,
    pub shipping: ShippingSnapshotResponse,
    pub costs: OrderCostsResponse,
    pub items: Vec<OrderItemResponse>,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            order_number: o.order_number,
            status: o.status.to_string(),
            total_amount_krw: o.total_amount_krw,
            customs_code: o.customs_code,
            created_at: o.created_at.to_rfc3339(),
            paid_at: o.paid_at.map(|t| t.to_rfc3339()),
            shipping: o.address.into(),
            costs: o.breakdown.into(),
            items: o.items.into_iter().map(Into::into).collect(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/orders
///
/// Turns the session's stored estimate, cart and chosen address into an
/// order. The cart and estimate are consumed in the same transaction. When the
/// order is paid on creation the quotation and notification follow in the
/// background.
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Cart is empty or customs code is invalid"),
        (status = 404, description = "Address or estimate not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let sid = session.id().clone();
    let body = body.into_inner();

    let checkout_state = state.clone();
    let order = web::block(move || {
        checkout_state
            .checkout
            .promote(&sid, body.address_id, body.customs_code)
    })
    .await??;

    if order.status == OrderStatus::Paid {
        state.follow_up.spawn_order_paid(order.clone());
    }

    let mut response = HttpResponse::Created();
    session.attach(&mut response);
    Ok(response.json(OrderResponse::from(order)))
}

/// POST /api/orders/customs-code/verify
///
/// Checks the shape of a customs clearance code before checkout.
#[utoipa::path(
    post,
    path = "/api/orders/customs-code/verify",
    request_body = CustomsCodeRequest,
    responses(
        (status = 200, description = "Verification outcome", body = CustomsCodeResponse),
    ),
    tag = "orders"
)]
pub async fn verify_customs(body: web::Json<CustomsCodeRequest>) -> HttpResponse {
    let response = match verify_customs_code(&body.customs_code) {
        Ok(code) => CustomsCodeResponse {
            valid: true,
            customs_code: Some(code),
            message: None,
        },
        Err(e) => CustomsCodeResponse {
            valid: false,
            customs_code: None,
            message: Some(e.to_string()),
        },
    };
    HttpResponse::Ok().json(response)
}

/// GET /api/orders/{order_number}
///
/// Returns the frozen order. `receiver` and `phone` are optional gates: each
/// one is checked only when supplied.
#[utoipa::path(
    get,
    path = "/api/orders/{order_number}",
    params(
        ("order_number" = String, Path, description = "Order number"),
        OrderDetailQuery,
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 403, description = "Receiver or phone does not match"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<OrderDetailQuery>,
) -> Result<HttpResponse, AppError> {
    let order_number = path.into_inner();
    let query = query.into_inner();

    let order = web::block(move || {
        state.checkout.order_detail(
            &order_number,
            query.receiver.as_deref(),
            query.phone.as_deref(),
        )
    })
    .await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// POST /api/orders/{order_number}/payment
///
/// Marks a pending order as paid. Confirming an order that is already paid
/// returns it unchanged.
#[utoipa::path(
    post,
    path = "/api/orders/{order_number}/payment",
    params(
        ("order_number" = String, Path, description = "Order number"),
    ),
    responses(
        (status = 200, description = "Order is paid", body = OrderResponse),
        (status = 400, description = "Order can no longer be paid"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn confirm_payment(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order_number = path.into_inner();

    let checkout_state = state.clone();
    let confirmation =
        web::block(move || checkout_state.checkout.confirm_payment(&order_number)).await??;

    let order = match confirmation {
        Confirmation::Confirmed(order) => {
            state.follow_up.spawn_order_paid(order.clone());
            order
        }
        Confirmation::AlreadyPaid(order) => order,
    };

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
