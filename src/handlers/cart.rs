use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::cart_service::CartView;
use crate::domain::cart::{CartLineItem, NewCartItem};
use crate::domain::estimate::{EstimateOptions, StoredEstimate};
use crate::errors::AppError;
use crate::handlers::session::Session;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCartItemRequest {
    pub product_name: String,
    /// Unit price in KRW.
    pub price_krw: Option<i64>,
    pub image_url: Option<String>,
    pub source_url: Option<String>,
    /// Measured weight in grams.
    pub weight_g: Option<f64>,
    /// Measured volume in cm³.
    pub volume_cm3: Option<f64>,
}

impl From<AddCartItemRequest> for NewCartItem {
    fn from(r: AddCartItemRequest) -> Self {
        Self {
            product_name: r.product_name,
            price_krw: r.price_krw,
            image_url: r.image_url,
            source_url: r.source_url,
            weight_g: r.weight_g,
            volume_cm3: r.volume_cm3,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItemResponse {
    pub id: Uuid,
    pub product_name: String,
    pub price_krw: Option<i64>,
    pub image_url: Option<String>,
    pub source_url: Option<String>,
    pub weight_g: Option<f64>,
    pub volume_cm3: Option<f64>,
    pub created_at: String,
}

impl From<CartLineItem> for CartItemResponse {
    fn from(i: CartLineItem) -> Self {
        Self {
            id: i.id,
            product_name: i.product_name,
            price_krw: i.price_krw,
            image_url: i.image_url,
            source_url: i.source_url,
            weight_g: i.weight_g,
            volume_cm3: i.volume_cm3,
            created_at: i.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartResponse {
    /// Newest first.
    pub items: Vec<CartItemResponse>,
    pub product_total_krw: i64,
}

impl From<CartView> for CartResponse {
    fn from(v: CartView) -> Self {
        Self {
            items: v.items.into_iter().map(Into::into).collect(),
            product_total_krw: v.product_total_krw,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct EstimateRequest {
    /// Items to price; absent or empty prices the whole cart.
    #[serde(default)]
    pub item_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub extra_packaging: bool,
    #[serde(default)]
    pub insurance: bool,
}

/// Weights in kilograms and volume in cubic metres; amounts in KRW unless
/// noted.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EstimateResponse {
    pub item_ids: Vec<Uuid>,
    pub product_total_krw: i64,
    pub service_fee_krw: i64,
    pub total_actual_weight_kg: f64,
    pub total_volume_m3: f64,
    pub volumetric_weight_kg: f64,
    pub chargeable_weight_kg: f64,
    /// Carrier charge in JPY.
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

impl From<StoredEstimate> for EstimateResponse {
    fn from(e: StoredEstimate) -> Self {
        let b = e.breakdown;
        Self {
            item_ids: e.item_ids,
            product_total_krw: b.product_total_krw,
            service_fee_krw: b.service_fee_krw,
            total_actual_weight_kg: b.total_actual_weight_g / 1000.0,
            total_volume_m3: b.total_volume_cm3 / 1_000_000.0,
            volumetric_weight_kg: b.volumetric_weight_g / 1000.0,
            chargeable_weight_kg: b.chargeable_weight_kg(),
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

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /api/cart
#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart items and product total", body = CartResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn list_cart(
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let sid = session.id().clone();
    let cart = web::block(move || state.cart.list(&sid)).await??;

    let mut response = HttpResponse::Ok();
    session.attach(&mut response);
    Ok(response.json(CartResponse::from(cart)))
}

/// POST /api/cart/items
#[utoipa::path(
    post,
    path = "/api/cart/items",
    request_body = AddCartItemRequest,
    responses(
        (status = 201, description = "Item added", body = CartItemResponse),
        (status = 400, description = "Invalid item"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn add_item(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<AddCartItemRequest>,
) -> Result<HttpResponse, AppError> {
    let sid = session.id().clone();
    let item = NewCartItem::from(body.into_inner());
    let created = web::block(move || state.cart.add_item(&sid, item)).await??;

    let mut response = HttpResponse::Created();
    session.attach(&mut response);
    Ok(response.json(CartItemResponse::from(created)))
}

/// DELETE /api/cart/items/{id}
#[utoipa::path(
    delete,
    path = "/api/cart/items/{id}",
    params(
        ("id" = Uuid, Path, description = "Cart item UUID"),
    ),
    responses(
        (status = 204, description = "Item removed"),
        (status = 404, description = "Cart item not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn remove_item(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let sid = session.id().clone();
    let id = path.into_inner();
    web::block(move || state.cart.remove_item(&sid, id)).await??;

    let mut response = HttpResponse::NoContent();
    session.attach(&mut response);
    Ok(response.finish())
}

/// POST /api/cart/estimate
///
/// Prices the selected items (or the whole cart) and stores the result as the
/// session's current estimate, replacing any earlier one.
#[utoipa::path(
    post,
    path = "/api/cart/estimate",
    request_body = EstimateRequest,
    responses(
        (status = 200, description = "Estimate computed and stored", body = EstimateResponse),
        (status = 400, description = "Nothing to estimate or parcel too heavy"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn estimate(
    state: web::Data<AppState>,
    session: Session,
    body: Option<web::Json<EstimateRequest>>,
) -> Result<HttpResponse, AppError> {
    let sid = session.id().clone();
    let request = body.map(web::Json::into_inner).unwrap_or_default();
    let item_ids = request.item_ids.unwrap_or_default();
    let options = EstimateOptions {
        extra_packaging: request.extra_packaging,
        insurance: request.insurance,
    };

    let stored = web::block(move || state.cart.estimate(&sid, &item_ids, options)).await??;

    let mut response = HttpResponse::Ok();
    session.attach(&mut response);
    Ok(response.json(EstimateResponse::from(stored)))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;

    use super::*;
    use crate::handlers::session::{SESSION_COOKIE, SESSION_HEADER};
    use crate::handlers::test_support::test_app;

    fn add_request(name: &str, price: i64) -> serde_json::Value {
        serde_json::json!({ "product_name": name, "price_krw": price })
    }

    #[actix_web::test]
    async fn new_visitor_gets_a_session_cookie() {
        let app = test::init_service(test_app()).await;
        let req = test::TestRequest::get().uri("/api/cart").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp
            .response()
            .cookies()
            .any(|c| c.name() == SESSION_COOKIE && c.value().starts_with("sid-")));
    }

    #[actix_web::test]
    async fn added_items_are_listed_with_total() {
        let app = test::init_service(test_app()).await;
        for (name, price) in [("pen", 1000), ("ink", 2500)] {
            let req = test::TestRequest::post()
                .uri("/api/cart/items")
                .insert_header((SESSION_HEADER, "sid-cart"))
                .set_json(add_request(name, price))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get()
            .uri("/api/cart")
            .insert_header((SESSION_HEADER, "sid-cart"))
            .to_request();
        let cart: CartResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(cart.product_total_krw, 3500);
        assert_eq!(cart.items[0].product_name, "ink");
    }

    #[actix_web::test]
    async fn invalid_item_is_a_bad_request() {
        let app = test::init_service(test_app()).await;
        let req = test::TestRequest::post()
            .uri("/api/cart/items")
            .insert_header((SESSION_HEADER, "sid-cart"))
            .set_json(serde_json::json!({ "product_name": "pen", "price_krw": -1 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn removing_unknown_item_is_not_found() {
        let app = test::init_service(test_app()).await;
        let req = test::TestRequest::delete()
            .uri(&format!("/api/cart/items/{}", Uuid::new_v4()))
            .insert_header((SESSION_HEADER, "sid-cart"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn estimate_reports_kilograms_and_cubic_metres() {
        let app = test::init_service(test_app()).await;
        for price in [10000, 20000, 5000] {
            let req = test::TestRequest::post()
                .uri("/api/cart/items")
                .insert_header((SESSION_HEADER, "sid-est"))
                .set_json(add_request("item", price))
                .to_request();
            test::call_service(&app, req).await;
        }

        let req = test::TestRequest::post()
            .uri("/api/cart/estimate")
            .insert_header((SESSION_HEADER, "sid-est"))
            .set_json(serde_json::json!({}))
            .to_request();
        let est: EstimateResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(est.item_ids.len(), 3);
        assert!((est.chargeable_weight_kg - 0.078).abs() < 1e-9);
        assert!((est.total_volume_m3 - 0.0001209).abs() < 1e-12);
        assert_eq!(est.grand_total_krw, 51450);
    }

    #[actix_web::test]
    async fn estimate_of_empty_cart_is_a_bad_request() {
        let app = test::init_service(test_app()).await;
        let req = test::TestRequest::post()
            .uri("/api/cart/estimate")
            .insert_header((SESSION_HEADER, "sid-empty"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
