pub mod addresses;
pub mod cart;
pub mod orders;
pub mod session;

use actix_web::dev::ServiceResponse;
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::web;
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        cart::list_cart,
        cart::add_item,
        cart::remove_item,
        cart::estimate,
        addresses::list_addresses,
        addresses::register_address,
        orders::create_order,
        orders::verify_customs,
        orders::get_order,
        orders::confirm_payment,
    ),
    components(schemas(
        cart::AddCartItemRequest,
        cart::CartItemResponse,
        cart::CartResponse,
        cart::EstimateRequest,
        cart::EstimateResponse,
        addresses::AddressRequest,
        addresses::AddressResponse,
        orders::CreateOrderRequest,
        orders::CustomsCodeRequest,
        orders::CustomsCodeResponse,
        orders::OrderResponse,
        orders::OrderItemResponse,
        orders::OrderCostsResponse,
        orders::ShippingSnapshotResponse,
    )),
    tags(
        (name = "cart", description = "Session cart and shipping estimates"),
        (name = "addresses", description = "Shipping addresses"),
        (name = "orders", description = "Checkout and order lookup"),
    )
)]
pub struct ApiDoc;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/cart")
                    .route("", web::get().to(cart::list_cart))
                    .route("/items", web::post().to(cart::add_item))
                    .route("/items/{id}", web::delete().to(cart::remove_item))
                    .route("/estimate", web::post().to(cart::estimate)),
            )
            .service(
                web::scope("/addresses")
                    .route("", web::get().to(addresses::list_addresses))
                    .route("", web::post().to(addresses::register_address)),
            )
            .service(
                web::scope("/orders")
                    .route("", web::post().to(orders::create_order))
                    .route(
                        "/customs-code/verify",
                        web::post().to(orders::verify_customs),
                    )
                    .route("/{order_number}", web::get().to(orders::get_order))
                    .route(
                        "/{order_number}/payment",
                        web::post().to(orders::confirm_payment),
                    ),
            ),
    );
}

/// Forwards every 500 to the operator channel in the background; the response
/// itself is passed through untouched.
pub fn alert_internal_error<B>(
    res: ServiceResponse<B>,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    if let Some(state) = res.request().app_data::<web::Data<AppState>>() {
        let message = res
            .response()
            .error()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Internal server error".to_string());
        let uri = res.request().uri().to_string();
        log::error!("{} {} returned 500: {}", res.request().method(), uri, message);
        state.follow_up.spawn_internal_error(message, uri);
    }
    Ok(ErrorHandlerResponse::Response(res.map_into_left_body()))
}


#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::middleware::ErrorHandlers;
    use actix_web::{test, App, HttpResponse};

    use super::test_support::{test_app, test_state};
    use super::*;
    use crate::errors::AppError;

    async fn failing() -> Result<HttpResponse, AppError> {
        Err(AppError::Internal("storage offline".to_string()))
    }

    #[actix_web::test]
    async fn internal_errors_pass_through_the_alert_hook() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state(true)))
                .wrap(
                    ErrorHandlers::new()
                        .handler(StatusCode::INTERNAL_SERVER_ERROR, alert_internal_error),
                )
                .route("/boom", web::get().to(failing)),
        )
        .await;

        let req = test::TestRequest::get().uri("/boom").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[actix_web::test]
    async fn unknown_routes_are_not_found() {
        let app = test::init_service(test_app()).await;
        let req = test::TestRequest::get().uri("/api/nothing").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[::core::prelude::v1::test]
    fn openapi_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        for path in [
            "/api/cart",
            "/api/cart/items",
            "/api/cart/items/{id}",
            "/api/cart/estimate",
            "/api/addresses",
            "/api/orders",
            "/api/orders/{order_number}",
            "/api/orders/{order_number}/payment",
            "/api/orders/customs-code/verify",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
    }
}
