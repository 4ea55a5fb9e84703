use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::address::{AddressDetails, ShippingAddress};
use crate::errors::AppError;
use crate::handlers::session::Session;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddressRequest {
    pub receiver_name: String,
    pub phone: String,
    pub postal_code: String,
    pub road_address: String,
    pub detail_address: String,
    pub delivery_request: Option<String>,
}

impl From<AddressRequest> for AddressDetails {
    fn from(r: AddressRequest) -> Self {
        Self {
            receiver_name: r.receiver_name,
            phone: r.phone,
            postal_code: r.postal_code,
            road_address: r.road_address,
            detail_address: r.detail_address,
            delivery_request: r.delivery_request,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddressResponse {
    pub id: Uuid,
    pub receiver_name: String,
    pub phone: String,
    pub postal_code: String,
    pub road_address: String,
    pub detail_address: String,
    pub delivery_request: Option<String>,
    pub created_at: String,
}

impl From<ShippingAddress> for AddressResponse {
    fn from(a: ShippingAddress) -> Self {
        Self {
            id: a.id,
            receiver_name: a.details.receiver_name,
            phone: a.details.phone,
            postal_code: a.details.postal_code,
            road_address: a.details.road_address,
            detail_address: a.details.detail_address,
            delivery_request: a.details.delivery_request,
            created_at: a.created_at.to_rfc3339(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /api/addresses
#[utoipa::path(
    get,
    path = "/api/addresses",
    responses(
        (status = 200, description = "The session's addresses, newest first", body = Vec<AddressResponse>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "addresses"
)]
pub async fn list_addresses(
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let sid = session.id().clone();
    let addresses = web::block(move || state.addresses.list(&sid)).await??;

    let mut response = HttpResponse::Ok();
    session.attach(&mut response);
    Ok(response.json(
        addresses
            .into_iter()
            .map(AddressResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// POST /api/addresses
#[utoipa::path(
    post,
    path = "/api/addresses",
    request_body = AddressRequest,
    responses(
        (status = 201, description = "Address registered", body = AddressResponse),
        (status = 400, description = "A required field is missing"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "addresses"
)]
pub async fn register_address(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<AddressRequest>,
) -> Result<HttpResponse, AppError> {
    let sid = session.id().clone();
    let details = AddressDetails::from(body.into_inner());
    let address = web::block(move || state.addresses.register(&sid, details)).await??;

    let mut response = HttpResponse::Created();
    session.attach(&mut response);
    Ok(response.json(AddressResponse::from(address)))
}
