use crate::application::address_service::AddressService;
use crate::application::cart_service::CartService;
use crate::application::checkout_service::CheckoutService;
use crate::application::follow_up::OrderFollowUp;
use crate::infrastructure::StorageBackend;

/// Services shared by every worker, registered as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub cart: CartService<StorageBackend>,
    pub addresses: AddressService<StorageBackend>,
    pub checkout: CheckoutService<StorageBackend>,
    pub follow_up: OrderFollowUp,
}
