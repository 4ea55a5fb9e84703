pub mod address_service;
pub mod cart_service;
pub mod checkout_service;
pub mod follow_up;
