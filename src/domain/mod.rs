pub mod address;
pub mod cart;
pub mod errors;
pub mod estimate;
pub mod order;
pub mod ports;
pub mod pricing;
pub mod session;
