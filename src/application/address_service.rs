use crate::domain::address::{AddressDetails, ShippingAddress};
use crate::domain::errors::DomainError;
use crate::domain::ports::Storage;
use crate::domain::session::SessionId;

#[derive(Clone)]
pub struct AddressService<S> {
    storage: S,
}

impl<S: Storage> AddressService<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn register(
        &self,
        session: &SessionId,
        details: AddressDetails,
    ) -> Result<ShippingAddress, DomainError> {
        details.validate()?;
        self.storage
            .transaction(|uow| uow.insert_address(session, &details))
    }

    pub fn list(&self, session: &SessionId) -> Result<Vec<ShippingAddress>, DomainError> {
        self.storage.transaction(|uow| uow.addresses(session))
    }
}
