pub mod memory;
pub mod models;
pub mod notifier;
pub mod pg_storage;
pub mod quotation;

use crate::domain::errors::DomainError;
use crate::domain::ports::{Storage, UnitOfWork};

pub use memory::InMemoryStorage;
pub use notifier::{LogNotifier, SlackNotifier};
pub use pg_storage::PgStorage;
pub use quotation::JsonQuotationWriter;

/// The storage selected at start-up: Postgres when a database URL is
/// configured, in-memory otherwise.
#[derive(Clone)]
pub enum StorageBackend {
    Postgres(PgStorage),
    Memory(InMemoryStorage),
}

impl StorageBackend {
    pub fn name(&self) -> &'static str {
        match self {
            StorageBackend::Postgres(_) => "postgres",
            StorageBackend::Memory(_) => "in-memory",
        }
    }
}

impl Storage for StorageBackend {
    fn transaction<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, DomainError>,
    {
        match self {
            StorageBackend::Postgres(storage) => storage.transaction(f),
            StorageBackend::Memory(storage) => storage.transaction(f),
        }
    }
}
