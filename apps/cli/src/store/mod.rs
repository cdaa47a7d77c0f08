//! Durable storage for association lists.

pub mod error;
pub mod json;

pub use error::StoreError;
pub use json::JsonFileStore;

use glimmind_core::{AssociationList, ListObserver};

pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage for whole list documents.
pub trait ListStore {
    fn load(&self, id: &str) -> Result<AssociationList>;
    fn save(&self, list: &AssociationList) -> Result<()>;
    fn list_all(&self, owner_id: &str) -> Result<Vec<AssociationList>>;
    fn delete(&self, id: &str) -> Result<()>;
}

/// Persists every list the engine emits. Failures are logged and dropped;
/// the engine's in-memory state stays authoritative and the next save
/// carries the cumulative state.
pub struct StoreObserver<S> {
    store: S,
}

impl<S: ListStore> StoreObserver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: ListStore> ListObserver for StoreObserver<S> {
    fn on_list_changed(&mut self, list: &AssociationList) {
        match self.store.save(list) {
            Ok(()) => tracing::trace!(list_id = %list.id, updated_at = ?list.updated_at, "list saved"),
            Err(e) => tracing::error!(list_id = %list.id, error = %e, "failed to save list"),
        }
    }
}
