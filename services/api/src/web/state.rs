//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use booklist_core::ports::{CatalogueStore, CollectionStore, ListStore, UserStore};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and handed to the
/// GraphQL schema as data.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub lists: Arc<dyn ListStore>,
    pub catalogue: Arc<dyn CatalogueStore>,
    pub collection: Arc<dyn CollectionStore>,
}

impl AppState {
    /// Uses one adapter for every store port.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserStore + ListStore + CatalogueStore + CollectionStore + 'static,
    {
        Self {
            users: store.clone(),
            lists: store.clone(),
            catalogue: store.clone(),
            collection: store,
        }
    }
}
