//! crates/booklist_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or the
//! identity provider.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Author, Book, CollectionItem, List, NewBook, NewList, Profile, Publisher, Settings,
    SettingsChanges, Status,
};
use crate::identity::Session;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Store Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Returns the profile for `uuid`, creating it with private default
    /// settings on first use. Must never create two profiles for one UUID,
    /// even when called concurrently.
    async fn find_or_create_profile(&self, uuid: Uuid) -> PortResult<Profile>;

    /// Looks a profile up without creating it.
    async fn find_profile_by_uuid(&self, uuid: Uuid) -> PortResult<Profile>;

    async fn find_profile_by_id(&self, profile_id: i64) -> PortResult<Profile>;

    async fn find_settings(&self, profile_id: i64) -> PortResult<Settings>;

    async fn update_settings(
        &self,
        profile_id: i64,
        changes: SettingsChanges,
    ) -> PortResult<Settings>;
}

#[async_trait]
pub trait ListStore: Send + Sync {
    async fn find_list(&self, list_id: i64) -> PortResult<List>;

    async fn find_lists_by_profile(&self, profile_id: i64) -> PortResult<Vec<List>>;

    async fn find_published_lists_by_profile(&self, profile_id: i64) -> PortResult<Vec<List>>;

    async fn find_list_books(&self, list_id: i64) -> PortResult<Vec<Book>>;

    async fn create_list(&self, list: NewList) -> PortResult<List>;

    /// Deletes the list and returns it as it was.
    async fn delete_list(&self, list_id: i64) -> PortResult<List>;

    async fn set_published(&self, list_id: i64, published: bool) -> PortResult<List>;

    /// Copies name, description and books of `list_id` into a new unpublished
    /// list owned by `profile_id`.
    async fn clone_list(&self, list_id: i64, profile_id: i64) -> PortResult<List>;

    async fn add_book(&self, list_id: i64, book_id: i64) -> PortResult<List>;

    async fn remove_book(&self, list_id: i64, book_id: i64) -> PortResult<List>;
}

#[async_trait]
pub trait CatalogueStore: Send + Sync {
    async fn find_book(&self, book_id: i64) -> PortResult<Book>;

    async fn create_book(&self, book: NewBook) -> PortResult<Book>;

    async fn find_author(&self, author_id: i64) -> PortResult<Author>;

    async fn find_book_authors(&self, book_id: i64) -> PortResult<Vec<Author>>;

    async fn find_publisher(&self, publisher_id: i64) -> PortResult<Publisher>;
}

#[async_trait]
pub trait CollectionStore: Send + Sync {
    async fn find_item(&self, item_id: i64) -> PortResult<CollectionItem>;

    async fn find_items_by_profile(&self, profile_id: i64) -> PortResult<Vec<CollectionItem>>;

    async fn add_item(
        &self,
        profile_id: i64,
        book_id: i64,
        status: Status,
    ) -> PortResult<CollectionItem>;

    /// Deletes the item and returns it as it was.
    async fn delete_item(&self, item_id: i64) -> PortResult<CollectionItem>;

    async fn set_item_status(&self, item_id: i64, status: Status) -> PortResult<CollectionItem>;
}

//=========================================================================================
// Identity Provider Port
//=========================================================================================

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchanges the raw `Cookie` header of a request for the provider session.
    /// `Ok(None)` means the cookies carry no valid session.
    async fn session_from_cookies(&self, cookies: &str) -> PortResult<Option<Session>>;
}
