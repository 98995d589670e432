//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of every store port. Used when no database is
//! configured and as the backing store of the test suites. All state sits
//! behind one async mutex, so each operation is atomic.

use async_trait::async_trait;
use booklist_core::domain::{
    Author, Book, CollectionItem, List, NewBook, NewList, Profile, Publisher, Settings,
    SettingsChanges, Status,
};
use booklist_core::ports::{
    CatalogueStore, CollectionStore, ListStore, PortError, PortResult, UserStore,
};
use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    next_id: i64,
    profiles: BTreeMap<i64, Profile>,
    settings: BTreeMap<i64, Settings>,
    lists: BTreeMap<i64, List>,
    list_books: BTreeMap<i64, Vec<i64>>,
    books: BTreeMap<i64, Book>,
    book_authors: BTreeMap<i64, BTreeSet<i64>>,
    authors: BTreeMap<i64, Author>,
    publishers: BTreeMap<i64, Publisher>,
    items: BTreeMap<i64, CollectionItem>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn list(&self, list_id: i64) -> PortResult<List> {
        self.lists
            .get(&list_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("List {} not found", list_id)))
    }

    fn item(&self, item_id: i64) -> PortResult<CollectionItem> {
        self.items
            .get(&item_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Collection item {} not found", item_id)))
    }

    fn settings_of(&self, profile_id: i64) -> PortResult<Settings> {
        self.settings
            .values()
            .find(|s| s.profile_id == profile_id)
            .cloned()
            .ok_or_else(|| {
                PortError::NotFound(format!("Settings for profile {} not found", profile_id))
            })
    }
}

/// A store adapter that keeps everything in memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Creates an empty `MemoryStore`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an author. Authors have no mutation of their own.
    pub async fn add_author(&self, name: &str, birth_day: Option<NaiveDate>) -> Author {
        let mut tables = self.tables.lock().await;
        let author = Author {
            id: tables.next_id(),
            name: name.to_string(),
            birth_day,
        };
        tables.authors.insert(author.id, author.clone());
        author
    }

    /// Seeds a publisher.
    pub async fn add_publisher(&self, name: &str) -> Publisher {
        let mut tables = self.tables.lock().await;
        let publisher = Publisher {
            id: tables.next_id(),
            name: name.to_string(),
        };
        tables.publishers.insert(publisher.id, publisher.clone());
        publisher
    }

    /// Number of persisted books.
    pub async fn book_count(&self) -> usize {
        self.tables.lock().await.books.len()
    }

    /// Number of persisted profiles.
    pub async fn profile_count(&self) -> usize {
        self.tables.lock().await.profiles.len()
    }
}

//=========================================================================================
// `UserStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_or_create_profile(&self, uuid: Uuid) -> PortResult<Profile> {
        let mut tables = self.tables.lock().await;
        if let Some(profile) = tables.profiles.values().find(|p| p.uuid == uuid) {
            return Ok(profile.clone());
        }

        let profile = Profile {
            id: tables.next_id(),
            uuid,
            created_at: Utc::now(),
        };
        let settings = Settings {
            id: tables.next_id(),
            profile_id: profile.id,
            private: true,
            show_name: false,
            show_stats: false,
            show_collection: false,
            show_lists_follows: false,
            show_authors_follows: false,
        };
        tables.profiles.insert(profile.id, profile.clone());
        tables.settings.insert(settings.id, settings);
        Ok(profile)
    }

    async fn find_profile_by_uuid(&self, uuid: Uuid) -> PortResult<Profile> {
        let tables = self.tables.lock().await;
        tables
            .profiles
            .values()
            .find(|p| p.uuid == uuid)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Profile {} not found", uuid)))
    }

    async fn find_profile_by_id(&self, profile_id: i64) -> PortResult<Profile> {
        let tables = self.tables.lock().await;
        tables
            .profiles
            .get(&profile_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Profile {} not found", profile_id)))
    }

    async fn find_settings(&self, profile_id: i64) -> PortResult<Settings> {
        self.tables.lock().await.settings_of(profile_id)
    }

    async fn update_settings(
        &self,
        profile_id: i64,
        changes: SettingsChanges,
    ) -> PortResult<Settings> {
        let mut tables = self.tables.lock().await;
        let current = tables.settings_of(profile_id)?;
        let updated = Settings {
            private: changes.private,
            show_name: changes.show_name,
            show_stats: changes.show_stats,
            show_collection: changes.show_collection,
            show_lists_follows: changes.show_lists_follows,
            show_authors_follows: changes.show_authors_follows,
            ..current
        };
        tables.settings.insert(updated.id, updated.clone());
        Ok(updated)
    }
}

//=========================================================================================
// `ListStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ListStore for MemoryStore {
    async fn find_list(&self, list_id: i64) -> PortResult<List> {
        self.tables.lock().await.list(list_id)
    }

    async fn find_lists_by_profile(&self, profile_id: i64) -> PortResult<Vec<List>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .lists
            .values()
            .filter(|l| l.profile_id == profile_id)
            .cloned()
            .collect())
    }

    async fn find_published_lists_by_profile(&self, profile_id: i64) -> PortResult<Vec<List>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .lists
            .values()
            .filter(|l| l.profile_id == profile_id && l.published)
            .cloned()
            .collect())
    }

    async fn find_list_books(&self, list_id: i64) -> PortResult<Vec<Book>> {
        let tables = self.tables.lock().await;
        let book_ids = tables.list_books.get(&list_id).cloned().unwrap_or_default();
        Ok(book_ids
            .iter()
            .filter_map(|id| tables.books.get(id).cloned())
            .collect())
    }

    async fn create_list(&self, list: NewList) -> PortResult<List> {
        let mut tables = self.tables.lock().await;
        let record = List {
            id: tables.next_id(),
            profile_id: list.profile_id,
            name: list.name,
            description: list.description,
            published: list.published,
            created_at: Utc::now(),
        };
        tables.lists.insert(record.id, record.clone());
        Ok(record)
    }

    async fn delete_list(&self, list_id: i64) -> PortResult<List> {
        let mut tables = self.tables.lock().await;
        let list = tables
            .lists
            .remove(&list_id)
            .ok_or_else(|| PortError::NotFound(format!("List {} not found", list_id)))?;
        tables.list_books.remove(&list_id);
        Ok(list)
    }

    async fn set_published(&self, list_id: i64, published: bool) -> PortResult<List> {
        let mut tables = self.tables.lock().await;
        let list = tables
            .lists
            .get_mut(&list_id)
            .ok_or_else(|| PortError::NotFound(format!("List {} not found", list_id)))?;
        list.published = published;
        Ok(list.clone())
    }

    async fn clone_list(&self, list_id: i64, profile_id: i64) -> PortResult<List> {
        let mut tables = self.tables.lock().await;
        let original = tables.list(list_id)?;
        let copy = List {
            id: tables.next_id(),
            profile_id,
            name: original.name,
            description: original.description,
            published: false,
            created_at: Utc::now(),
        };
        let books = tables.list_books.get(&list_id).cloned().unwrap_or_default();
        tables.list_books.insert(copy.id, books);
        tables.lists.insert(copy.id, copy.clone());
        Ok(copy)
    }

    async fn add_book(&self, list_id: i64, book_id: i64) -> PortResult<List> {
        let mut tables = self.tables.lock().await;
        let list = tables.list(list_id)?;
        if !tables.books.contains_key(&book_id) {
            return Err(PortError::NotFound(format!("Book {} not found", book_id)));
        }
        let books = tables.list_books.entry(list_id).or_default();
        if !books.contains(&book_id) {
            books.push(book_id);
        }
        Ok(list)
    }

    async fn remove_book(&self, list_id: i64, book_id: i64) -> PortResult<List> {
        let mut tables = self.tables.lock().await;
        let list = tables.list(list_id)?;
        if let Some(books) = tables.list_books.get_mut(&list_id) {
            books.retain(|id| *id != book_id);
        }
        Ok(list)
    }
}

//=========================================================================================
// `CatalogueStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CatalogueStore for MemoryStore {
    async fn find_book(&self, book_id: i64) -> PortResult<Book> {
        let tables = self.tables.lock().await;
        tables
            .books
            .get(&book_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Book {} not found", book_id)))
    }

    async fn create_book(&self, book: NewBook) -> PortResult<Book> {
        let mut tables = self.tables.lock().await;
        let NewBook { draft, profile_id } = book;

        if let Some(missing) = draft
            .author_ids
            .iter()
            .find(|id| !tables.authors.contains_key(*id))
        {
            return Err(PortError::NotFound(format!("Author {} not found", missing)));
        }
        if let Some(publisher_id) = draft.publisher_id {
            if !tables.publishers.contains_key(&publisher_id) {
                return Err(PortError::NotFound(format!(
                    "Publisher {} not found",
                    publisher_id
                )));
            }
        }

        let record = Book {
            id: tables.next_id(),
            title: draft.title,
            isbn: draft.isbn,
            published_at: draft.published_at,
            page_count: draft.page_count,
            edition: draft.edition,
            needs_approval: true,
            publisher_id: draft.publisher_id,
            profile_id,
            created_at: Utc::now(),
        };
        tables
            .book_authors
            .insert(record.id, draft.author_ids.into_iter().collect());
        tables.books.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_author(&self, author_id: i64) -> PortResult<Author> {
        let tables = self.tables.lock().await;
        tables
            .authors
            .get(&author_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Author {} not found", author_id)))
    }

    async fn find_book_authors(&self, book_id: i64) -> PortResult<Vec<Author>> {
        let tables = self.tables.lock().await;
        let author_ids = tables.book_authors.get(&book_id).cloned().unwrap_or_default();
        Ok(author_ids
            .iter()
            .filter_map(|id| tables.authors.get(id).cloned())
            .collect())
    }

    async fn find_publisher(&self, publisher_id: i64) -> PortResult<Publisher> {
        let tables = self.tables.lock().await;
        tables
            .publishers
            .get(&publisher_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Publisher {} not found", publisher_id)))
    }
}

//=========================================================================================
// `CollectionStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn find_item(&self, item_id: i64) -> PortResult<CollectionItem> {
        self.tables.lock().await.item(item_id)
    }

    async fn find_items_by_profile(&self, profile_id: i64) -> PortResult<Vec<CollectionItem>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .items
            .values()
            .filter(|i| i.profile_id == profile_id)
            .cloned()
            .collect())
    }

    async fn add_item(
        &self,
        profile_id: i64,
        book_id: i64,
        status: Status,
    ) -> PortResult<CollectionItem> {
        let mut tables = self.tables.lock().await;
        if !tables.books.contains_key(&book_id) {
            return Err(PortError::NotFound(format!("Book {} not found", book_id)));
        }
        let item = CollectionItem {
            id: tables.next_id(),
            profile_id,
            book_id,
            status,
            started_at: None,
            finished_at: None,
            created_at: Utc::now(),
        };
        tables.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn delete_item(&self, item_id: i64) -> PortResult<CollectionItem> {
        let mut tables = self.tables.lock().await;
        tables
            .items
            .remove(&item_id)
            .ok_or_else(|| PortError::NotFound(format!("Collection item {} not found", item_id)))
    }

    async fn set_item_status(&self, item_id: i64, status: Status) -> PortResult<CollectionItem> {
        let mut tables = self.tables.lock().await;
        let item = tables
            .items
            .get_mut(&item_id)
            .ok_or_else(|| PortError::NotFound(format!("Collection item {} not found", item_id)))?;
        item.status = status;
        Ok(item.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use booklist_core::domain::BookDraft;
    use std::sync::Arc;

    #[tokio::test]
    async fn concurrent_first_calls_create_one_profile() {
        let store = Arc::new(MemoryStore::new());
        let uuid = Uuid::new_v4();

        let calls = (0..16).map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.find_or_create_profile(uuid).await })
        });
        let profiles = futures::future::join_all(calls).await;

        let ids: BTreeSet<i64> = profiles
            .into_iter()
            .map(|joined| joined.unwrap().unwrap().id)
            .collect();
        assert_eq!(ids.len(), 1);
        assert_eq!(store.profile_count().await, 1);
    }

    #[tokio::test]
    async fn new_profiles_are_private() {
        let store = MemoryStore::new();
        let profile = store.find_or_create_profile(Uuid::new_v4()).await.unwrap();

        let settings = store.find_settings(profile.id).await.unwrap();
        assert!(settings.private);
        assert!(!settings.show_name);
    }

    #[tokio::test]
    async fn lookup_by_uuid_never_creates() {
        let store = MemoryStore::new();

        let err = store.find_profile_by_uuid(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
        assert_eq!(store.profile_count().await, 0);
    }

    #[tokio::test]
    async fn clone_copies_books_and_unpublishes() {
        let store = MemoryStore::new();
        let owner = store.find_or_create_profile(Uuid::new_v4()).await.unwrap();
        let other = store.find_or_create_profile(Uuid::new_v4()).await.unwrap();
        let book = store
            .create_book(NewBook {
                draft: BookDraft {
                    title: "Dune".to_string(),
                    isbn: "9780441013593".to_string(),
                    ..BookDraft::default()
                },
                profile_id: owner.id,
            })
            .await
            .unwrap();
        let list = store
            .create_list(NewList {
                profile_id: owner.id,
                name: "Sci-fi".to_string(),
                description: Some("Desert planets".to_string()),
                published: true,
            })
            .await
            .unwrap();
        store.add_book(list.id, book.id).await.unwrap();
        store.add_book(list.id, book.id).await.unwrap();

        let copy = store.clone_list(list.id, other.id).await.unwrap();

        assert_ne!(copy.id, list.id);
        assert_eq!(copy.profile_id, other.id);
        assert_eq!(copy.name, "Sci-fi");
        assert!(!copy.published);
        let books = store.find_list_books(copy.id).await.unwrap();
        assert_eq!(books, vec![book]);
    }

    #[tokio::test]
    async fn create_book_rejects_unknown_author() {
        let store = MemoryStore::new();
        let profile = store.find_or_create_profile(Uuid::new_v4()).await.unwrap();

        let err = store
            .create_book(NewBook {
                draft: BookDraft {
                    title: "Dune".to_string(),
                    isbn: "9780441013593".to_string(),
                    author_ids: vec![404],
                    ..BookDraft::default()
                },
                profile_id: profile.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::NotFound(_)));
        assert_eq!(store.book_count().await, 0);
    }
}
