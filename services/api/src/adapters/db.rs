//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the store ports from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use booklist_core::domain::{
    Author, Book, CollectionItem, List, NewBook, NewList, Profile, Publisher, Settings,
    SettingsChanges, Status,
};
use booklist_core::ports::{
    CatalogueStore, CollectionStore, ListStore, PortError, PortResult, UserStore,
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements every store port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// Maps `RowNotFound` to `PortError::NotFound` and everything else to `Unexpected`.
fn not_found(what: String) -> impl FnOnce(sqlx::Error) -> PortError {
    move |e| match e {
        sqlx::Error::RowNotFound => PortError::NotFound(format!("{} not found", what)),
        _ => PortError::Unexpected(e.to_string()),
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ProfileRecord {
    id: i64,
    uuid: Uuid,
    created_at: DateTime<Utc>,
}
impl ProfileRecord {
    fn to_domain(self) -> Profile {
        Profile {
            id: self.id,
            uuid: self.uuid,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct SettingsRecord {
    id: i64,
    profile_id: i64,
    private: bool,
    show_name: bool,
    show_stats: bool,
    show_collection: bool,
    show_lists_follows: bool,
    show_authors_follows: bool,
}
impl SettingsRecord {
    fn to_domain(self) -> Settings {
        Settings {
            id: self.id,
            profile_id: self.profile_id,
            private: self.private,
            show_name: self.show_name,
            show_stats: self.show_stats,
            show_collection: self.show_collection,
            show_lists_follows: self.show_lists_follows,
            show_authors_follows: self.show_authors_follows,
        }
    }
}

#[derive(FromRow)]
struct ListRecord {
    id: i64,
    profile_id: i64,
    name: String,
    description: Option<String>,
    published: bool,
    created_at: DateTime<Utc>,
}
impl ListRecord {
    fn to_domain(self) -> List {
        List {
            id: self.id,
            profile_id: self.profile_id,
            name: self.name,
            description: self.description,
            published: self.published,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct BookRecord {
    id: i64,
    title: String,
    isbn: String,
    published_at: Option<DateTime<Utc>>,
    page_count: Option<i32>,
    edition: Option<i32>,
    needs_approval: bool,
    publisher_id: Option<i64>,
    profile_id: i64,
    created_at: DateTime<Utc>,
}
impl BookRecord {
    fn to_domain(self) -> Book {
        Book {
            id: self.id,
            title: self.title,
            isbn: self.isbn,
            published_at: self.published_at,
            page_count: self.page_count,
            edition: self.edition,
            needs_approval: self.needs_approval,
            publisher_id: self.publisher_id,
            profile_id: self.profile_id,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct AuthorRecord {
    id: i64,
    name: String,
    birth_day: Option<NaiveDate>,
}
impl AuthorRecord {
    fn to_domain(self) -> Author {
        Author {
            id: self.id,
            name: self.name,
            birth_day: self.birth_day,
        }
    }
}

#[derive(FromRow)]
struct PublisherRecord {
    id: i64,
    name: String,
}
impl PublisherRecord {
    fn to_domain(self) -> Publisher {
        Publisher {
            id: self.id,
            name: self.name,
        }
    }
}

#[derive(FromRow)]
struct CollectionItemRecord {
    id: i64,
    profile_id: i64,
    book_id: i64,
    status: String,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}
impl CollectionItemRecord {
    fn to_domain(self) -> PortResult<CollectionItem> {
        let status = self
            .status
            .parse::<Status>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(CollectionItem {
            id: self.id,
            profile_id: self.profile_id,
            book_id: self.book_id,
            status,
            started_at: self.started_at,
            finished_at: self.finished_at,
            created_at: self.created_at,
        })
    }
}

const PROFILE_COLUMNS: &str = "id, uuid, created_at";
const SETTINGS_COLUMNS: &str = "id, profile_id, private, show_name, show_stats, show_collection, show_lists_follows, show_authors_follows";
const LIST_COLUMNS: &str = "id, profile_id, name, description, published, created_at";
const BOOK_COLUMNS: &str = "id, title, isbn, published_at, page_count, edition, needs_approval, publisher_id, profile_id, created_at";
const ITEM_COLUMNS: &str = "id, profile_id, book_id, status, started_at, finished_at, created_at";

//=========================================================================================
// `UserStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserStore for DbAdapter {
    async fn find_or_create_profile(&self, uuid: Uuid) -> PortResult<Profile> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // ON CONFLICT makes concurrent first requests converge on one row.
        sqlx::query("INSERT INTO profiles (uuid) VALUES ($1) ON CONFLICT (uuid) DO NOTHING")
            .bind(uuid)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        let record = sqlx::query_as::<_, ProfileRecord>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE uuid = $1"
        ))
        .bind(uuid)
        .fetch_one(&mut *tx)
        .await
        .map_err(not_found(format!("Profile {}", uuid)))?;

        sqlx::query(
            "INSERT INTO settings (profile_id, private) VALUES ($1, TRUE) ON CONFLICT (profile_id) DO NOTHING",
        )
        .bind(record.id)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn find_profile_by_uuid(&self, uuid: Uuid) -> PortResult<Profile> {
        let record = sqlx::query_as::<_, ProfileRecord>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE uuid = $1"
        ))
        .bind(uuid)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found(format!("Profile {}", uuid)))?;
        Ok(record.to_domain())
    }

    async fn find_profile_by_id(&self, profile_id: i64) -> PortResult<Profile> {
        let record = sqlx::query_as::<_, ProfileRecord>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(profile_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found(format!("Profile {}", profile_id)))?;
        Ok(record.to_domain())
    }

    async fn find_settings(&self, profile_id: i64) -> PortResult<Settings> {
        let record = sqlx::query_as::<_, SettingsRecord>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM settings WHERE profile_id = $1"
        ))
        .bind(profile_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found(format!("Settings for profile {}", profile_id)))?;
        Ok(record.to_domain())
    }

    async fn update_settings(
        &self,
        profile_id: i64,
        changes: SettingsChanges,
    ) -> PortResult<Settings> {
        let record = sqlx::query_as::<_, SettingsRecord>(&format!(
            "UPDATE settings SET private = $2, show_name = $3, show_stats = $4, \
             show_collection = $5, show_lists_follows = $6, show_authors_follows = $7 \
             WHERE profile_id = $1 RETURNING {SETTINGS_COLUMNS}"
        ))
        .bind(profile_id)
        .bind(changes.private)
        .bind(changes.show_name)
        .bind(changes.show_stats)
        .bind(changes.show_collection)
        .bind(changes.show_lists_follows)
        .bind(changes.show_authors_follows)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found(format!("Settings for profile {}", profile_id)))?;
        Ok(record.to_domain())
    }
}

//=========================================================================================
// `ListStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ListStore for DbAdapter {
    async fn find_list(&self, list_id: i64) -> PortResult<List> {
        let record = sqlx::query_as::<_, ListRecord>(&format!(
            "SELECT {LIST_COLUMNS} FROM lists WHERE id = $1"
        ))
        .bind(list_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found(format!("List {}", list_id)))?;
        Ok(record.to_domain())
    }

    async fn find_lists_by_profile(&self, profile_id: i64) -> PortResult<Vec<List>> {
        let records = sqlx::query_as::<_, ListRecord>(&format!(
            "SELECT {LIST_COLUMNS} FROM lists WHERE profile_id = $1 ORDER BY id ASC"
        ))
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn find_published_lists_by_profile(&self, profile_id: i64) -> PortResult<Vec<List>> {
        let records = sqlx::query_as::<_, ListRecord>(&format!(
            "SELECT {LIST_COLUMNS} FROM lists WHERE profile_id = $1 AND published ORDER BY id ASC"
        ))
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn find_list_books(&self, list_id: i64) -> PortResult<Vec<Book>> {
        let records = sqlx::query_as::<_, BookRecord>(
            "SELECT b.id, b.title, b.isbn, b.published_at, b.page_count, b.edition, \
             b.needs_approval, b.publisher_id, b.profile_id, b.created_at \
             FROM books b JOIN list_books lb ON lb.book_id = b.id \
             WHERE lb.list_id = $1 ORDER BY lb.added_at ASC",
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_list(&self, list: NewList) -> PortResult<List> {
        let record = sqlx::query_as::<_, ListRecord>(&format!(
            "INSERT INTO lists (profile_id, name, description, published) \
             VALUES ($1, $2, $3, $4) RETURNING {LIST_COLUMNS}"
        ))
        .bind(list.profile_id)
        .bind(list.name)
        .bind(list.description)
        .bind(list.published)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn delete_list(&self, list_id: i64) -> PortResult<List> {
        let record = sqlx::query_as::<_, ListRecord>(&format!(
            "DELETE FROM lists WHERE id = $1 RETURNING {LIST_COLUMNS}"
        ))
        .bind(list_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found(format!("List {}", list_id)))?;
        Ok(record.to_domain())
    }

    async fn set_published(&self, list_id: i64, published: bool) -> PortResult<List> {
        let record = sqlx::query_as::<_, ListRecord>(&format!(
            "UPDATE lists SET published = $2 WHERE id = $1 RETURNING {LIST_COLUMNS}"
        ))
        .bind(list_id)
        .bind(published)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found(format!("List {}", list_id)))?;
        Ok(record.to_domain())
    }

    async fn clone_list(&self, list_id: i64, profile_id: i64) -> PortResult<List> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let record = sqlx::query_as::<_, ListRecord>(&format!(
            "INSERT INTO lists (profile_id, name, description, published) \
             SELECT $2, name, description, FALSE FROM lists WHERE id = $1 \
             RETURNING {LIST_COLUMNS}"
        ))
        .bind(list_id)
        .bind(profile_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(not_found(format!("List {}", list_id)))?;

        sqlx::query(
            "INSERT INTO list_books (list_id, book_id, added_at) \
             SELECT $2, book_id, added_at FROM list_books WHERE list_id = $1",
        )
        .bind(list_id)
        .bind(record.id)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn add_book(&self, list_id: i64, book_id: i64) -> PortResult<List> {
        sqlx::query(
            "INSERT INTO list_books (list_id, book_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(list_id)
        .bind(book_id)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                PortError::NotFound(format!("List {} or book {} not found", list_id, book_id))
            }
            _ => unexpected(e),
        })?;
        self.find_list(list_id).await
    }

    async fn remove_book(&self, list_id: i64, book_id: i64) -> PortResult<List> {
        sqlx::query("DELETE FROM list_books WHERE list_id = $1 AND book_id = $2")
            .bind(list_id)
            .bind(book_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        self.find_list(list_id).await
    }
}

//=========================================================================================
// `CatalogueStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CatalogueStore for DbAdapter {
    async fn find_book(&self, book_id: i64) -> PortResult<Book> {
        let record = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE id = $1"
        ))
        .bind(book_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found(format!("Book {}", book_id)))?;
        Ok(record.to_domain())
    }

    async fn create_book(&self, book: NewBook) -> PortResult<Book> {
        let NewBook { draft, profile_id } = book;
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let record = sqlx::query_as::<_, BookRecord>(&format!(
            "INSERT INTO books (title, isbn, published_at, page_count, edition, needs_approval, publisher_id, profile_id) \
             VALUES ($1, $2, $3, $4, $5, TRUE, $6, $7) RETURNING {BOOK_COLUMNS}"
        ))
        .bind(draft.title)
        .bind(draft.isbn)
        .bind(draft.published_at)
        .bind(draft.page_count)
        .bind(draft.edition)
        .bind(draft.publisher_id)
        .bind(profile_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        if !draft.author_ids.is_empty() {
            sqlx::query(
                "INSERT INTO book_authors (book_id, author_id) \
                 SELECT $1, UNNEST($2::BIGINT[]) ON CONFLICT DO NOTHING",
            )
            .bind(record.id)
            .bind(&draft.author_ids)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn find_author(&self, author_id: i64) -> PortResult<Author> {
        let record = sqlx::query_as::<_, AuthorRecord>(
            "SELECT id, name, birth_day FROM authors WHERE id = $1",
        )
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found(format!("Author {}", author_id)))?;
        Ok(record.to_domain())
    }

    async fn find_book_authors(&self, book_id: i64) -> PortResult<Vec<Author>> {
        let records = sqlx::query_as::<_, AuthorRecord>(
            "SELECT a.id, a.name, a.birth_day FROM authors a \
             JOIN book_authors ba ON ba.author_id = a.id \
             WHERE ba.book_id = $1 ORDER BY a.id ASC",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn find_publisher(&self, publisher_id: i64) -> PortResult<Publisher> {
        let record = sqlx::query_as::<_, PublisherRecord>(
            "SELECT id, name FROM publishers WHERE id = $1",
        )
        .bind(publisher_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found(format!("Publisher {}", publisher_id)))?;
        Ok(record.to_domain())
    }
}

//=========================================================================================
// `CollectionStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CollectionStore for DbAdapter {
    async fn find_item(&self, item_id: i64) -> PortResult<CollectionItem> {
        sqlx::query_as::<_, CollectionItemRecord>(&format!(
            "SELECT {ITEM_COLUMNS} FROM collection_items WHERE id = $1"
        ))
        .bind(item_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found(format!("Collection item {}", item_id)))?
        .to_domain()
    }

    async fn find_items_by_profile(&self, profile_id: i64) -> PortResult<Vec<CollectionItem>> {
        let records = sqlx::query_as::<_, CollectionItemRecord>(&format!(
            "SELECT {ITEM_COLUMNS} FROM collection_items WHERE profile_id = $1 ORDER BY id ASC"
        ))
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn add_item(
        &self,
        profile_id: i64,
        book_id: i64,
        status: Status,
    ) -> PortResult<CollectionItem> {
        sqlx::query_as::<_, CollectionItemRecord>(&format!(
            "INSERT INTO collection_items (profile_id, book_id, status) \
             VALUES ($1, $2, $3) RETURNING {ITEM_COLUMNS}"
        ))
        .bind(profile_id)
        .bind(book_id)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                PortError::NotFound(format!("Book {} not found", book_id))
            }
            _ => unexpected(e),
        })?
        .to_domain()
    }

    async fn delete_item(&self, item_id: i64) -> PortResult<CollectionItem> {
        sqlx::query_as::<_, CollectionItemRecord>(&format!(
            "DELETE FROM collection_items WHERE id = $1 RETURNING {ITEM_COLUMNS}"
        ))
        .bind(item_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found(format!("Collection item {}", item_id)))?
        .to_domain()
    }

    async fn set_item_status(&self, item_id: i64, status: Status) -> PortResult<CollectionItem> {
        sqlx::query_as::<_, CollectionItemRecord>(&format!(
            "UPDATE collection_items SET status = $2 WHERE id = $1 RETURNING {ITEM_COLUMNS}"
        ))
        .bind(item_id)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(not_found(format!("Collection item {}", item_id)))?
        .to_domain()
    }
}

// These run against a real server: `DATABASE_URL=postgres://... cargo test -- --ignored`.
// `#[sqlx::test]` creates a scratch database per test and applies ./migrations.
#[cfg(test)]
mod tests {
    use super::*;
    use booklist_core::domain::BookDraft;

    fn draft(title: &str) -> BookDraft {
        BookDraft {
            title: title.to_string(),
            isbn: "9780441013593".to_string(),
            ..BookDraft::default()
        }
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
    async fn concurrent_first_calls_create_one_profile(pool: PgPool) {
        let db = DbAdapter::new(pool.clone());
        let uuid = Uuid::new_v4();

        let calls = (0..16).map(|_| {
            let db = db.clone();
            tokio::spawn(async move { db.find_or_create_profile(uuid).await })
        });
        let ids: std::collections::BTreeSet<i64> = futures::future::join_all(calls)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap().id)
            .collect();
        assert_eq!(ids.len(), 1);

        let profiles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE uuid = $1")
            .bind(uuid)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(profiles, 1);

        let settings: Vec<bool> = sqlx::query_scalar(
            "SELECT s.private FROM settings s JOIN profiles p ON p.id = s.profile_id WHERE p.uuid = $1",
        )
        .bind(uuid)
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(settings, vec![true]);
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
    async fn clone_copies_books_into_an_unpublished_list(pool: PgPool) {
        let db = DbAdapter::new(pool);
        let owner = db.find_or_create_profile(Uuid::new_v4()).await.unwrap();
        let other = db.find_or_create_profile(Uuid::new_v4()).await.unwrap();

        let author_id: i64 =
            sqlx::query_scalar("INSERT INTO authors (name) VALUES ('Frank Herbert') RETURNING id")
                .fetch_one(&db.pool)
                .await
                .unwrap();
        let mut dune = draft("Dune");
        dune.author_ids = vec![author_id];
        let book = db
            .create_book(NewBook {
                draft: dune,
                profile_id: owner.id,
            })
            .await
            .unwrap();
        assert!(book.needs_approval);
        assert_eq!(db.find_book_authors(book.id).await.unwrap()[0].id, author_id);

        let list = db
            .create_list(NewList {
                profile_id: owner.id,
                name: "Sci-fi".to_string(),
                description: Some("Desert planets".to_string()),
                published: true,
            })
            .await
            .unwrap();
        db.add_book(list.id, book.id).await.unwrap();
        db.add_book(list.id, book.id).await.unwrap();

        let copy = db.clone_list(list.id, other.id).await.unwrap();

        assert_ne!(copy.id, list.id);
        assert_eq!(copy.profile_id, other.id);
        assert_eq!(copy.description.as_deref(), Some("Desert planets"));
        assert!(!copy.published);
        assert_eq!(db.find_list_books(copy.id).await.unwrap(), vec![book]);
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL; set DATABASE_URL and run with --ignored"]
    async fn unknown_books_are_not_found(pool: PgPool) {
        let db = DbAdapter::new(pool);
        let profile = db.find_or_create_profile(Uuid::new_v4()).await.unwrap();
        let list = db
            .create_list(NewList {
                profile_id: profile.id,
                name: "Empty".to_string(),
                description: None,
                published: false,
            })
            .await
            .unwrap();

        let err = db.add_book(list.id, 404).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));

        let err = db
            .add_item(profile.id, 404, Status::ToRead)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));

        let err = db.find_list(9_999).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }
}
