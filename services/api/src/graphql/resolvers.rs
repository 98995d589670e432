//! services/api/src/graphql/resolvers.rs
//!
//! The operations behind every GraphQL field. Each one takes the caller's
//! identity explicitly (`None` for anonymous requests) and returns domain
//! values or a `ResolverError`, so the rules can be exercised without a
//! running schema.

use booklist_core::domain::{
    Author, Book, BookDraft, CollectionItem, List, NewBook, NewList, Profile, Publisher,
    Settings, SettingsChanges, Status,
};
use booklist_core::identity::Identity;
use booklist_core::ports::PortError;
use tracing::{debug, info};
use uuid::Uuid;

use super::errors::{ResolverError, ResolverResult};
use super::ownership::{Owned, OwnershipChecker};
use crate::web::state::AppState;

/// Fails with `Unauthorized` unless a caller is present.
fn require(identity: Option<&Identity>) -> ResolverResult<&Identity> {
    identity.ok_or(ResolverError::Unauthorized)
}

pub struct Resolvers<'a> {
    state: &'a AppState,
    checker: OwnershipChecker<'a>,
}

impl<'a> Resolvers<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            state,
            checker: OwnershipChecker::new(state),
        }
    }

    async fn profile_of(&self, identity: &Identity) -> ResolverResult<Profile> {
        self.state
            .users
            .find_or_create_profile(identity.uuid)
            .await
            .map_err(ResolverError::internal)
    }

    //=====================================================================================
    // Queries
    //=====================================================================================

    /// The caller's profile, created on first use. `None` when anonymous.
    pub async fn me(&self, identity: Option<&Identity>) -> ResolverResult<Option<Profile>> {
        match identity {
            Some(identity) => self.profile_of(identity).await.map(Some),
            None => Ok(None),
        }
    }

    /// A public profile. Private and unknown profiles look the same.
    pub async fn user(&self, uuid: Uuid) -> ResolverResult<Profile> {
        let bad_uuid = || ResolverError::BadUuid {
            entity: "user",
            id: uuid,
        };

        let profile = match self.state.users.find_profile_by_uuid(uuid).await {
            Ok(profile) => profile,
            Err(PortError::NotFound(_)) => return Err(bad_uuid()),
            Err(err) => return Err(ResolverError::internal(err)),
        };
        if self.settings(profile.id).await?.private {
            return Err(bad_uuid());
        }
        Ok(profile)
    }

    /// Published lists are public; unpublished ones are visible to their owner only.
    pub async fn list(&self, identity: Option<&Identity>, id: i64) -> ResolverResult<List> {
        let list = self
            .state
            .lists
            .find_list(id)
            .await
            .map_err(ResolverError::or_bad_id("list", id))?;
        if list.published {
            return Ok(list);
        }
        let owned = match identity {
            Some(identity) => self.checker.is_owned(Owned::List, id, identity).await?,
            None => false,
        };
        if owned {
            Ok(list)
        } else {
            Err(ResolverError::bad_id("list", id))
        }
    }

    pub async fn book(&self, id: i64) -> ResolverResult<Book> {
        self.state
            .catalogue
            .find_book(id)
            .await
            .map_err(ResolverError::or_bad_id("book", id))
    }

    //=====================================================================================
    // Mutations
    //=====================================================================================

    /// Submits a book for approval. Every referenced author and publisher is
    /// checked before anything is written.
    pub async fn create_book(
        &self,
        identity: Option<&Identity>,
        draft: BookDraft,
    ) -> ResolverResult<Book> {
        let identity = require(identity)?;
        let profile = self.profile_of(identity).await?;

        for &author_id in &draft.author_ids {
            self.state
                .catalogue
                .find_author(author_id)
                .await
                .map_err(ResolverError::or_bad_id("author", author_id))?;
        }
        if let Some(publisher_id) = draft.publisher_id {
            self.state
                .catalogue
                .find_publisher(publisher_id)
                .await
                .map_err(ResolverError::or_bad_id("publisher", publisher_id))?;
        }

        let book = self
            .state
            .catalogue
            .create_book(NewBook {
                draft,
                profile_id: profile.id,
            })
            .await
            .map_err(ResolverError::internal)?;
        info!(book_id = book.id, profile_id = profile.id, "Book submitted for approval");
        Ok(book)
    }

    pub async fn create_list(
        &self,
        identity: Option<&Identity>,
        name: String,
        description: Option<String>,
        publish: Option<bool>,
    ) -> ResolverResult<List> {
        let identity = require(identity)?;
        let profile = self.profile_of(identity).await?;

        self.state
            .lists
            .create_list(NewList {
                profile_id: profile.id,
                name,
                description,
                published: publish.unwrap_or(false),
            })
            .await
            .map_err(ResolverError::internal)
    }

    pub async fn delete_list(&self, identity: Option<&Identity>, id: i64) -> ResolverResult<List> {
        let identity = require(identity)?;
        self.checker.ensure_owned(Owned::List, id, identity).await?;

        let list = self
            .state
            .lists
            .delete_list(id)
            .await
            .map_err(ResolverError::or_bad_id("list", id))?;
        debug!(list_id = id, "List deleted");
        Ok(list)
    }

    pub async fn set_list_published(
        &self,
        identity: Option<&Identity>,
        id: i64,
        published: bool,
    ) -> ResolverResult<List> {
        let identity = require(identity)?;
        self.checker.ensure_owned(Owned::List, id, identity).await?;

        self.state
            .lists
            .set_published(id, published)
            .await
            .map_err(ResolverError::or_bad_id("list", id))
    }

    /// Copies a list into the caller's profile. Anyone may clone a published
    /// list; unpublished lists can only be cloned by their owner.
    pub async fn clone_list(&self, identity: Option<&Identity>, id: i64) -> ResolverResult<List> {
        let identity = require(identity)?;

        let source = self
            .state
            .lists
            .find_list(id)
            .await
            .map_err(ResolverError::or_bad_id("list", id))?;
        if !source.published && !self.checker.is_owned(Owned::List, id, identity).await? {
            return Err(ResolverError::bad_id("list", id));
        }

        let profile = self.profile_of(identity).await?;
        self.state
            .lists
            .clone_list(id, profile.id)
            .await
            .map_err(ResolverError::or_bad_id("list", id))
    }

    pub async fn add_to_list(
        &self,
        identity: Option<&Identity>,
        list_id: i64,
        book_id: i64,
    ) -> ResolverResult<List> {
        let identity = require(identity)?;
        self.checker
            .ensure_owned(Owned::List, list_id, identity)
            .await?;
        self.book(book_id).await?;

        self.state
            .lists
            .add_book(list_id, book_id)
            .await
            .map_err(ResolverError::or_bad_id("list", list_id))
    }

    pub async fn remove_from_list(
        &self,
        identity: Option<&Identity>,
        list_id: i64,
        book_id: i64,
    ) -> ResolverResult<List> {
        let identity = require(identity)?;
        self.checker
            .ensure_owned(Owned::List, list_id, identity)
            .await?;
        self.book(book_id).await?;

        self.state
            .lists
            .remove_book(list_id, book_id)
            .await
            .map_err(ResolverError::or_bad_id("list", list_id))
    }

    pub async fn add_to_collection(
        &self,
        identity: Option<&Identity>,
        book_id: i64,
        status: Option<Status>,
    ) -> ResolverResult<CollectionItem> {
        let identity = require(identity)?;
        let profile = self.profile_of(identity).await?;
        self.book(book_id).await?;

        self.state
            .collection
            .add_item(profile.id, book_id, status.unwrap_or_default())
            .await
            .map_err(ResolverError::or_bad_id("book", book_id))
    }

    pub async fn delete_from_collection(
        &self,
        identity: Option<&Identity>,
        id: i64,
    ) -> ResolverResult<CollectionItem> {
        let identity = require(identity)?;
        self.checker
            .ensure_owned(Owned::CollectionItem, id, identity)
            .await?;

        self.state
            .collection
            .delete_item(id)
            .await
            .map_err(ResolverError::or_bad_id("collectionItem", id))
    }

    pub async fn change_item_status(
        &self,
        identity: Option<&Identity>,
        id: i64,
        status: Status,
    ) -> ResolverResult<CollectionItem> {
        let identity = require(identity)?;
        self.checker
            .ensure_owned(Owned::CollectionItem, id, identity)
            .await?;

        self.state
            .collection
            .set_item_status(id, status)
            .await
            .map_err(ResolverError::or_bad_id("collectionItem", id))
    }

    /// Replaces every settings flag of the caller.
    pub async fn update_settings(
        &self,
        identity: Option<&Identity>,
        changes: SettingsChanges,
    ) -> ResolverResult<Settings> {
        let identity = require(identity)?;
        let profile = self.profile_of(identity).await?;

        self.state
            .users
            .update_settings(profile.id, changes)
            .await
            .map_err(ResolverError::internal)
    }

    //=====================================================================================
    // Field resolvers
    //=====================================================================================

    pub async fn settings(&self, profile_id: i64) -> ResolverResult<Settings> {
        self.state
            .users
            .find_settings(profile_id)
            .await
            .map_err(ResolverError::internal)
    }

    pub async fn lists_of(&self, profile_id: i64) -> ResolverResult<Vec<List>> {
        self.state
            .lists
            .find_lists_by_profile(profile_id)
            .await
            .map_err(ResolverError::internal)
    }

    pub async fn published_lists_of(&self, profile_id: i64) -> ResolverResult<Vec<List>> {
        self.state
            .lists
            .find_published_lists_by_profile(profile_id)
            .await
            .map_err(ResolverError::internal)
    }

    pub async fn collection_of(&self, profile_id: i64) -> ResolverResult<Vec<CollectionItem>> {
        self.state
            .collection
            .find_items_by_profile(profile_id)
            .await
            .map_err(ResolverError::internal)
    }

    pub async fn list_books(&self, list_id: i64) -> ResolverResult<Vec<Book>> {
        self.state
            .lists
            .find_list_books(list_id)
            .await
            .map_err(ResolverError::internal)
    }

    /// The public owner of a list, or `None` when that profile is private.
    pub async fn list_owner(&self, profile_id: i64) -> ResolverResult<Option<Profile>> {
        let profile = self
            .state
            .users
            .find_profile_by_id(profile_id)
            .await
            .map_err(ResolverError::internal)?;
        if self.settings(profile.id).await?.private {
            return Ok(None);
        }
        Ok(Some(profile))
    }

    pub async fn item_book(&self, book_id: i64) -> ResolverResult<Book> {
        self.state
            .catalogue
            .find_book(book_id)
            .await
            .map_err(ResolverError::internal)
    }

    pub async fn book_authors(&self, book_id: i64) -> ResolverResult<Vec<Author>> {
        self.state
            .catalogue
            .find_book_authors(book_id)
            .await
            .map_err(ResolverError::internal)
    }

    pub async fn book_publisher(
        &self,
        publisher_id: Option<i64>,
    ) -> ResolverResult<Option<Publisher>> {
        match publisher_id {
            Some(id) => self
                .state
                .catalogue
                .find_publisher(id)
                .await
                .map(Some)
                .map_err(ResolverError::internal),
            None => Ok(None),
        }
    }
}
