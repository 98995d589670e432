//! services/api/src/graphql/objects.rs
//!
//! GraphQL output and input types. Output types wrap the domain structs and
//! resolve their relations through `Resolvers`.

use async_graphql::{ComplexObject, Context, Enum, ErrorExtensions, InputObject, Result, SimpleObject};
use booklist_core::domain::{
    Author, Book, BookDraft, CollectionItem, List, Profile, Publisher, Settings, SettingsChanges,
    Status,
};
use booklist_core::identity::Identity;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::errors::ResolverResult;
use super::resolvers::Resolvers;
use crate::web::state::AppState;

/// Builds the resolver set from the schema data.
pub(crate) fn resolvers<'a>(ctx: &Context<'a>) -> Result<Resolvers<'a>> {
    let state = ctx.data::<Arc<AppState>>()?;
    Ok(Resolvers::new(state))
}

/// Turns a `ResolverError` into a GraphQL error that carries its code.
pub(crate) fn graphql<T>(result: ResolverResult<T>) -> Result<T> {
    result.map_err(|e| e.extend())
}

//=========================================================================================
// Enums
//=========================================================================================

#[derive(Enum, Copy, Clone, Debug, PartialEq, Eq)]
#[graphql(name = "Status")]
pub enum ItemStatus {
    ToRead,
    OnHold,
    Dropped,
    Reading,
    Read,
}

impl From<Status> for ItemStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::ToRead => ItemStatus::ToRead,
            Status::OnHold => ItemStatus::OnHold,
            Status::Dropped => ItemStatus::Dropped,
            Status::Reading => ItemStatus::Reading,
            Status::Read => ItemStatus::Read,
        }
    }
}

impl From<ItemStatus> for Status {
    fn from(status: ItemStatus) -> Self {
        match status {
            ItemStatus::ToRead => Status::ToRead,
            ItemStatus::OnHold => Status::OnHold,
            ItemStatus::Dropped => Status::Dropped,
            ItemStatus::Reading => Status::Reading,
            ItemStatus::Read => Status::Read,
        }
    }
}

//=========================================================================================
// Users
//=========================================================================================

/// The authenticated caller.
#[derive(SimpleObject)]
#[graphql(complex)]
pub struct CurrentUser {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub email: String,
}

impl CurrentUser {
    pub fn new(profile: Profile, identity: Identity) -> Self {
        Self {
            id: profile.id,
            uuid: profile.uuid,
            name: identity.traits.name,
            email: identity.traits.email,
        }
    }
}

#[ComplexObject]
impl CurrentUser {
    async fn settings(&self, ctx: &Context<'_>) -> Result<SettingsObject> {
        graphql(resolvers(ctx)?.settings(self.id).await).map(Into::into)
    }

    async fn lists(&self, ctx: &Context<'_>) -> Result<Vec<ListObject>> {
        graphql(resolvers(ctx)?.lists_of(self.id).await).map(into_all)
    }

    async fn collection(&self, ctx: &Context<'_>) -> Result<Vec<CollectionItemObject>> {
        graphql(resolvers(ctx)?.collection_of(self.id).await).map(into_all)
    }
}

/// Someone else's public profile.
#[derive(SimpleObject)]
#[graphql(complex)]
pub struct User {
    pub uuid: Uuid,
    #[graphql(skip)]
    pub profile_id: i64,
}

impl From<Profile> for User {
    fn from(profile: Profile) -> Self {
        Self {
            uuid: profile.uuid,
            profile_id: profile.id,
        }
    }
}

#[ComplexObject]
impl User {
    /// Published lists only.
    async fn lists(&self, ctx: &Context<'_>) -> Result<Vec<ListObject>> {
        graphql(resolvers(ctx)?.published_lists_of(self.profile_id).await).map(into_all)
    }
}

#[derive(SimpleObject)]
#[graphql(name = "Settings")]
pub struct SettingsObject {
    pub id: i64,
    pub private: bool,
    pub show_name: bool,
    pub show_stats: bool,
    pub show_collection: bool,
    pub show_lists_follows: bool,
    pub show_authors_follows: bool,
}

impl From<Settings> for SettingsObject {
    fn from(s: Settings) -> Self {
        Self {
            id: s.id,
            private: s.private,
            show_name: s.show_name,
            show_stats: s.show_stats,
            show_collection: s.show_collection,
            show_lists_follows: s.show_lists_follows,
            show_authors_follows: s.show_authors_follows,
        }
    }
}

//=========================================================================================
// Lists and collection
//=========================================================================================

#[derive(SimpleObject)]
#[graphql(complex, name = "List")]
pub struct ListObject {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    #[graphql(skip)]
    pub profile_id: i64,
}

impl From<List> for ListObject {
    fn from(l: List) -> Self {
        Self {
            id: l.id,
            name: l.name,
            description: l.description,
            published: l.published,
            created_at: l.created_at,
            profile_id: l.profile_id,
        }
    }
}

#[ComplexObject]
impl ListObject {
    async fn books(&self, ctx: &Context<'_>) -> Result<Vec<BookObject>> {
        graphql(resolvers(ctx)?.list_books(self.id).await).map(into_all)
    }

    /// `null` when the owner keeps their profile private.
    async fn owner(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        graphql(resolvers(ctx)?.list_owner(self.profile_id).await).map(|p| p.map(User::from))
    }
}

#[derive(SimpleObject)]
#[graphql(complex, name = "CollectionItem")]
pub struct CollectionItemObject {
    pub id: i64,
    pub status: ItemStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[graphql(skip)]
    pub book_id: i64,
}

impl From<CollectionItem> for CollectionItemObject {
    fn from(i: CollectionItem) -> Self {
        Self {
            id: i.id,
            status: i.status.into(),
            started_at: i.started_at,
            finished_at: i.finished_at,
            created_at: i.created_at,
            book_id: i.book_id,
        }
    }
}

#[ComplexObject]
impl CollectionItemObject {
    async fn book(&self, ctx: &Context<'_>) -> Result<BookObject> {
        graphql(resolvers(ctx)?.item_book(self.book_id).await).map(Into::into)
    }
}

//=========================================================================================
// Catalogue
//=========================================================================================

#[derive(SimpleObject)]
#[graphql(complex, name = "Book")]
pub struct BookObject {
    pub id: i64,
    pub title: String,
    pub isbn: String,
    pub published_at: Option<DateTime<Utc>>,
    pub page_count: Option<i32>,
    pub edition: Option<i32>,
    pub needs_approval: bool,
    pub created_at: DateTime<Utc>,
    #[graphql(skip)]
    pub publisher_id: Option<i64>,
}

impl From<Book> for BookObject {
    fn from(b: Book) -> Self {
        Self {
            id: b.id,
            title: b.title,
            isbn: b.isbn,
            published_at: b.published_at,
            page_count: b.page_count,
            edition: b.edition,
            needs_approval: b.needs_approval,
            created_at: b.created_at,
            publisher_id: b.publisher_id,
        }
    }
}

#[ComplexObject]
impl BookObject {
    async fn authors(&self, ctx: &Context<'_>) -> Result<Vec<AuthorObject>> {
        graphql(resolvers(ctx)?.book_authors(self.id).await).map(into_all)
    }

    async fn publisher(&self, ctx: &Context<'_>) -> Result<Option<PublisherObject>> {
        graphql(resolvers(ctx)?.book_publisher(self.publisher_id).await)
            .map(|p| p.map(Into::into))
    }
}

#[derive(SimpleObject)]
#[graphql(name = "Author")]
pub struct AuthorObject {
    pub id: i64,
    pub name: String,
    pub birth_day: Option<NaiveDate>,
}

impl From<Author> for AuthorObject {
    fn from(a: Author) -> Self {
        Self {
            id: a.id,
            name: a.name,
            birth_day: a.birth_day,
        }
    }
}

#[derive(SimpleObject)]
#[graphql(name = "Publisher")]
pub struct PublisherObject {
    pub id: i64,
    pub name: String,
}

impl From<Publisher> for PublisherObject {
    fn from(p: Publisher) -> Self {
        Self {
            id: p.id,
            name: p.name,
        }
    }
}

fn into_all<T, U: From<T>>(items: Vec<T>) -> Vec<U> {
    items.into_iter().map(U::from).collect()
}

//=========================================================================================
// Inputs
//=========================================================================================

#[derive(InputObject)]
#[graphql(name = "CreateBook")]
pub struct CreateBookInput {
    pub title: String,
    pub isbn: String,
    pub published_at: Option<DateTime<Utc>>,
    pub page_count: Option<i32>,
    pub edition: Option<i32>,
    /// Author ids, checked in order. Required, but may be empty.
    pub authors: Vec<i64>,
    pub publisher: Option<i64>,
}

impl From<CreateBookInput> for BookDraft {
    fn from(input: CreateBookInput) -> Self {
        Self {
            title: input.title,
            isbn: input.isbn,
            published_at: input.published_at,
            page_count: input.page_count,
            edition: input.edition,
            author_ids: input.authors,
            publisher_id: input.publisher,
        }
    }
}

/// Replaces all settings; omitted flags become `false`.
#[derive(InputObject)]
#[graphql(name = "UpdateSettings")]
pub struct UpdateSettingsInput {
    #[graphql(default)]
    pub private: bool,
    #[graphql(default)]
    pub show_name: bool,
    #[graphql(default)]
    pub show_stats: bool,
    #[graphql(default)]
    pub show_collection: bool,
    #[graphql(default)]
    pub show_lists_follows: bool,
    #[graphql(default)]
    pub show_authors_follows: bool,
}

impl From<UpdateSettingsInput> for SettingsChanges {
    fn from(input: UpdateSettingsInput) -> Self {
        Self {
            private: input.private,
            show_name: input.show_name,
            show_stats: input.show_stats,
            show_collection: input.show_collection,
            show_lists_follows: input.show_lists_follows,
            show_authors_follows: input.show_authors_follows,
        }
    }
}
