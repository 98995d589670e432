//! services/api/src/graphql/mutation.rs
//!
//! Every mutation needs a session and fails with `UNAUTHORIZED` otherwise.

use async_graphql::{Context, Object, Result};

use super::context::caller;
use super::objects::{
    graphql, resolvers, BookObject, CollectionItemObject, CreateBookInput, ItemStatus,
    ListObject, SettingsObject, UpdateSettingsInput,
};

#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_book(&self, ctx: &Context<'_>, input: CreateBookInput) -> Result<BookObject> {
        let identity = caller(ctx);
        graphql(
            resolvers(ctx)?
                .create_book(identity.as_ref(), input.into())
                .await,
        )
        .map(Into::into)
    }

    async fn create_list(
        &self,
        ctx: &Context<'_>,
        name: String,
        description: Option<String>,
        publish: Option<bool>,
    ) -> Result<ListObject> {
        let identity = caller(ctx);
        graphql(
            resolvers(ctx)?
                .create_list(identity.as_ref(), name, description, publish)
                .await,
        )
        .map(Into::into)
    }

    async fn delete_list(&self, ctx: &Context<'_>, id: i64) -> Result<ListObject> {
        let identity = caller(ctx);
        graphql(resolvers(ctx)?.delete_list(identity.as_ref(), id).await).map(Into::into)
    }

    async fn publish_list(&self, ctx: &Context<'_>, id: i64) -> Result<ListObject> {
        let identity = caller(ctx);
        graphql(
            resolvers(ctx)?
                .set_list_published(identity.as_ref(), id, true)
                .await,
        )
        .map(Into::into)
    }

    async fn unpublish_list(&self, ctx: &Context<'_>, id: i64) -> Result<ListObject> {
        let identity = caller(ctx);
        graphql(
            resolvers(ctx)?
                .set_list_published(identity.as_ref(), id, false)
                .await,
        )
        .map(Into::into)
    }

    /// Copies a published list, or one of the caller's own, into a new private list.
    async fn clone_list(&self, ctx: &Context<'_>, id: i64) -> Result<ListObject> {
        let identity = caller(ctx);
        graphql(resolvers(ctx)?.clone_list(identity.as_ref(), id).await).map(Into::into)
    }

    async fn add_to_list(
        &self,
        ctx: &Context<'_>,
        list_id: i64,
        book_id: i64,
    ) -> Result<ListObject> {
        let identity = caller(ctx);
        graphql(
            resolvers(ctx)?
                .add_to_list(identity.as_ref(), list_id, book_id)
                .await,
        )
        .map(Into::into)
    }

    async fn remove_from_list(
        &self,
        ctx: &Context<'_>,
        list_id: i64,
        book_id: i64,
    ) -> Result<ListObject> {
        let identity = caller(ctx);
        graphql(
            resolvers(ctx)?
                .remove_from_list(identity.as_ref(), list_id, book_id)
                .await,
        )
        .map(Into::into)
    }

    async fn add_to_collection(
        &self,
        ctx: &Context<'_>,
        book_id: i64,
        status: Option<ItemStatus>,
    ) -> Result<CollectionItemObject> {
        let identity = caller(ctx);
        graphql(
            resolvers(ctx)?
                .add_to_collection(identity.as_ref(), book_id, status.map(Into::into))
                .await,
        )
        .map(Into::into)
    }

    async fn delete_from_collection(
        &self,
        ctx: &Context<'_>,
        id: i64,
    ) -> Result<CollectionItemObject> {
        let identity = caller(ctx);
        graphql(
            resolvers(ctx)?
                .delete_from_collection(identity.as_ref(), id)
                .await,
        )
        .map(Into::into)
    }

    async fn change_item_status(
        &self,
        ctx: &Context<'_>,
        id: i64,
        status: ItemStatus,
    ) -> Result<CollectionItemObject> {
        let identity = caller(ctx);
        graphql(
            resolvers(ctx)?
                .change_item_status(identity.as_ref(), id, status.into())
                .await,
        )
        .map(Into::into)
    }

    async fn update_settings(
        &self,
        ctx: &Context<'_>,
        changes: UpdateSettingsInput,
    ) -> Result<SettingsObject> {
        let identity = caller(ctx);
        graphql(
            resolvers(ctx)?
                .update_settings(identity.as_ref(), changes.into())
                .await,
        )
        .map(Into::into)
    }
}
