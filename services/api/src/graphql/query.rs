//! services/api/src/graphql/query.rs

use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use super::context::caller;
use super::objects::{graphql, resolvers, BookObject, CurrentUser, ListObject, User};

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// The caller, or `null` for anonymous requests.
    async fn me(&self, ctx: &Context<'_>) -> Result<Option<CurrentUser>> {
        let identity = caller(ctx);
        let profile = graphql(resolvers(ctx)?.me(identity.as_ref()).await)?;
        Ok(profile.zip(identity).map(|(p, i)| CurrentUser::new(p, i)))
    }

    async fn user(&self, ctx: &Context<'_>, uuid: Uuid) -> Result<User> {
        graphql(resolvers(ctx)?.user(uuid).await).map(Into::into)
    }

    async fn list(&self, ctx: &Context<'_>, id: i64) -> Result<ListObject> {
        let identity = caller(ctx);
        graphql(resolvers(ctx)?.list(identity.as_ref(), id).await).map(Into::into)
    }

    async fn book(&self, ctx: &Context<'_>, id: i64) -> Result<BookObject> {
        graphql(resolvers(ctx)?.book(id).await).map(Into::into)
    }
}
