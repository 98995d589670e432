//! services/api/src/web/handler.rs

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::{Extension, State},
    response::{Html, IntoResponse},
};

use super::middleware::ProviderSession;
use crate::graphql::{attach, BooklistSchema};

/// Executes one GraphQL operation with the session resolved by the middleware.
pub async fn graphql_handler(
    State(schema): State<BooklistSchema>,
    Extension(ProviderSession(session)): Extension<ProviderSession>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    schema.execute(attach(req.into_inner(), session)).await.into()
}

pub async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}
