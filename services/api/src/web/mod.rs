pub mod handler;
pub mod middleware;
pub mod state;

use axum::{middleware as axum_middleware, routing::get, Router};
use booklist_core::ports::IdentityProvider;
use std::sync::Arc;

use crate::graphql::BooklistSchema;
pub use handler::{graphiql, graphql_handler};
pub use middleware::{resolve_session, ProviderSession};

/// Builds the HTTP routes: GraphiQL on `GET /` and `GET /graphql`, the
/// GraphQL endpoint on `POST /graphql`.
pub fn build_router(schema: BooklistSchema, provider: Arc<dyn IdentityProvider>) -> Router {
    Router::new()
        .route("/", get(graphiql))
        .route("/graphql", get(graphiql).post(graphql_handler))
        .layer(axum_middleware::from_fn_with_state(provider, resolve_session))
        .with_state(schema)
}
