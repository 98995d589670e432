//! services/api/src/graphql/mod.rs
//!
//! The GraphQL layer: schema roots, object types, the resolver operations
//! and the error taxonomy they share.

pub mod context;
pub mod errors;
pub mod mutation;
pub mod objects;
pub mod ownership;
pub mod query;
pub mod resolvers;

use async_graphql::{EmptySubscription, Schema};
use std::sync::Arc;

use crate::web::state::AppState;
pub use context::{attach, retrieve};
pub use errors::ResolverError;
pub use mutation::MutationRoot;
pub use query::QueryRoot;

pub type BooklistSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Builds the executable schema over the given stores.
pub fn build_schema(state: Arc<AppState>) -> BooklistSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(state)
        .finish()
}

/// The schema in SDL form.
pub fn schema_sdl() -> String {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .finish()
        .sdl()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use async_graphql::{Request, Value};
    use booklist_core::identity::{Session, SessionIdentity};
    use serde_json::json;

    fn session(uuid: &str, traits: serde_json::Value) -> Session {
        Session {
            id: "session-1".to_string(),
            active: Some(true),
            identity: Some(SessionIdentity {
                id: uuid.to_string(),
                traits,
            }),
        }
    }

    fn schema() -> BooklistSchema {
        build_schema(Arc::new(AppState::from_store(Arc::new(MemoryStore::new()))))
    }

    fn error_code(response: &async_graphql::Response) -> Option<Value> {
        response
            .errors
            .first()
            .and_then(|e| e.extensions.as_ref())
            .and_then(|ext| ext.get("code"))
            .cloned()
    }

    #[tokio::test]
    async fn me_reads_the_attached_identity() {
        let schema = schema();
        let uuid = "6f1f3bb5-0a3e-4c0e-9a55-7b1b8d0c2f44";
        let request = attach(
            Request::new("{ me { uuid name email settings { private } } }"),
            Some(session(
                uuid,
                json!({ "name": "Ada", "email": "ada@example.com" }),
            )),
        );

        let response = schema.execute(request).await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        let data = response.data.into_json().unwrap();
        assert_eq!(data["me"]["uuid"], uuid);
        assert_eq!(data["me"]["name"], "Ada");
        assert_eq!(data["me"]["settings"]["private"], true);
    }

    #[tokio::test]
    async fn malformed_session_is_anonymous() {
        let schema = schema();
        let bad_traits = session(
            "6f1f3bb5-0a3e-4c0e-9a55-7b1b8d0c2f44",
            json!({ "name": 42 }),
        );

        let me = schema
            .execute(attach(Request::new("{ me { uuid } }"), Some(bad_traits.clone())))
            .await;
        assert_eq!(me.data.into_json().unwrap()["me"], serde_json::Value::Null);

        let mutation = schema
            .execute(attach(
                Request::new(r#"mutation { createList(name: "x") { id } }"#),
                Some(bad_traits),
            ))
            .await;
        assert_eq!(error_code(&mutation), Some(Value::from("UNAUTHORIZED")));
        assert_eq!(mutation.errors[0].message, "Unauthorized");
    }

    #[tokio::test]
    async fn requests_without_attached_data_are_anonymous() {
        let response = schema()
            .execute(Request::new(r#"mutation { deleteList(id: 1) { id } }"#))
            .await;
        assert_eq!(error_code(&response), Some(Value::from("UNAUTHORIZED")));
    }

    #[tokio::test]
    async fn bad_ids_surface_with_their_code() {
        let response = schema()
            .execute(Request::new("{ book(id: 12) { title } }"))
            .await;
        assert_eq!(response.errors[0].message, "No book was found with ID \"12\"");
        assert_eq!(error_code(&response), Some(Value::from("BAD_ID")));
    }

    #[tokio::test]
    async fn create_book_requires_an_author_list() {
        let schema = schema();
        let identity = || {
            Some(session(
                "6f1f3bb5-0a3e-4c0e-9a55-7b1b8d0c2f44",
                json!({ "name": "Ada", "email": "ada@example.com" }),
            ))
        };

        let missing = schema
            .execute(attach(
                Request::new(r#"mutation { createBook(input: { title: "Dune", isbn: "9780441013593" }) { id } }"#),
                identity(),
            ))
            .await;
        assert_eq!(missing.errors.len(), 1);
        assert!(missing.errors[0].message.contains("authors"), "{}", missing.errors[0].message);

        let empty = schema
            .execute(attach(
                Request::new(r#"mutation { createBook(input: { title: "Dune", isbn: "9780441013593", authors: [] }) { title } }"#),
                identity(),
            ))
            .await;
        assert!(empty.errors.is_empty(), "{:?}", empty.errors);
        assert!(schema_sdl().contains("authors: [Int!]!"));
    }

    #[test]
    fn sdl_names_the_public_types() {
        let sdl = schema_sdl();
        for needle in [
            "type CurrentUser",
            "type List",
            "enum Status",
            "TO_READ",
            "input CreateBook",
            "input UpdateSettings",
            "cloneList(",
        ] {
            assert!(sdl.contains(needle), "missing {needle}");
        }
    }
}
