//! services/api/src/graphql/context.rs
//!
//! Carries the provider session of one request into the resolvers.

use async_graphql::{Context, Request};
use booklist_core::identity::{resolve_identity, Identity, Session};
use tracing::warn;

/// The session attached to a single GraphQL request, resolved once.
pub struct RequestSession {
    session: Option<Session>,
    identity: Option<Identity>,
}

impl RequestSession {
    /// Resolves the identity up front. A malformed session is logged here and
    /// nowhere else, however many fields the request selects.
    pub fn new(session: Option<Session>) -> Self {
        let identity = session
            .as_ref()
            .and_then(|session| match resolve_identity(session) {
                Ok(identity) => Some(identity),
                Err(err) => {
                    warn!(session_id = %session.id, "Treating session as anonymous: {}", err);
                    None
                }
            });
        Self { session, identity }
    }
}

/// Stores `session` in the request data. Each request owns its copy.
pub fn attach(request: Request, session: Option<Session>) -> Request {
    request.data(RequestSession::new(session))
}

/// Returns the attached session and its identity.
///
/// `None` covers every "no active user" case: nothing attached, an absent
/// session, or a session that does not resolve to an identity.
pub fn retrieve<'a>(ctx: &Context<'a>) -> Option<(&'a Session, Identity)> {
    let attached = ctx.data_opt::<RequestSession>()?;
    let session = attached.session.as_ref()?;
    let identity = attached.identity.clone()?;
    Some((session, identity))
}

/// Shorthand for resolvers that only need the identity.
pub fn caller(ctx: &Context<'_>) -> Option<Identity> {
    retrieve(ctx).map(|(_, identity)| identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use crate::graphql::build_schema;
    use crate::web::state::AppState;
    use booklist_core::identity::SessionIdentity;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context as LayerContext, Layer, SubscriberExt};

    /// Counts `WARN` events.
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
            if *event.metadata().level() == Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn malformed() -> Session {
        Session {
            id: "session-7".to_string(),
            active: Some(true),
            identity: Some(SessionIdentity {
                id: "6f1f3bb5-0a3e-4c0e-9a55-7b1b8d0c2f44".to_string(),
                traits: json!({ "email": "no-name@example.com" }),
            }),
        }
    }

    #[test]
    fn malformed_session_warns_once_per_request() {
        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(warnings.clone()));
        let schema = build_schema(Arc::new(AppState::from_store(Arc::new(MemoryStore::new()))));

        let response = tracing::subscriber::with_default(subscriber, || {
            futures::executor::block_on(schema.execute(attach(
                Request::new("{ me { uuid } again: me { uuid } third: me { name } }"),
                Some(malformed()),
            )))
        });

        assert!(response.errors.is_empty(), "{:?}", response.errors);
        let data = response.data.into_json().unwrap();
        assert_eq!(data["me"], serde_json::Value::Null);
        assert_eq!(data["again"], serde_json::Value::Null);
        assert_eq!(warnings.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn absent_session_resolves_quietly() {
        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(warnings.clone()));

        let attached = tracing::subscriber::with_default(subscriber, || RequestSession::new(None));

        assert!(attached.session.is_none());
        assert!(attached.identity.is_none());
        assert_eq!(warnings.load(Ordering::SeqCst), 0);
    }
}
