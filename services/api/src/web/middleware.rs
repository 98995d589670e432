//! services/api/src/web/middleware.rs
//!
//! Session middleware. Every request passes through; the identity provider's
//! answer is stored in the request extensions for the GraphQL handler.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use booklist_core::identity::Session;
use booklist_core::ports::IdentityProvider;
use std::sync::Arc;
use tracing::{debug, error};

/// The provider session of the current request, if any.
#[derive(Clone, Debug, Default)]
pub struct ProviderSession(pub Option<Session>);

/// Resolves the caller's session from the `Cookie` header.
///
/// Never rejects a request: without cookies, with rejected cookies, or when
/// the provider fails, the request continues anonymously.
pub async fn resolve_session(
    State(provider): State<Arc<dyn IdentityProvider>>,
    mut req: Request,
    next: Next,
) -> Response {
    let cookies = req
        .headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ");

    let session = if cookies.trim().is_empty() {
        None
    } else {
        match provider.session_from_cookies(&cookies).await {
            Ok(session) => session,
            Err(e) => {
                error!("Failed to fetch session from identity provider: {:?}", e);
                None
            }
        }
    };
    debug!(authenticated = session.is_some(), "Resolved request session");

    req.extensions_mut().insert(ProviderSession(session));
    next.run(req).await
}
