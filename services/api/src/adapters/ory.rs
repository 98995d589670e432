//! services/api/src/adapters/ory.rs
//!
//! Identity provider adapter for an Ory Kratos compatible `whoami` endpoint.

use async_trait::async_trait;
use booklist_core::identity::Session;
use booklist_core::ports::{IdentityProvider, PortError, PortResult};
use reqwest::{header, Client, StatusCode};
use std::time::Duration;

pub struct OryIdentityAdapter {
    client: Client,
    whoami_url: String,
}

impl OryIdentityAdapter {
    /// Builds the adapter. `base_url` must not end with a slash.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            whoami_url: whoami_url(base_url),
        })
    }
}

fn whoami_url(base_url: &str) -> String {
    format!("{}/sessions/whoami", base_url.trim_end_matches('/'))
}

/// Interprets the provider's answer. 401 and 403 mean "no session".
fn interpret(status: StatusCode, body: &[u8]) -> PortResult<Option<Session>> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(PortError::Unexpected(format!(
            "Identity provider answered with status {}",
            status
        )));
    }
    let session = serde_json::from_slice::<Session>(body)
        .map_err(|e| PortError::Unexpected(format!("Invalid session payload: {}", e)))?;
    Ok(Some(session))
}

#[async_trait]
impl IdentityProvider for OryIdentityAdapter {
    async fn session_from_cookies(&self, cookies: &str) -> PortResult<Option<Session>> {
        let response = self
            .client
            .get(&self.whoami_url)
            .header(header::COOKIE, cookies)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        interpret(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn builds_whoami_url() {
        assert_eq!(
            whoami_url("http://127.0.0.1:4433"),
            "http://127.0.0.1:4433/sessions/whoami"
        );
        assert_eq!(
            whoami_url("https://auth.example.com/"),
            "https://auth.example.com/sessions/whoami"
        );
    }

    #[rstest]
    #[case(StatusCode::UNAUTHORIZED)]
    #[case(StatusCode::FORBIDDEN)]
    fn rejected_cookies_mean_no_session(#[case] status: StatusCode) {
        assert!(interpret(status, b"{}").unwrap().is_none());
    }

    #[rstest]
    #[case(StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(StatusCode::BAD_GATEWAY)]
    #[case(StatusCode::NOT_FOUND)]
    fn other_failures_are_unexpected(#[case] status: StatusCode) {
        assert!(matches!(
            interpret(status, b""),
            Err(PortError::Unexpected(_))
        ));
    }

    #[test]
    fn parses_a_session_payload() {
        let body = br#"{
            "id": "c1a7bb0f-7d4b-4e53-9d5a-1d4c0b8f3e21",
            "active": true,
            "identity": {
                "id": "9f0f4c1e-5a55-4b0b-8c6e-2f8d1f2b7a10",
                "traits": { "name": "Ada", "email": "ada@example.com" }
            }
        }"#;

        let session = interpret(StatusCode::OK, body).unwrap().unwrap();
        assert_eq!(session.active, Some(true));
        assert_eq!(
            session.identity.unwrap().id,
            "9f0f4c1e-5a55-4b0b-8c6e-2f8d1f2b7a10"
        );
    }

    #[test]
    fn garbage_payload_is_unexpected() {
        assert!(matches!(
            interpret(StatusCode::OK, b"<html>"),
            Err(PortError::Unexpected(_))
        ));
    }
}
