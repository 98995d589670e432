//! crates/booklist_core/src/identity.rs
//!
//! The identity model handed to us by the external identity provider, and the
//! step that turns a raw provider session into a typed `Identity`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A session as reported by the identity provider's `whoami` endpoint.
///
/// Only the fields this service reads are modelled; everything else in the
/// provider payload is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Session {
    pub id: String,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub identity: Option<SessionIdentity>,
}

/// The provider's view of the authenticated user.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SessionIdentity {
    pub id: String,
    /// Free-form traits bag, shaped by the provider's identity schema.
    #[serde(default)]
    pub traits: serde_json::Value,
}

/// The traits this service relies on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Traits {
    pub name: String,
    pub email: String,
}

/// A validated, typed user identity derived from a `Session`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uuid: Uuid,
    pub traits: Traits,
}

/// Reasons a session cannot produce an `Identity`.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("session is not active")]
    Inactive,
    #[error("session carries no identity")]
    MissingIdentity,
    #[error("identity id is not a valid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
    /// The provider payload no longer matches the expected traits shape.
    #[error("malformed identity traits: {0}")]
    MalformedTraits(#[from] serde_json::Error),
}

/// Resolves a provider session into an `Identity`.
///
/// Fails instead of resolving partially: either every field the service
/// needs is present and well-typed, or an `IdentityError` says what is wrong.
pub fn resolve_identity(session: &Session) -> Result<Identity, IdentityError> {
    if session.active == Some(false) {
        return Err(IdentityError::Inactive);
    }

    let identity = session
        .identity
        .as_ref()
        .ok_or(IdentityError::MissingIdentity)?;
    let uuid = Uuid::parse_str(&identity.id)?;
    let traits = Traits::deserialize(&identity.traits)?;

    Ok(Identity { uuid, traits })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    const USER_ID: &str = "9f0b6c1e-0d4e-4c8e-9a51-6a3e2f1b7c10";

    fn session_with(traits: serde_json::Value) -> Session {
        Session {
            id: "session-1".to_string(),
            active: Some(true),
            identity: Some(SessionIdentity {
                id: USER_ID.to_string(),
                traits,
            }),
        }
    }

    #[test]
    fn resolves_well_formed_session() {
        let session = session_with(json!({ "name": "Ada", "email": "ada@example.com" }));

        let identity = resolve_identity(&session).unwrap();

        assert_eq!(identity.uuid, Uuid::parse_str(USER_ID).unwrap());
        assert_eq!(identity.traits.name, "Ada");
        assert_eq!(identity.traits.email, "ada@example.com");
    }

    #[test]
    fn resolution_is_deterministic() {
        let session = session_with(json!({ "name": "Ada", "email": "ada@example.com" }));

        assert_eq!(
            resolve_identity(&session).unwrap(),
            resolve_identity(&session.clone()).unwrap()
        );
    }

    #[test]
    fn tolerates_extra_traits() {
        let session = session_with(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "locale": "en-GB"
        }));

        assert!(resolve_identity(&session).is_ok());
    }

    #[rstest]
    #[case(json!({ "email": "ada@example.com" }))]
    #[case(json!({ "name": "Ada" }))]
    #[case(json!({ "name": { "first": "Ada" }, "email": "ada@example.com" }))]
    #[case(json!(null))]
    #[case(json!("Ada"))]
    fn rejects_mismatched_traits(#[case] traits: serde_json::Value) {
        let err = resolve_identity(&session_with(traits)).unwrap_err();
        assert!(matches!(err, IdentityError::MalformedTraits(_)));
    }

    #[test]
    fn rejects_non_uuid_identity() {
        let mut session = session_with(json!({ "name": "Ada", "email": "ada@example.com" }));
        if let Some(identity) = session.identity.as_mut() {
            identity.id = "123".to_string();
        }

        let err = resolve_identity(&session).unwrap_err();
        assert!(matches!(err, IdentityError::InvalidUuid(_)));
    }

    #[test]
    fn rejects_session_without_identity() {
        let session = Session {
            id: "session-1".to_string(),
            active: Some(true),
            identity: None,
        };

        let err = resolve_identity(&session).unwrap_err();
        assert!(matches!(err, IdentityError::MissingIdentity));
    }

    #[test]
    fn rejects_inactive_session() {
        let mut session = session_with(json!({ "name": "Ada", "email": "ada@example.com" }));
        session.active = Some(false);

        let err = resolve_identity(&session).unwrap_err();
        assert!(matches!(err, IdentityError::Inactive));
    }

    #[test]
    fn deserializes_provider_payload() {
        let payload = json!({
            "id": "8c2b1f34",
            "active": true,
            "expires_at": "2030-01-01T00:00:00Z",
            "identity": {
                "id": USER_ID,
                "schema_id": "default",
                "traits": { "name": "Ada", "email": "ada@example.com" }
            }
        });

        let session: Session = serde_json::from_value(payload).unwrap();
        let identity = resolve_identity(&session).unwrap();

        assert_eq!(session.id, "8c2b1f34");
        assert_eq!(identity.traits.email, "ada@example.com");
    }
}
