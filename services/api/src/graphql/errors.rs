//! services/api/src/graphql/errors.rs
//!
//! The only error shapes that leave the resolver layer. Store failures are
//! classified here and never returned verbatim.

use async_graphql::ErrorExtensions;
use booklist_core::ports::PortError;
use tracing::error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolverError {
    /// No usable session on a request that needs one.
    #[error("Unauthorized")]
    Unauthorized,

    /// The entity is missing or belongs to someone else. The two cases are
    /// reported identically.
    #[error("No {entity} was found with ID \"{id}\"")]
    BadId { entity: &'static str, id: i64 },

    /// Like `BadId`, for entities addressed by UUID.
    #[error("No {entity} was found with ID \"{id}\"")]
    BadUuid { entity: &'static str, id: Uuid },

    #[error("InternalServerError")]
    Internal,
}

pub type ResolverResult<T> = Result<T, ResolverError>;

impl ResolverError {
    pub fn bad_id(entity: &'static str, id: i64) -> Self {
        Self::BadId { entity, id }
    }

    /// The machine readable code sent in `extensions.code`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::BadId { .. } | Self::BadUuid { .. } => "BAD_ID",
            Self::Internal => "INTERNAL",
        }
    }

    /// Logs a store failure and hides it behind `Internal`.
    pub fn internal(err: PortError) -> Self {
        error!("Store operation failed: {}", err);
        Self::Internal
    }

    /// `NotFound` becomes `BadId(entity, id)`, anything else `Internal`.
    pub fn or_bad_id(entity: &'static str, id: i64) -> impl FnOnce(PortError) -> Self {
        move |err| match err {
            PortError::NotFound(_) => Self::bad_id(entity, id),
            other => Self::internal(other),
        }
    }
}

impl ErrorExtensions for ResolverError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.code();
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ResolverError::Unauthorized, "Unauthorized", "UNAUTHORIZED")]
    #[case(ResolverError::bad_id("list", 7), "No list was found with ID \"7\"", "BAD_ID")]
    #[case(
        ResolverError::bad_id("collectionItem", 3),
        "No collectionItem was found with ID \"3\"",
        "BAD_ID"
    )]
    #[case(ResolverError::Internal, "InternalServerError", "INTERNAL")]
    fn messages_and_codes(
        #[case] err: ResolverError,
        #[case] message: &str,
        #[case] code: &str,
    ) {
        assert_eq!(err.to_string(), message);
        assert_eq!(err.code(), code);
    }

    #[test]
    fn uuid_ids_share_the_bad_id_wording() {
        let id = Uuid::nil();
        let err = ResolverError::BadUuid { entity: "user", id };
        assert_eq!(
            err.to_string(),
            "No user was found with ID \"00000000-0000-0000-0000-000000000000\""
        );
        assert_eq!(err.code(), "BAD_ID");
    }

    #[test]
    fn port_errors_are_classified() {
        let not_found = ResolverError::or_bad_id("book", 4)(PortError::NotFound("gone".into()));
        assert_eq!(not_found, ResolverError::bad_id("book", 4));

        let broken =
            ResolverError::or_bad_id("book", 4)(PortError::Unexpected("pool timed out".into()));
        assert_eq!(broken, ResolverError::Internal);
        assert!(!broken.to_string().contains("pool"));
    }

    #[test]
    fn graphql_error_carries_code_extension() {
        let err = ResolverError::bad_id("list", 1).extend();
        assert_eq!(err.message, "No list was found with ID \"1\"");
        let extensions = err.extensions.expect("extensions set");
        assert_eq!(
            extensions.get("code"),
            Some(&async_graphql::Value::from("BAD_ID"))
        );
    }
}
