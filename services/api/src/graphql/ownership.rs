//! services/api/src/graphql/ownership.rs
//!
//! Authorization gate for mutations that touch a single owned entity.

use booklist_core::domain::Profile;
use booklist_core::identity::Identity;
use booklist_core::ports::PortError;

use super::errors::{ResolverError, ResolverResult};
use crate::web::state::AppState;

/// Entities that belong to exactly one profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owned {
    List,
    CollectionItem,
}

impl Owned {
    pub fn entity(self) -> &'static str {
        match self {
            Owned::List => "list",
            Owned::CollectionItem => "collectionItem",
        }
    }
}

pub struct OwnershipChecker<'a> {
    state: &'a AppState,
}

impl<'a> OwnershipChecker<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Returns the caller's profile when it owns `kind` #`id`.
    ///
    /// A missing entity and someone else's entity both yield
    /// `BadId(kind, id)`. Store failures yield `Internal`.
    pub async fn ensure_owned(
        &self,
        kind: Owned,
        id: i64,
        identity: &Identity,
    ) -> ResolverResult<Profile> {
        let profile = self
            .state
            .users
            .find_or_create_profile(identity.uuid)
            .await
            .map_err(ResolverError::internal)?;

        match self.owner_of(kind, id).await? {
            Some(owner) if owner == profile.id => Ok(profile),
            _ => Err(ResolverError::bad_id(kind.entity(), id)),
        }
    }

    /// Like `ensure_owned`, but answers with a plain yes or no.
    pub async fn is_owned(&self, kind: Owned, id: i64, identity: &Identity) -> ResolverResult<bool> {
        match self.ensure_owned(kind, id, identity).await {
            Ok(_) => Ok(true),
            Err(ResolverError::BadId { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn owner_of(&self, kind: Owned, id: i64) -> ResolverResult<Option<i64>> {
        let found = match kind {
            Owned::List => self.state.lists.find_list(id).await.map(|l| l.profile_id),
            Owned::CollectionItem => self
                .state
                .collection
                .find_item(id)
                .await
                .map(|i| i.profile_id),
        };

        match found {
            Ok(owner) => Ok(Some(owner)),
            Err(PortError::NotFound(_)) => Ok(None),
            Err(err) => Err(ResolverError::internal(err)),
        }
    }
}
