//! crates/booklist_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The local record of a user, keyed by the identity provider's UUID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: i64,
    pub uuid: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Privacy settings attached to a profile. Exactly one row per profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub id: i64,
    pub profile_id: i64,
    pub private: bool,
    pub show_name: bool,
    pub show_stats: bool,
    pub show_collection: bool,
    pub show_lists_follows: bool,
    pub show_authors_follows: bool,
}

/// A full replacement of the settings flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsChanges {
    pub private: bool,
    pub show_name: bool,
    pub show_stats: bool,
    pub show_collection: bool,
    pub show_lists_follows: bool,
    pub show_authors_follows: bool,
}

/// A named reading list owned by one profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List {
    pub id: i64,
    pub profile_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a list.
#[derive(Debug, Clone)]
pub struct NewList {
    pub profile_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub published: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub isbn: String,
    pub published_at: Option<DateTime<Utc>>,
    pub page_count: Option<i32>,
    pub edition: Option<i32>,
    /// User-submitted books wait for moderation.
    pub needs_approval: bool,
    pub publisher_id: Option<i64>,
    /// The profile that submitted the book.
    pub profile_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A book as submitted by a user, before its references were checked.
#[derive(Debug, Clone, Default)]
pub struct BookDraft {
    pub title: String,
    pub isbn: String,
    pub published_at: Option<DateTime<Utc>>,
    pub page_count: Option<i32>,
    pub edition: Option<i32>,
    pub author_ids: Vec<i64>,
    pub publisher_id: Option<i64>,
}

/// A validated draft ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub draft: BookDraft,
    pub profile_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub birth_day: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publisher {
    pub id: i64,
    pub name: String,
}

/// Reading status of a book in a user's collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Status {
    #[default]
    ToRead,
    OnHold,
    Dropped,
    Reading,
    Read,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::ToRead,
        Status::OnHold,
        Status::Dropped,
        Status::Reading,
        Status::Read,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::ToRead => "TO_READ",
            Status::OnHold => "ON_HOLD",
            Status::Dropped => "DROPPED",
            Status::Reading => "READING",
            Status::Read => "READ",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0} is not a valid Status")]
pub struct InvalidStatus(pub String);

impl FromStr for Status {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidStatus(s.to_string()))
    }
}

/// A book tracked in a user's collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionItem {
    pub id: i64,
    pub profile_id: i64,
    pub book_id: i64,
    pub status: Status,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("TO_READ", Status::ToRead)]
    #[case("ON_HOLD", Status::OnHold)]
    #[case("DROPPED", Status::Dropped)]
    #[case("READING", Status::Reading)]
    #[case("READ", Status::Read)]
    fn parses_stored_status(#[case] raw: &str, #[case] expected: Status) {
        assert_eq!(raw.parse::<Status>().unwrap(), expected);
        assert_eq!(expected.to_string(), raw);
    }

    #[test]
    fn rejects_unknown_status() {
        let err = "FINISHED".parse::<Status>().unwrap_err();
        assert_eq!(err.to_string(), "FINISHED is not a valid Status");
    }

    #[test]
    fn new_items_default_to_to_read() {
        assert_eq!(Status::default(), Status::ToRead);
    }
}
