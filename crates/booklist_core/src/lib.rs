pub mod domain;
pub mod identity;
pub mod ports;

pub use domain::{
    Author, Book, BookDraft, CollectionItem, List, NewBook, NewList, Profile, Publisher,
    Settings, SettingsChanges, Status,
};
pub use identity::{resolve_identity, Identity, IdentityError, Session, SessionIdentity, Traits};
pub use ports::{
    CatalogueStore, CollectionStore, IdentityProvider, ListStore, PortError, PortResult,
    UserStore,
};
