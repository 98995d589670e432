pub mod db;
pub mod memory;
pub mod ory;

pub use db::DbAdapter;
pub use memory::MemoryStore;
pub use ory::OryIdentityAdapter;
