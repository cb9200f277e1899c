//! Client-side authentication session.

pub mod identity;
pub mod model;
pub mod storage;
pub mod store;

pub use identity::{IdentityProvider, LocalIdentityProvider};
pub use model::{SessionState, User};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{SESSION_KEY, SessionStore};
