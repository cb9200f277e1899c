//! Session data model.

use serde::{Deserialize, Serialize};

/// The signed-in user. Every field is required; a record missing any of
/// them is not a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl User {
    /// All fields present and non-blank.
    pub fn is_complete(&self) -> bool {
        !self.id.trim().is_empty() && !self.email.trim().is_empty() && !self.name.trim().is_empty()
    }
}

/// What the client currently knows about who is signed in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Persisted state has not been read yet.
    #[default]
    Loading,
    /// Definitely nobody signed in.
    Anonymous,
    Authenticated(User),
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}
