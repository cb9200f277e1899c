//! Identity providers: turn credentials into a `User`.

use async_trait::async_trait;
use secrecy::SecretString;
use uuid::Uuid;

use crate::error::SessionError;
use crate::session::model::User;

/// Source of user records for sign-in and sign-up.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<User, SessionError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
        name: &str,
    ) -> Result<User, SessionError>;
}

/// Synthesizes users locally without contacting any server. The password is
/// accepted as-is; this is a placeholder, not an authentication scheme.
///
/// Ids are derived from the normalized email so the same address always maps
/// to the same backend task list.
#[derive(Debug, Default)]
pub struct LocalIdentityProvider;

impl LocalIdentityProvider {
    pub fn new() -> Self {
        Self
    }

    /// Stable id for an email address (UUID v5 over `mailto:<email>`).
    pub fn user_id_for(email: &str) -> String {
        let normalized = normalize_email(email);
        Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("mailto:{normalized}").as_bytes()).to_string()
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_in(&self, email: &str, _password: &SecretString) -> Result<User, SessionError> {
        let email = normalize_email(email);
        let name = email
            .split('@')
            .next()
            .filter(|local| !local.is_empty())
            .unwrap_or(email.as_str())
            .to_string();
        Ok(User {
            id: Self::user_id_for(&email),
            email,
            name,
        })
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &SecretString,
        name: &str,
    ) -> Result<User, SessionError> {
        let email = normalize_email(email);
        Ok(User {
            id: Self::user_id_for(&email),
            email,
            name: name.trim().to_string(),
        })
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
