//! Session store: who is signed in, shared by every view.
//!
//! One store is created at startup and handed to views by `Arc`. Views read
//! the current state synchronously with [`SessionStore::session`] and get
//! notified of changes through [`SessionStore::subscribe`].

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::SessionError;
use crate::navigation::{Navigator, Route};
use crate::session::identity::IdentityProvider;
use crate::session::model::{SessionState, User};
use crate::session::storage::KeyValueStore;

/// Storage key holding the serialized user.
pub const SESSION_KEY: &str = "todo_chat_user";

pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    identity: Arc<dyn IdentityProvider>,
    navigator: Arc<dyn Navigator>,
    redirect_after_auth: bool,
    state: watch::Sender<SessionState>,
}

impl SessionStore {
    /// Create a store in the `Loading` state. Call [`load`](Self::load) once
    /// before relying on the session.
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        identity: Arc<dyn IdentityProvider>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (state, _rx) = watch::channel(SessionState::Loading);
        Self {
            storage,
            identity,
            navigator,
            redirect_after_auth: true,
            state,
        }
    }

    /// Builder: navigate to the dashboard after sign-in / sign-up.
    pub fn with_redirect_after_auth(mut self, redirect: bool) -> Self {
        self.redirect_after_auth = redirect;
        self
    }

    /// Read the persisted user. Missing or malformed records resolve to
    /// `Anonymous`; this never fails.
    pub async fn load(&self) -> SessionState {
        let state = match self.storage.get(SESSION_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) if user.is_complete() => SessionState::Authenticated(user),
                Ok(_) => {
                    warn!("Persisted session has blank fields; treating as signed out");
                    SessionState::Anonymous
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse persisted session; treating as signed out");
                    SessionState::Anonymous
                }
            },
            Ok(None) => SessionState::Anonymous,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted session; treating as signed out");
                SessionState::Anonymous
            }
        };

        self.state.send_replace(state.clone());
        state
    }

    /// Current state. `Loading` until [`load`](Self::load) has completed.
    pub fn session(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    pub fn user_id(&self) -> Option<String> {
        self.state.borrow().user().map(|u| u.id.clone())
    }

    /// Receive every subsequent state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub async fn sign_in(&self, email: &str, password: SecretString) -> Result<User, SessionError> {
        validate_credentials(email, &password)?;
        let user = self.identity.sign_in(email, &password).await?;
        self.establish(user).await
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: SecretString,
        name: &str,
    ) -> Result<User, SessionError> {
        validate_credentials(email, &password)?;
        if name.trim().is_empty() {
            return Err(SessionError::InvalidCredentials("name is required".into()));
        }
        let user = self.identity.sign_up(email, &password, name).await?;
        self.establish(user).await
    }

    /// Clear persisted and in-memory state, then go to the login route. The
    /// in-memory state is cleared even when storage removal fails.
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        let removed = self.storage.remove(SESSION_KEY).await;
        if let Err(ref e) = removed {
            warn!(error = %e, "Failed to remove persisted session");
        }

        self.state.send_replace(SessionState::Anonymous);
        info!("Signed out");
        self.navigator.navigate(Route::Login);
        removed
    }

    async fn establish(&self, user: User) -> Result<User, SessionError> {
        if !user.is_complete() {
            return Err(SessionError::InvalidCredentials(
                "identity provider returned an incomplete user".into(),
            ));
        }

        let raw = serde_json::to_string(&user)?;
        self.storage.set(SESSION_KEY, &raw).await?;
        self.state
            .send_replace(SessionState::Authenticated(user.clone()));

        info!(user_id = %user.id, "Signed in");
        if self.redirect_after_auth {
            self.navigator.navigate(Route::Dashboard);
        }
        Ok(user)
    }
}

fn validate_credentials(email: &str, password: &SecretString) -> Result<(), SessionError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(SessionError::InvalidCredentials(
            "a valid email address is required".into(),
        ));
    }
    if password.expose_secret().is_empty() {
        return Err(SessionError::InvalidCredentials("password is required".into()));
    }
    Ok(())
}
