//! Who is signed in.
//!
//! The session moves through `Unknown → Resolving → Resolved | Anonymous` and
//! publishes every state over a `watch` channel. The cart store listens and
//! loads the cart once an identity is resolved.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::services::AccountService;
use crate::types::Identity;

/// Authentication state of the current session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// Nothing has been checked yet.
    #[default]
    Unknown,
    /// The stored token is being checked against the backend.
    Resolving,
    /// The token belongs to this user.
    Resolved(Identity),
    /// No token, or the backend rejected it.
    Anonymous,
}

impl AuthState {
    /// Resolved with a complete identity (positive id, non-empty username).
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Resolved(identity) if identity.is_complete())
    }

    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Resolved(identity) => Some(identity),
            _ => None,
        }
    }

    /// Still waiting on the first answer.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Unknown | Self::Resolving)
    }
}

/// Shared, observable authentication state.
#[derive(Clone)]
pub struct AuthSession {
    tx: Arc<watch::Sender<AuthState>>,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("state", &*self.tx.borrow())
            .finish()
    }
}

impl AuthSession {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthState::Unknown);
        Self { tx: Arc::new(tx) }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    /// Receive every subsequent state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_authenticated()
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.tx.borrow().identity().cloned()
    }

    /// Mark the session as signed in as `identity`.
    pub fn set_resolved(&self, identity: Identity) {
        self.tx.send_replace(AuthState::Resolved(identity));
    }

    /// Mark the session as signed out.
    pub fn set_anonymous(&self) {
        self.tx.send_replace(AuthState::Anonymous);
    }

    /// Check the stored token against `GET /api/auth/me` and publish the
    /// outcome.
    ///
    /// A rejected token (401/403) is removed from the token store. Any other
    /// failure leaves the token in place for the next attempt.
    #[instrument(skip_all)]
    pub async fn resolve(&self, account: &AccountService) -> AuthState {
        if !account.has_token() {
            self.set_anonymous();
            return AuthState::Anonymous;
        }

        self.tx.send_replace(AuthState::Resolving);

        let next = match account.me().await {
            Ok(identity) if identity.is_complete() => {
                info!(user_id = %identity.id, "Session resolved");
                AuthState::Resolved(identity)
            }
            Ok(identity) => {
                warn!(user_id = %identity.id, "Backend returned an incomplete identity");
                AuthState::Anonymous
            }
            Err(e) if e.is_auth() => {
                warn!(status = ?e.status, "Stored token rejected, signing out");
                if let Err(io) = account.api().clear_token() {
                    warn!(error = %io, "Failed to remove stored token");
                }
                AuthState::Anonymous
            }
            Err(e) => {
                warn!(error = %e, kind = ?e.kind, "Could not resolve session");
                AuthState::Anonymous
            }
        };

        self.tx.send_replace(next.clone());
        next
    }

    /// Forget the stored token and publish `Anonymous`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token store cannot be cleared. The session is
    /// anonymous regardless.
    pub fn sign_out(&self, account: &AccountService) -> std::io::Result<()> {
        let result = account.api().clear_token();
        self.set_anonymous();
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sheshape_core::UserId;

    use super::*;

    fn identity(id: i64, username: &str) -> Identity {
        Identity {
            id: UserId::new(id),
            username: username.to_string(),
            email: None,
            role: None,
            is_active: Some(true),
        }
    }

    #[test]
    fn test_states() {
        let session = AuthSession::new();
        assert_eq!(session.state(), AuthState::Unknown);
        assert!(session.state().is_pending());
        assert!(!session.is_authenticated());

        session.set_resolved(identity(42, "jane"));
        assert!(session.is_authenticated());
        assert_eq!(session.identity().unwrap().id, UserId::new(42));

        session.set_anonymous();
        assert!(!session.is_authenticated());
        assert!(session.identity().is_none());
    }

    #[test]
    fn test_incomplete_identity_is_not_authenticated() {
        let state = AuthState::Resolved(identity(0, "jane"));
        assert!(!state.is_authenticated());
        let state = AuthState::Resolved(identity(5, " "));
        assert!(!state.is_authenticated());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let session = AuthSession::new();
        let mut rx = session.subscribe();

        session.set_resolved(identity(1, "a"));
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_authenticated());
    }
}
