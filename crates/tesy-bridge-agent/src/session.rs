//! Vendor session ownership.
//!
//! The bridge is "ready" exactly when it holds a session. Login replaces the
//! session on success and clears it on failure; any failed authenticated
//! call clears it through [`SessionManager::invalidate`].

use tesy_bridge_adapter_tesy::{Credentials, Session, WaterHeaterApi};
use tokio::sync::RwLock;

/// Credentials plus the current session, if any.
#[derive(Debug)]
pub struct SessionManager {
    credentials: Credentials,
    session: RwLock<Option<Session>>,
}

impl SessionManager {
    /// Create a manager with no session.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            session: RwLock::new(None),
        }
    }

    /// Log in with the configured credentials.
    ///
    /// Returns whether a session is now held.
    pub async fn login<A: WaterHeaterApi + ?Sized>(&self, api: &A) -> bool {
        match api.login(&self.credentials).await {
            Ok(session) => {
                *self.session.write().await = Some(session);
                tracing::info!(username = %self.credentials.username, "Login OK");
                true
            }
            Err(e) => {
                *self.session.write().await = None;
                tracing::error!(
                    username = %self.credentials.username,
                    error = %e,
                    "Login failed"
                );
                false
            }
        }
    }

    /// Current session, if ready.
    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// Whether a session is held.
    pub async fn is_ready(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Drop the session after a failed authenticated call.
    pub async fn invalidate(&self) {
        if self.session.write().await.take().is_some() {
            tracing::warn!("Session invalidated");
        }
    }
}
