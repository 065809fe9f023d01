//! Per-session state
//!
//! Each client session owns its own [`Ledger`] and its own Plaid access
//! token, so two browsers never see each other's inbox or bank link. Sessions
//! are created on first use from a template ledger and dropped after an idle
//! TTL; expired sessions are swept whenever a new one is created.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::store::Ledger;

/// Session id used when a client does not send one
pub const DEFAULT_SESSION: &str = "default";

/// One client's collections and provider link
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub ledger: Ledger,
    /// Set by a successful public-token exchange
    pub plaid_access_token: Option<String>,
}

impl Session {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            plaid_access_token: None,
        }
    }

    pub fn is_plaid_connected(&self) -> bool {
        self.plaid_access_token.is_some()
    }
}

struct SessionSlot {
    session: Arc<Mutex<Session>>,
    last_access: Instant,
}

impl SessionSlot {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.last_access.elapsed() > ttl
    }
}

/// Session registry keyed by client-supplied session id
pub struct SessionManager {
    sessions: RwLock<HashMap<String, SessionSlot>>,
    template: Ledger,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(template: Ledger, ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            template,
            ttl,
        }
    }

    /// Get a session, creating it from the template if missing or expired
    pub async fn get_or_create(&self, session_id: &str) -> Arc<Mutex<Session>> {
        let mut sessions = self.sessions.write().await;

        if let Some(slot) = sessions.get_mut(session_id) {
            if !slot.is_expired(self.ttl) {
                slot.last_access = Instant::now();
                return Arc::clone(&slot.session);
            }
            debug!(session_id, "Session expired, recreating");
        }

        // Clean up expired sessions while we're here
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(self.ttl));
        let swept = before - sessions.len();
        if swept > 0 {
            info!(swept, "Dropped idle sessions");
        }

        let session = Arc::new(Mutex::new(Session::new(self.template.clone())));
        sessions.insert(
            session_id.to_string(),
            SessionSlot {
                session: Arc::clone(&session),
                last_access: Instant::now(),
            },
        );
        session
    }

    /// Delete a session
    pub async fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    /// Number of live (unexpired) sessions
    pub async fn len(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.values().filter(|s| !s.is_expired(self.ttl)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
