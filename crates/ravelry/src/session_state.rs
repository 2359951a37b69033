use crate::session::Session;
use crate::token_store::TokenStore;
use chrono::{DateTime, Utc};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Unauthenticated,
    Authenticated,
}

/// Whether a usable session exists, derived from a `TokenStore`.
///
/// Created with [`SessionState::attach`] once the store is open. Each clone
/// is an independent subscriber; dropping it unsubscribes.
#[derive(Clone)]
pub struct SessionState {
    rx: watch::Receiver<Option<Session>>,
    last: AuthStatus,
}

impl SessionState {
    pub fn compute(session: Option<&Session>, now: DateTime<Utc>) -> AuthStatus {
        match session {
            Some(session) if !session.is_expired_at(now) => AuthStatus::Authenticated,
            _ => AuthStatus::Unauthenticated,
        }
    }

    pub fn attach(store: &TokenStore) -> Self {
        let rx = store.subscribe();
        let last = Self::compute(rx.borrow().as_ref(), Utc::now());
        Self { rx, last }
    }

    /// Re-derives the status from the latest stored session, including expiry.
    pub fn current(&self) -> AuthStatus {
        Self::compute(self.rx.borrow().as_ref(), Utc::now())
    }

    /// Waits for the derived status to differ from the last one reported.
    /// Returns `None` once the store has been dropped.
    pub async fn next_transition(&mut self) -> Option<AuthStatus> {
        loop {
            if self.rx.changed().await.is_err() {
                return None;
            }
            let status = Self::compute(self.rx.borrow_and_update().as_ref(), Utc::now());
            if status != self.last {
                self.last = status;
                return Some(status);
            }
        }
    }
}
