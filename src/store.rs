use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::trace;

use crate::models::{MatchId, MatchStatus, UserId};

/// The client's local view of the matching session: identity, match
/// reference, and lifecycle status.
///
/// Invariant (enforced by the reconciler, not here): a missing status implies
/// a missing match reference, and every known non-idle status carries one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub user_id: Option<UserId>,
    pub match_id: Option<MatchId>,
    pub status: Option<MatchStatus>,
}

impl SessionSnapshot {
    pub fn new(user_id: UserId, match_id: Option<MatchId>, status: Option<MatchStatus>) -> Self {
        Self {
            user_id: Some(user_id),
            match_id,
            status,
        }
    }

    /// An identity-only snapshot, the reset target after a failed restore.
    pub fn unreconciled(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            match_id: None,
            status: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.match_id.is_none() && self.status.is_none()
    }

    /// Check the match-reference invariant against this snapshot.
    pub fn is_consistent(&self) -> bool {
        match &self.status {
            None => self.match_id.is_none(),
            Some(status) => !(status.requires_match() && self.match_id.is_none()),
        }
    }
}

/// Single-owner store for the session snapshot.
///
/// Writes are whole-value replacements observed by every subscriber in commit
/// order; a write equal to the current value notifies no one. The store has
/// no network or storage side effects and never fails; validating what goes
/// in is the reconciler's job.
#[derive(Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<SessionSnapshot>>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SessionSnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn read(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    /// Atomically replace the snapshot. Subscribers are only woken when the
    /// value actually changed.
    pub fn replace(&self, next: SessionSnapshot) {
        let changed = self.tx.send_if_modified(|current| {
            if *current != next {
                *current = next;
                true
            } else {
                false
            }
        });
        trace!(changed, "session snapshot write");
    }

    /// Clear the snapshot entirely (logout or repeated restore failure).
    pub fn clear(&self) {
        self.replace(SessionSnapshot::default());
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
