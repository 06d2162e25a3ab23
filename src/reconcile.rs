use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::directory::MatchDirectory;
use crate::error::SyncError;
use crate::models::UserId;
use crate::store::{SessionSnapshot, SessionStore};

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No identity to reconcile; the store was left untouched.
    Skipped,
    /// Both lookups succeeded and this snapshot was committed.
    Applied(SessionSnapshot),
    /// A lookup failed or the response violated the session invariant; the
    /// store was reset.
    Reset,
    /// A newer pass committed first; this pass's result was discarded.
    Superseded,
}

/// Re-derives the authoritative local session state from the server of
/// record and commits it into the store.
///
/// Passes may overlap (startup restore racing a push-triggered restore).
/// Each pass takes a monotonically increasing epoch token when it starts and
/// may only commit while no pass with a higher token has committed, so the
/// store never mixes fields from two in-flight passes and a stale completion
/// is discarded rather than applied.
pub struct Reconciler<D: MatchDirectory> {
    directory: D,
    store: SessionStore,
    epoch: AtomicU64,
    committed: Mutex<u64>,
    failure_streak: AtomicU32,
}

impl<D: MatchDirectory> Reconciler<D> {
    pub fn new(directory: D, store: SessionStore) -> Self {
        Self {
            directory,
            store,
            epoch: AtomicU64::new(0),
            committed: Mutex::new(0),
            failure_streak: AtomicU32::new(0),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Run one reconciliation pass for `user_id`.
    ///
    /// An absent identity is a benign skip: a client with no authenticated
    /// identity has nothing to reconcile. Lookup failures never propagate;
    /// they reset the store and are reported as `Reset`.
    pub async fn reconcile(&self, user_id: Option<UserId>) -> ReconcileOutcome {
        let Some(user_id) = user_id else {
            debug!("reconcile skipped: no identity");
            return ReconcileOutcome::Skipped;
        };

        let token = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(user_id, token, "reconcile pass started");

        // Only a pass that actually commits may touch the failure streak; a
        // superseded result says nothing about the current state.
        match self.lookup(user_id).await {
            Ok(snapshot) => {
                if self.commit(token, snapshot.clone()) {
                    self.failure_streak.store(0, Ordering::SeqCst);
                    info!(user_id, match_id = ?snapshot.match_id, status = ?snapshot.status,
                        "session state reconciled");
                    ReconcileOutcome::Applied(snapshot)
                } else {
                    debug!(user_id, token, "reconcile result superseded by a newer pass");
                    ReconcileOutcome::Superseded
                }
            }
            Err(e) => {
                let streak = self.failure_streak.load(Ordering::SeqCst) + 1;
                warn!(user_id, streak, error = %e, "reconcile failed, resetting session state");
                // Never leave a stale match reference paired with a fresh
                // status or vice versa. A second consecutive failure clears
                // the snapshot entirely.
                let reset = if streak >= 2 {
                    SessionSnapshot::default()
                } else {
                    SessionSnapshot::unreconciled(user_id)
                };
                if self.commit(token, reset) {
                    self.failure_streak.store(streak, Ordering::SeqCst);
                    ReconcileOutcome::Reset
                } else {
                    debug!(user_id, token, "reconcile reset superseded by a newer pass");
                    ReconcileOutcome::Superseded
                }
            }
        }
    }

    /// Fetch match reference and status, then validate them as a pair.
    async fn lookup(&self, user_id: UserId) -> Result<SessionSnapshot, SyncError> {
        let match_id = self.directory.fetch_match(user_id).await?;
        let status = self.directory.fetch_status(user_id).await?;

        let snapshot = SessionSnapshot::new(user_id, match_id, Some(status));
        if !snapshot.is_consistent() {
            return Err(SyncError::InvariantViolation(format!(
                "status {:?} requires a match reference but none was returned",
                snapshot.status
            )));
        }
        Ok(snapshot)
    }

    /// Commit `snapshot` unless a newer pass already committed. Returns
    /// whether the write was applied.
    fn commit(&self, token: u64, snapshot: SessionSnapshot) -> bool {
        // The lock spans the staleness check and the store write, so the
        // check cannot race another pass's commit.
        let mut committed = self
            .committed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if token < *committed {
            return false;
        }
        *committed = token;
        self.store.replace(snapshot);
        true
    }
}
