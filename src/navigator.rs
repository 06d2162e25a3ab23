use tokio::sync::watch;
use tracing::{debug, info};

use crate::models::MatchStatus;
use crate::store::SessionSnapshot;

/// Entry screens a reconciliation race must never yank the user away from.
const ENTRY_SCREENS: [&str; 2] = ["/login", "/register"];

/// Callback invoked to request a navigation from the routing collaborator.
pub type NavigateFn = Box<dyn Fn(&str) + Send + Sync + 'static>;

/// Compute the screen a snapshot maps to, if any.
///
/// Statuses that require a match reference produce no destination while the
/// reference is absent; the state is treated as still unreconciled. Unknown
/// statuses produce no destination either.
pub fn route_for(snapshot: &SessionSnapshot) -> Option<String> {
    let status = snapshot.status.as_ref()?;
    match status {
        MatchStatus::Idle => Some("/lobbies".to_string()),
        MatchStatus::InLobby => snapshot
            .match_id
            .as_ref()
            .map(|m| format!("/lobbies/{m}/approved")),
        MatchStatus::Navigating => snapshot
            .match_id
            .as_ref()
            .map(|m| format!("/matches/{m}/navigation")),
        MatchStatus::Completed => snapshot
            .match_id
            .as_ref()
            .map(|m| format!("/matches/{m}/completed")),
        MatchStatus::Unknown(other) => {
            debug!(status = %other, "no route for unknown status");
            None
        }
    }
}

fn is_entry_screen(path: &str) -> bool {
    ENTRY_SCREENS.iter().any(|p| path.starts_with(p))
}

/// Observes session snapshots and keeps the user on the screen the state
/// maps to.
///
/// A transition is requested only when a destination is computed, it differs
/// from the current screen, and the current screen is not an unauthenticated
/// entry screen. The navigator performs no state mutation of its own; its
/// only side effect is the navigate callback.
pub struct Navigator {
    current_path: String,
    navigate: NavigateFn,
}

impl Navigator {
    pub fn new(initial_path: impl Into<String>, navigate: NavigateFn) -> Self {
        Self {
            current_path: initial_path.into(),
            navigate,
        }
    }

    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    /// Tell the navigator the user moved on their own (back button, link).
    pub fn set_current_path(&mut self, path: impl Into<String>) {
        self.current_path = path.into();
    }

    /// React to one snapshot. Returns the destination when a transition was
    /// requested.
    pub fn observe(&mut self, snapshot: &SessionSnapshot) -> Option<String> {
        let target = route_for(snapshot)?;
        if target == self.current_path {
            return None;
        }
        if is_entry_screen(&self.current_path) {
            debug!(current = %self.current_path, %target,
                "suppressing navigation away from entry screen");
            return None;
        }

        info!(from = %self.current_path, to = %target, "navigating");
        (self.navigate)(&target);
        self.current_path = target.clone();
        Some(target)
    }

    /// Drive the navigator from the store's watch channel until the store is
    /// dropped.
    pub async fn run(mut self, mut rx: watch::Receiver<SessionSnapshot>) {
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            self.observe(&snapshot);
        }
        debug!("session store closed, navigator stopping");
    }
}
