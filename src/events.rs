use crate::store::SessionSnapshot;

/// Events broadcast by the client as the connection and session state evolve.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// The push connection came up (initial open or reconnect).
    Connected,
    /// The push connection dropped unexpectedly; `attempt` is the value of
    /// the retry counter after this close.
    Disconnected { attempt: u32 },
    /// The retry cap was reached; no further reconnect attempts will be made.
    ConnectionAbandoned,
    /// A reconciliation pass committed this snapshot.
    Reconciled(SessionSnapshot),
    /// A reconciliation pass failed and the store was reset.
    ReconcileFailed,
}

impl SyncEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            SyncEvent::Connected => "connected",
            SyncEvent::Disconnected { .. } => "disconnected",
            SyncEvent::ConnectionAbandoned => "connection_abandoned",
            SyncEvent::Reconciled(_) => "reconciled",
            SyncEvent::ReconcileFailed => "reconcile_failed",
        }
    }
}
