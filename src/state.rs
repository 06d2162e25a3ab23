/// Observable state of the connection manager, published over a `watch`
/// channel. `Closed` is terminal via explicit teardown; `Abandoned` is
/// terminal via retry exhaustion and is the state a UI should render as a
/// persistent offline indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    WaitingToReconnect { attempt: u32 },
    Closed,
    Abandoned,
}

impl ConnectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Abandoned)
    }
}

/// What the manager should do after an unexpected close, or when a scheduled
/// retry timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Schedule a reconnect after the fixed delay.
    Retry { attempt: u32 },
    /// The cap is reached; give up for this session.
    Abandon,
}

/// Bounded retry counter for the push connection.
///
/// The counter resets to zero on every successful open and increments on
/// every unexpected close (a failed connect attempt counts as one).
/// Reconnection is refused once the counter reaches the cap, both at close
/// time and when an already-scheduled retry fires.
#[derive(Debug)]
pub struct RetryPolicy {
    attempt: u32,
    cap: u32,
}

impl RetryPolicy {
    pub fn new(cap: u32) -> Self {
        Self { attempt: 0, cap }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    /// Record a successful open.
    pub fn on_open(&mut self) {
        self.attempt = 0;
    }

    /// Record an unexpected close. The counter never exceeds the cap.
    pub fn on_close(&mut self) -> RetryDecision {
        if self.attempt >= self.cap {
            RetryDecision::Abandon
        } else {
            self.attempt += 1;
            RetryDecision::Retry {
                attempt: self.attempt,
            }
        }
    }

    /// Decide whether a scheduled retry that just fired may reconnect.
    pub fn on_retry_fired(&self) -> RetryDecision {
        if self.attempt >= self.cap {
            RetryDecision::Abandon
        } else {
            RetryDecision::Retry {
                attempt: self.attempt,
            }
        }
    }
}
