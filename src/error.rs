use thiserror::Error;

// Basic error handling with thiserror
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseFailed(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Server state violates session invariant: {0}")]
    InvariantViolation(String),

    #[error("Connection abandoned after {0} failed attempts")]
    RetriesExhausted(u32),

    #[error("Connection explicitly closed")]
    ConnectionClosed,

    #[error("Not connected")]
    NotConnected,

    #[error("Task panicked or cancelled")]
    TaskJoinError(#[from] tokio::task::JoinError),
}

impl SyncError {
    /// True when the error means the push connection is gone for good and no
    /// further automatic recovery will happen.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SyncError::RetriesExhausted(_) | SyncError::ConnectionClosed
        )
    }
}
