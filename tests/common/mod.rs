// Shared test fakes for the lookup collaborator. Each test binary uses its
// own subset.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use matchsync::{MatchDirectory, MatchId, MatchStatus, SyncError};

/// Directory that answers every lookup with the same fixed result.
pub struct FixedDirectory {
    match_id: Option<MatchId>,
    status: MatchStatus,
}

impl FixedDirectory {
    pub fn new(match_id: Option<&str>, status: MatchStatus) -> Self {
        Self {
            match_id: match_id.map(str::to_string),
            status,
        }
    }

    pub fn idle() -> Self {
        Self::new(None, MatchStatus::Idle)
    }
}

impl MatchDirectory for FixedDirectory {
    async fn fetch_match(&self, _user_id: u64) -> Result<Option<MatchId>, SyncError> {
        Ok(self.match_id.clone())
    }

    async fn fetch_status(&self, _user_id: u64) -> Result<MatchStatus, SyncError> {
        Ok(self.status.clone())
    }
}

/// Directory that pops scripted answers in order; `Err(())` entries become
/// lookup failures. Match entries may carry a delay so that passes can be
/// made to overlap deterministically.
pub struct ScriptedDirectory {
    matches: Mutex<VecDeque<(Option<Duration>, Result<Option<MatchId>, ()>)>>,
    statuses: Mutex<VecDeque<Result<MatchStatus, ()>>>,
}

impl ScriptedDirectory {
    pub fn new() -> Self {
        Self {
            matches: Mutex::new(VecDeque::new()),
            statuses: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push_match(&self, result: Result<Option<&str>, ()>) {
        self.matches
            .lock()
            .unwrap()
            .push_back((None, result.map(|m| m.map(str::to_string))));
    }

    pub fn push_match_delayed(&self, delay: Duration, result: Result<Option<&str>, ()>) {
        self.matches
            .lock()
            .unwrap()
            .push_back((Some(delay), result.map(|m| m.map(str::to_string))));
    }

    pub fn push_status(&self, result: Result<MatchStatus, ()>) {
        self.statuses.lock().unwrap().push_back(result);
    }
}

impl MatchDirectory for ScriptedDirectory {
    async fn fetch_match(&self, _user_id: u64) -> Result<Option<MatchId>, SyncError> {
        let (delay, result) = self
            .matches
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted match lookup");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
            .map_err(|_| SyncError::InvalidResponse("scripted match lookup failure".to_string()))
    }

    async fn fetch_status(&self, _user_id: u64) -> Result<MatchStatus, SyncError> {
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted status lookup")
            .map_err(|_| SyncError::InvalidResponse("scripted status lookup failure".to_string()))
    }
}

/// Directory whose first match lookup stalls, so an overlapping pass can
/// finish first. Later lookups answer immediately.
pub struct RaceDirectory {
    match_calls: AtomicUsize,
    pub slow_delay: Duration,
}

impl RaceDirectory {
    pub fn new(slow_delay: Duration) -> Self {
        Self {
            match_calls: AtomicUsize::new(0),
            slow_delay,
        }
    }
}

impl MatchDirectory for RaceDirectory {
    async fn fetch_match(&self, _user_id: u64) -> Result<Option<MatchId>, SyncError> {
        let call = self.match_calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            tokio::time::sleep(self.slow_delay).await;
            Ok(Some("stale".to_string()))
        } else {
            Ok(Some("fresh".to_string()))
        }
    }

    async fn fetch_status(&self, _user_id: u64) -> Result<MatchStatus, SyncError> {
        Ok(MatchStatus::Navigating)
    }
}
