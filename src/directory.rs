use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::models::{MatchId, MatchLookup, MatchStatus, StatusLookup, UserId};

/// The server of record for match membership and lifecycle status.
///
/// This is the reconciler's only collaborator; the trait seam keeps the
/// lookup transport swappable and lets tests script responses.
pub trait MatchDirectory: Send + Sync {
    /// Current match reference for the user, if any.
    fn fetch_match(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<MatchId>, SyncError>> + Send;

    /// Current lifecycle status for the user.
    fn fetch_status(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<MatchStatus, SyncError>> + Send;
}

/// REST implementation over the matching server's lookup endpoints.
pub struct RestDirectory {
    client: Client,
    base_url: String,
}

impl RestDirectory {
    pub fn new(base_url: &str, request_timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(request_timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Use an existing reqwest client for connection reuse.
    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl MatchDirectory for RestDirectory {
    async fn fetch_match(&self, user_id: UserId) -> Result<Option<MatchId>, SyncError> {
        let url = format!("{}/matches/{}", self.base_url, user_id);
        debug!(%url, "looking up current match");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, "match lookup returned non-success");
            return Err(SyncError::InvalidResponse(format!(
                "match lookup failed: {status}"
            )));
        }

        let lookup = response.json::<MatchLookup>().await?;
        debug!(match_id = ?lookup.match_id, "match lookup result");
        Ok(lookup.match_id)
    }

    async fn fetch_status(&self, user_id: UserId) -> Result<MatchStatus, SyncError> {
        let url = format!("{}/matches/{}/status", self.base_url, user_id);
        debug!(%url, "looking up current status");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, "status lookup returned non-success");
            return Err(SyncError::InvalidResponse(format!(
                "status lookup failed: {status}"
            )));
        }

        let lookup = response.json::<StatusLookup>().await?;
        debug!(status = %lookup.status, "status lookup result");
        Ok(lookup.status)
    }
}
