use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Opaque identity of the client's user for the duration of a session.
pub type UserId = u64;

/// Opaque handle identifying one matching session a user is part of.
pub type MatchId = String;

/// Lifecycle stage of a matching session, as defined by the server.
///
/// The server may grow new stages at any time; values this client does not
/// recognize are carried verbatim in `Unknown` rather than dropped, so that
/// downstream policy (the navigator) can decide what to do with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchStatus {
    Idle,
    InLobby,
    Navigating,
    Completed,
    Unknown(String),
}

impl MatchStatus {
    pub fn as_str(&self) -> &str {
        match self {
            MatchStatus::Idle => "idle",
            MatchStatus::InLobby => "in_lobby",
            MatchStatus::Navigating => "navigating",
            MatchStatus::Completed => "completed",
            MatchStatus::Unknown(other) => other,
        }
    }

    /// Whether this status only makes sense with a match reference attached.
    /// Unknown statuses make no claim either way.
    pub fn requires_match(&self) -> bool {
        matches!(
            self,
            MatchStatus::InLobby | MatchStatus::Navigating | MatchStatus::Completed
        )
    }
}

impl From<String> for MatchStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "idle" => MatchStatus::Idle,
            "in_lobby" => MatchStatus::InLobby,
            "navigating" => MatchStatus::Navigating,
            "completed" => MatchStatus::Completed,
            _ => MatchStatus::Unknown(value),
        }
    }
}

impl From<MatchStatus> for String {
    fn from(value: MatchStatus) -> Self {
        value.as_str().to_string()
    }
}

impl<'de> Deserialize<'de> for MatchStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(MatchStatus::from(String::deserialize(deserializer)?))
    }
}

impl Serialize for MatchStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response body of `GET /matches/{user_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchLookup {
    pub match_id: Option<MatchId>,
}

/// Response body of `GET /matches/{user_id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusLookup {
    pub status: MatchStatus,
}

/// Inbound push notification, dispatched by its `type` tag.
///
/// The push channel never carries session state itself; a `StatusUpdate` is a
/// hint to re-fetch from the REST endpoints, nothing more. Kinds this client
/// does not recognize parse into `Unknown` and are ignored by the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushMessage {
    StatusUpdate,
    Unknown(String),
}

#[derive(Deserialize)]
struct RawPush {
    #[serde(rename = "type")]
    kind: String,
}

impl PushMessage {
    /// Parse one text frame. Fails only on malformed JSON or a missing tag.
    pub fn parse(text: &str) -> Result<Self, SyncError> {
        let raw: RawPush = serde_json::from_str(text)?;
        Ok(match raw.kind.as_str() {
            "status_update" => PushMessage::StatusUpdate,
            _ => PushMessage::Unknown(raw.kind),
        })
    }
}

/// Outbound messages the client may send over the push connection.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinPool {
        skill_level: u32,
        preferences: serde_json::Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        location: Option<serde_json::Value>,
    },
    ConfirmMatch {
        match_id: MatchId,
    },
}

impl ClientMessage {
    /// Join the matching pool with default skill and no preferences.
    pub fn join_pool() -> Self {
        ClientMessage::JoinPool {
            skill_level: 1000,
            preferences: serde_json::json!({}),
            location: None,
        }
    }

    pub fn confirm_match(match_id: impl Into<MatchId>) -> Self {
        ClientMessage::ConfirmMatch {
            match_id: match_id.into(),
        }
    }
}
