use std::{env, time::Duration};

/// Holds all tunables, read-once from ENV with fallbacks.
///
/// Unlike a global, a `Settings` value is handed to the client that needs it;
/// two clients with different settings can coexist in one process.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the REST server of record, e.g. `http://localhost:8000`.
    pub api_base_url: String,
    /// Push endpoint without the identity query, e.g. `ws://localhost:8000/ws`.
    pub ws_url: String,
    /// Fixed delay between a close and the scheduled reconnect.
    pub retry_delay: Duration,
    /// Reconnection is refused once the retry counter reaches this cap.
    pub retry_cap: u32,
    /// Timeout applied to each REST lookup request.
    pub request_timeout: Duration,
    /// Capacity of the broadcast event channel.
    pub event_buffer_capacity: usize,
}

impl Settings {
    pub fn from_env() -> Self {
        // optionally load .env
        let _ = dotenvy::dotenv();

        fn parse_string(var: &str, default: &str) -> String {
            env::var(var).unwrap_or_else(|_| default.to_string())
        }

        fn parse_u32(var: &str, default: u32) -> u32 {
            env::var(var)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        fn parse_usize(var: &str, default: usize) -> usize {
            env::var(var)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        fn parse_secs(var: &str, default_secs: u64) -> Duration {
            env::var(var)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or_else(|| Duration::from_secs(default_secs))
        }

        fn parse_millis(var: &str, default_ms: u64) -> Duration {
            env::var(var)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or_else(|| Duration::from_millis(default_ms))
        }

        Settings {
            api_base_url: parse_string("MATCHSYNC_API_BASE_URL", "http://localhost:8000"),
            ws_url: parse_string("MATCHSYNC_WS_URL", "ws://localhost:8000/ws"),
            retry_delay: parse_millis("MATCHSYNC_RETRY_DELAY_MS", 3_000),
            retry_cap: parse_u32("MATCHSYNC_RETRY_CAP", 5),
            request_timeout: parse_secs("MATCHSYNC_REQUEST_TIMEOUT_SECS", 10),
            event_buffer_capacity: parse_usize("MATCHSYNC_EVENT_BUFFER_CAPACITY", 100),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_base_url: "http://localhost:8000".to_string(),
            ws_url: "ws://localhost:8000/ws".to_string(),
            retry_delay: Duration::from_secs(3),
            retry_cap: 5,
            request_timeout: Duration::from_secs(10),
            event_buffer_capacity: 100,
        }
    }
}
