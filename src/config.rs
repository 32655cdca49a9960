use std::time::Duration;

use crate::pipeline::analysis::PollPolicy;

/// Application-level constants
pub const APP_NAME: &str = "Docguard";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Environment variables read by the command line (through clap).
pub const ENV_API_URL: &str = "DOCGUARD_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "DOCGUARD_TIMEOUT_SECS";
pub const ENV_POLL_INTERVAL_MS: &str = "DOCGUARD_POLL_INTERVAL_MS";
pub const ENV_POLL_MAX_WAIT_MS: &str = "DOCGUARD_POLL_MAX_WAIT_MS";
pub const ENV_TOKEN: &str = "DOCGUARD_TOKEN";
pub const ENV_PUBLIC_KEY: &str = "DOCGUARD_PUBLIC_KEY";

/// Tracing filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "info,docguard_lib=debug"
    } else {
        "info"
    }
}

/// Client configuration: where the backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub timeout_secs: u64,
    pub poll: PollPolicy,
    pub token: Option<String>,
    /// Overrides the key served by `/auth/public-key`.
    pub public_key: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            poll: PollPolicy::default(),
            token: None,
            public_key: None,
        }
    }
}

impl ClientConfig {
    /// Set the backend base URL. Blank values keep the current one.
    pub fn with_api_url(mut self, url: &str) -> Self {
        let url = url.trim();
        if !url.is_empty() {
            self.api_url = url.trim_end_matches('/').to_string();
        }
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll.initial_interval = interval;
        self
    }

    pub fn with_poll_max_wait(mut self, max_wait: Duration) -> Self {
        self.poll.max_wait = max_wait;
        self
    }
}
