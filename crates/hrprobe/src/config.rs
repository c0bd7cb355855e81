//! Suite configuration.
//!
//! Declared once when a run starts and constant afterwards. Loaded from YAML,
//! optionally overridden from the environment, and validated before use.

use crate::result::{ProbeError, ProbeResult};
use crate::wait::WaitOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default base URL of the application under test
pub const DEFAULT_BASE_URL: &str = "https://opensource-demo.orangehrmlive.com/";

/// Default element/command timeout (20 seconds)
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 20_000;

/// Default request timeout (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Default response timeout (30 seconds)
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Environment variable overriding [`SuiteConfig::base_url`]
pub const ENV_BASE_URL: &str = "HRPROBE_BASE_URL";

/// Environment variable overriding [`SuiteConfig::default_command_timeout_ms`]
pub const ENV_COMMAND_TIMEOUT_MS: &str = "HRPROBE_COMMAND_TIMEOUT_MS";

/// Browser viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in CSS pixels
    pub width: u32,
    /// Height in CSS pixels
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Configuration for a suite run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Base URL of the application under test
    pub base_url: String,
    /// Timeout for element lookups and assertions
    pub default_command_timeout_ms: u64,
    /// Timeout for an intercepted request to be sent
    pub request_timeout_ms: u64,
    /// Timeout for an intercepted response to arrive
    pub response_timeout_ms: u64,
    /// Polling interval for every bounded wait
    pub poll_interval_ms: u64,
    /// Directory holding fixture payloads
    pub fixtures_dir: PathBuf,
    /// Employee number of the logged-in user (for personal-details endpoints)
    pub employee_number: u32,
    /// Run the browser headless
    pub headless: bool,
    /// Browser viewport
    pub viewport: Viewport,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            fixtures_dir: PathBuf::from("fixtures"),
            employee_number: 7,
            headless: true,
            viewport: Viewport::default(),
        }
    }
}

impl SuiteConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML document; absent keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> ProbeResult<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| ProbeError::Config {
            message: format!("invalid YAML: {e}"),
        })
    }

    /// Load a YAML configuration file
    pub fn load(path: impl AsRef<Path>) -> ProbeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ProbeError::Config {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        Self::from_yaml_str(&text)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> ProbeResult<String> {
        serde_yaml_ng::to_string(self).map_err(|e| ProbeError::Config {
            message: e.to_string(),
        })
    }

    /// Apply overrides from `HRPROBE_*` environment variables
    pub fn apply_env(self) -> ProbeResult<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (used by `apply_env`)
    pub fn apply_overrides<F>(mut self, lookup: F) -> ProbeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(raw) = lookup(ENV_COMMAND_TIMEOUT_MS) {
            self.default_command_timeout_ms =
                raw.trim().parse().map_err(|_| ProbeError::Config {
                    message: format!("{ENV_COMMAND_TIMEOUT_MS} must be an integer, got {raw:?}"),
                })?;
        }
        Ok(self)
    }

    /// Check internal consistency
    pub fn validate(&self) -> ProbeResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ProbeError::Config {
                message: format!("base_url must be http(s), got {:?}", self.base_url),
            });
        }
        let timeouts = [
            ("default_command_timeout_ms", self.default_command_timeout_ms),
            ("request_timeout_ms", self.request_timeout_ms),
            ("response_timeout_ms", self.response_timeout_ms),
            ("poll_interval_ms", self.poll_interval_ms),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, v)| *v == 0) {
            return Err(ProbeError::Config {
                message: format!("{name} must be non-zero"),
            });
        }
        if self.poll_interval_ms > self.default_command_timeout_ms {
            return Err(ProbeError::Config {
                message: "poll_interval_ms exceeds default_command_timeout_ms".to_string(),
            });
        }
        Ok(())
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the command timeout
    #[must_use]
    pub const fn with_command_timeout(mut self, ms: u64) -> Self {
        self.default_command_timeout_ms = ms;
        self
    }

    /// Set request and response timeouts
    #[must_use]
    pub const fn with_network_timeouts(mut self, request_ms: u64, response_ms: u64) -> Self {
        self.request_timeout_ms = request_ms;
        self.response_timeout_ms = response_ms;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set the fixtures directory
    #[must_use]
    pub fn with_fixtures_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fixtures_dir = dir.into();
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Join the base URL with an absolute or relative path
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Wait options for element lookups and assertions
    #[must_use]
    pub const fn command_wait(&self) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(self.default_command_timeout_ms)
            .with_poll_interval(self.poll_interval_ms)
    }

    /// Wait options for an aliased request to be sent
    #[must_use]
    pub const fn request_wait(&self) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(self.request_timeout_ms)
            .with_poll_interval(self.poll_interval_ms)
    }

    /// Wait options for an aliased response to arrive
    #[must_use]
    pub const fn response_wait(&self) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(self.response_timeout_ms)
            .with_poll_interval(self.poll_interval_ms)
    }
}
