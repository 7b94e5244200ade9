//! Suite configuration.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. Built-in defaults targeting Tasks.org on `emulator-5554`.
//! 2. `~/.droidprobe/config.json`, if it exists.
//! 3. Environment variables: `APPIUM_URL`, `CI`, `APP_PATH`,
//!    `DROIDPROBE_DEVICE`, `DROIDPROBE_MAX_PASSES`, `DROIDPROBE_SETTLE_MS`.
//!
//! CI mode (`CI=true`, as set by GitHub Actions) lengthens the implicit wait
//! and the post-launch settle, since emulators on shared runners render
//! noticeably slower.
//!
//! # Example
//!
//! ```no_run
//! use droidprobe_core::config::SuiteConfig;
//!
//! let config = SuiteConfig::load().expect("invalid configuration");
//! println!("endpoint: {}", config.endpoint);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::Capabilities;
use crate::dismissal::DismissalPolicy;

const CONFIG_FILENAME: &str = "config.json";

/// Default Appium server address.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:4723";

/// Returns the droidprobe settings directory (`~/.droidprobe`).
pub fn droidprobe_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".droidprobe"))
}

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Fixed pauses and waits used around session setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Implicit wait applied to every test session.
    #[serde(with = "duration_ms")]
    pub implicit_wait: Duration,
    /// Implicit wait in CI mode.
    #[serde(with = "duration_ms")]
    pub ci_implicit_wait: Duration,
    /// Pause between session creation and the app restart.
    #[serde(with = "duration_ms")]
    pub pre_reset_delay: Duration,
    /// Pause between terminating and reactivating the app.
    #[serde(with = "duration_ms")]
    pub terminate_settle: Duration,
    /// Pause after reactivating the app.
    #[serde(with = "duration_ms")]
    pub activate_settle: Duration,
    /// Pause after reactivating the app in CI mode.
    #[serde(with = "duration_ms")]
    pub ci_activate_settle: Duration,
    /// Initial render wait for the warm-up session.
    #[serde(with = "duration_ms")]
    pub warm_up_render: Duration,
    /// Pause after the warm-up dismissal pass.
    #[serde(with = "duration_ms")]
    pub warm_up_post_dismiss: Duration,
    /// Pause after the warm-up session is closed.
    #[serde(with = "duration_ms")]
    pub warm_up_cooldown: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            implicit_wait: Duration::from_secs(10),
            ci_implicit_wait: Duration::from_secs(20),
            pre_reset_delay: Duration::from_secs(1),
            terminate_settle: Duration::from_secs(2),
            activate_settle: Duration::from_secs(2),
            ci_activate_settle: Duration::from_secs(6),
            warm_up_render: Duration::from_secs(10),
            warm_up_post_dismiss: Duration::from_secs(3),
            warm_up_cooldown: Duration::from_secs(2),
        }
    }
}

impl Timing {
    /// All-zero timing, for fakes and paused-clock tests.
    pub fn immediate() -> Self {
        Self {
            implicit_wait: Duration::ZERO,
            ci_implicit_wait: Duration::ZERO,
            pre_reset_delay: Duration::ZERO,
            terminate_settle: Duration::ZERO,
            activate_settle: Duration::ZERO,
            ci_activate_settle: Duration::ZERO,
            warm_up_render: Duration::ZERO,
            warm_up_post_dismiss: Duration::ZERO,
            warm_up_cooldown: Duration::ZERO,
        }
    }
}

/// Complete configuration for one suite run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Automation server base URL.
    pub endpoint: String,
    /// Running on a CI runner.
    pub ci: bool,
    /// Capabilities sent with every new session.
    pub capabilities: Capabilities,
    pub timing: Timing,
    pub dismissal: DismissalPolicy,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            ci: false,
            capabilities: Capabilities::default(),
            timing: Timing::default(),
            dismissal: DismissalPolicy::default(),
        }
    }
}

impl SuiteConfig {
    /// Load defaults, the settings file and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match droidprobe_dir().map(|dir| dir.join(CONFIG_FILENAME)) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read a JSON settings file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("APPIUM_URL") {
            self.endpoint = url.trim_end_matches('/').to_string();
        }
        if let Some(ci) = lookup("CI") {
            self.ci = ci.trim().eq_ignore_ascii_case("true");
        }
        if let Some(path) = non_empty("APP_PATH") {
            self.capabilities.app = Some(PathBuf::from(path));
        }
        if let Some(device) = non_empty("DROIDPROBE_DEVICE") {
            self.capabilities.device_name = device;
        }
        if let Some(passes) = non_empty("DROIDPROBE_MAX_PASSES") {
            self.dismissal.max_passes =
                passes
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: "DROIDPROBE_MAX_PASSES",
                        value: passes.clone(),
                    })?;
        }
        if let Some(settle) = non_empty("DROIDPROBE_SETTLE_MS") {
            let ms: u64 = settle
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "DROIDPROBE_SETTLE_MS",
                    value: settle.clone(),
                })?;
            self.dismissal.settle_delay = Duration::from_millis(ms);
        }
        Ok(())
    }

    /// Implicit wait for test sessions in the current mode.
    pub fn implicit_wait(&self) -> Duration {
        if self.ci {
            self.timing.ci_implicit_wait
        } else {
            self.timing.implicit_wait
        }
    }

    /// Settle delay after app activation in the current mode.
    pub fn activate_settle(&self) -> Duration {
        if self.ci {
            self.timing.ci_activate_settle
        } else {
            self.timing.activate_settle
        }
    }

    /// Target app identifier.
    pub fn app_id(&self) -> &str {
        &self.capabilities.app_package
    }
}

/// Serializes a [`Duration`] as whole milliseconds.
pub(crate) mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
