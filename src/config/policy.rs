//! `[retry]`, `[watch]` and `[styles]` sections.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// `[retry]` section - budget for `--retry`.
///
/// # Example
/// ```toml
/// [retry]
/// max_tries = 10
/// max_time = 120   # seconds
/// max_wait = 5     # seconds
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one.
    #[serde(default = "defaults::retry::max_tries")]
    #[educe(Default = defaults::retry::max_tries())]
    pub max_tries: u32,

    /// Wall-clock budget in seconds.
    #[serde(default = "defaults::retry::max_time")]
    #[educe(Default = defaults::retry::max_time())]
    pub max_time: u64,

    /// Ceiling for a single wait, in seconds.
    #[serde(default = "defaults::retry::max_wait")]
    #[educe(Default = defaults::retry::max_wait())]
    pub max_wait: u64,
}

impl RetryConfig {
    pub const fn max_time(&self) -> Duration {
        Duration::from_secs(self.max_time)
    }

    pub const fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait)
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Minimum interval between the end of one rebuild and the next trigger.
    #[serde(default = "defaults::watch::debounce_ms")]
    #[educe(Default = defaults::watch::debounce_ms())]
    pub debounce_ms: u64,
}

impl WatchConfig {
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// `[styles]` section - style registry and bundled resources.
///
/// # Example
/// ```toml
/// [styles]
/// registry = "~/.pandocmk/styles.yaml"
/// resources = "~/.pandocmk"
/// strict = false
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct StylesConfig {
    /// Replaces the registry bundled into the binary.
    pub registry: Option<PathBuf>,

    /// Folder holding `templates/` and `filters/`.
    ///
    /// Defaults to `resources/` beside the executable, then
    /// `../share/pandocmk/`, then the source tree the binary was built from.
    /// Installs that copy only the binary must set this, or bundled styles
    /// fall back to passing bare template names to pandoc.
    #[serde(default = "defaults::styles::resources")]
    #[educe(Default = defaults::styles::resources())]
    pub resources: PathBuf,

    /// Abort when the declared style is not in the registry.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub strict: bool,
}
