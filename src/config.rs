//! Runtime configuration.
//!
//! Settings come from an optional config file (TOML, JSON or YAML, chosen by
//! extension) overlaid with `HOMEWATCH_*` environment variables. Nested keys
//! use a double underscore: `HOMEWATCH_THRESHOLDS__CPU_PERCENT=90`. Every
//! field has a default, so running without a file works.
//!
//! Durations are strings such as `"10s"`, `"500ms"` or `"24h"`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Deserializer};

use crate::data::duration::parse_duration;
use crate::data::{ChartExtent, Thresholds};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// How often services and host metrics are sampled.
    #[serde(deserialize_with = "de_duration")]
    pub poll_interval: Duration,
    /// Cadence for low-frequency external content (news and other feeds),
    /// advertised to consumers of the exported state.
    #[serde(deserialize_with = "de_duration")]
    pub feed_interval: Duration,
    /// Upper bound on a single sampling request.
    #[serde(deserialize_with = "de_duration")]
    pub sample_timeout: Duration,
    /// Trailing window for the uptime ledger.
    #[serde(deserialize_with = "de_duration")]
    pub retention: Duration,
    /// Samples kept per host metric.
    pub history_capacity: usize,
    #[serde(deserialize_with = "de_duration")]
    pub notification_ttl: Duration,
    /// Minimum spacing between repeated alerts for a sustained breach.
    #[serde(deserialize_with = "de_duration")]
    pub alert_cooldown: Duration,
    pub thresholds: Thresholds,
    pub chart: ChartExtent,
    /// Preference file the uptime ledger is persisted to.
    pub state_file: Option<PathBuf>,
    /// Fallback tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub docker: DockerSettings,
    pub host: HostSettings,
    pub websites: Vec<WebsiteTarget>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            feed_interval: Duration::from_secs(30 * 60),
            sample_timeout: Duration::from_secs(5),
            retention: Duration::from_secs(24 * 60 * 60),
            history_capacity: 20,
            notification_ttl: Duration::from_millis(5000),
            alert_cooldown: Duration::from_secs(5 * 60),
            thresholds: Thresholds::default(),
            chart: ChartExtent::default(),
            state_file: None,
            log_level: "info".to_string(),
            docker: DockerSettings::default(),
            host: HostSettings::default(),
            websites: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DockerSettings {
    pub enabled: bool,
    pub binary: String,
}

impl Default for DockerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            binary: "docker".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    pub proc_root: PathBuf,
    /// Mount point whose disk usage is reported.
    pub mount: String,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            mount: "/".to_string(),
        }
    }
}

/// A website to probe alongside containers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WebsiteTarget {
    pub name: String,
    pub url: String,
}

impl Settings {
    /// Load settings from `path` (if given) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let settings: Settings = builder
            .add_source(
                Environment::with_prefix("HOMEWATCH")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("loading configuration")?
            .try_deserialize()
            .context("invalid configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            bail!("poll_interval must be greater than zero");
        }
        if self.sample_timeout.is_zero() {
            bail!("sample_timeout must be greater than zero");
        }
        if self.history_capacity == 0 {
            bail!("history_capacity must be at least 1");
        }
        if !(0.0..=100.0).contains(&self.thresholds.cpu_percent)
            || !(0.0..=100.0).contains(&self.thresholds.memory_percent)
        {
            bail!("thresholds must be percentages between 0 and 100");
        }
        Ok(())
    }
}

fn de_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_duration(&raw).map_err(serde::de::Error::custom)
}
