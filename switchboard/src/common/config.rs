/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing::{error, info};

use crate::common::log_gate::parse_level;

/// Configuration for a switchboard application.
///
/// Loaded once at launch from TOML and shared read-only with every actor through the
/// [`ActorRuntime`](crate::common::ActorRuntime). Every section and every key is optional;
/// anything omitted takes its default.
///
/// ```toml
/// [app]
/// name = "bench"
///
/// [timeouts]
/// exit_grace_period_ms = 250
///
/// [logging]
/// default_level = "warn"
/// levels = { te = "debug", sched = "error" }
///
/// [values]
/// station = "bench-3"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchboardConfig {
    /// Application identity.
    pub app: AppConfig,
    /// Timeout configuration.
    pub timeouts: TimeoutConfig,
    /// Scheduler service configuration.
    pub scheduler: SchedulerConfig,
    /// Subscription bus configuration.
    pub subscription: SubscriptionConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Opaque application values, never interpreted by the runtime.
    pub values: toml::Table,
}

/// Application identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application name, used in the log file name.
    pub name: String,
    /// Application version, informational.
    pub version: String,
}

/// Timeout-related configuration values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// How long `exit` waits for workers to finish before cancelling them.
    pub exit_grace_period_ms: u64,
    /// Timeout used by built-in convenience queries.
    pub default_query_timeout_ms: u64,
}

/// Scheduler service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Directory name of the scheduler actor.
    pub name: String,
    /// Longest the wake monitor sleeps before re-checking, even with nothing scheduled.
    pub max_idle_wait_ms: u64,
}

/// Subscription bus configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionConfig {
    /// Directory name of the subscription bus actor.
    pub name: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for actors without an entry in `levels`.
    pub default_level: String,
    /// Per-actor level overrides, keyed by actor name.
    pub levels: BTreeMap<String, String>,
    /// Directory for the rolling log file.
    pub log_directory: PathBuf,
    /// Whether [`init_tracing`](crate::common::init_tracing) writes a log file.
    pub file_logging: bool,
    /// Log file name prefix; the file is named `<prefix>_<app name>.<date>`.
    pub file_prefix: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "switchboard".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            exit_grace_period_ms: 100,
            default_query_timeout_ms: 1_000,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            name: "sched".to_string(),
            max_idle_wait_ms: 3_000,
        }
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            name: "subscription".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            levels: BTreeMap::new(),
            log_directory: PathBuf::from("logs"),
            file_logging: true,
            file_prefix: "Log".to_string(),
        }
    }
}

impl SwitchboardConfig {
    /// Grace period granted to workers by `exit`.
    #[must_use]
    pub const fn exit_grace_period(&self) -> Duration {
        Duration::from_millis(self.timeouts.exit_grace_period_ms)
    }

    /// Timeout used by built-in convenience queries.
    #[must_use]
    pub const fn default_query_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.default_query_timeout_ms)
    }

    /// Upper bound on the scheduler's wake delay.
    #[must_use]
    pub const fn max_idle_wait(&self) -> Duration {
        Duration::from_millis(self.scheduler.max_idle_wait_ms)
    }

    /// The level for actors without an override. An unparsable value means `INFO`.
    #[must_use]
    pub fn default_level(&self) -> LevelFilter {
        parse_level(&self.logging.default_level).unwrap_or(LevelFilter::INFO)
    }

    /// The level an actor named `actor` starts with.
    ///
    /// Unparsable overrides fall back to the default level.
    #[must_use]
    pub fn level_for(&self, actor: &str) -> LevelFilter {
        self.logging
            .levels
            .get(actor)
            .and_then(|level| parse_level(level).ok())
            .unwrap_or_else(|| self.default_level())
    }

    /// The most verbose level any actor starts with.
    #[must_use]
    pub fn most_verbose_level(&self) -> LevelFilter {
        self.logging
            .levels
            .keys()
            .map(|actor| self.level_for(actor))
            .fold(self.default_level(), Ord::max)
    }

    /// Looks up a raw application value.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&toml::Value> {
        self.values.get(key)
    }

    /// Looks up an application value and deserializes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the value exists but is not a `T`.
    pub fn value_as<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        self.values
            .get(key)
            .map(|value| {
                value
                    .clone()
                    .try_into()
                    .with_context(|| format!("config value `{key}` has an unexpected shape"))
            })
            .transpose()
    }

    /// Loads `config.toml` from the XDG configuration directory.
    ///
    /// Searches `$XDG_CONFIG_HOME/switchboard/config.toml` and then the system
    /// configuration directories. If no file is found the defaults are used. If a file is
    /// found but cannot be read or parsed, an error is logged and the defaults are used.
    #[must_use]
    pub fn load() -> Self {
        let xdg_dirs = match xdg::BaseDirectories::with_prefix("switchboard") {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {e}");
                return Self::default();
            }
        };

        let Some(path) = xdg_dirs.find_config_file("config.toml") else {
            info!("No configuration file found, using defaults");
            return Self::default();
        };

        match Self::load_from_path(&path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                error!("{e:#}; using defaults");
                Self::default()
            }
        }
    }

    /// Loads configuration from an explicit TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid configuration.
    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse configuration file {}", path.display()))
    }
}
