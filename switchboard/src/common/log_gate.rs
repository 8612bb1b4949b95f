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

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, trace, warn, Level};

/// Per-actor severity filter in front of the tracing subscriber.
///
/// Every report an actor makes about itself (dropped sends, unknown commands, failed or
/// panicking handlers, lifecycle transitions) passes through its gate and is discarded when
/// more verbose than the actor's configured level. The level can be changed at runtime from
/// any thread. Logging through a gate never fails.
#[derive(Clone)]
pub struct LogGate {
    name: Arc<str>,
    level: Arc<AtomicU8>,
}

impl LogGate {
    /// Creates a gate for `name` at `level`.
    #[must_use]
    pub fn new(name: &str, level: LevelFilter) -> Self {
        Self {
            name: Arc::from(name),
            level: Arc::new(AtomicU8::new(encode(level))),
        }
    }

    /// The actor this gate reports for.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current maximum verbosity.
    #[must_use]
    pub fn level(&self) -> LevelFilter {
        decode(self.level.load(Ordering::Relaxed))
    }

    /// Replaces the maximum verbosity.
    pub fn set_level(&self, level: LevelFilter) {
        self.level.store(encode(level), Ordering::Relaxed);
    }

    /// Whether an event at `level` would pass.
    #[must_use]
    pub fn enabled(&self, level: Level) -> bool {
        encode(LevelFilter::from_level(level)) <= self.level.load(Ordering::Relaxed)
    }

    /// Emits `message` at `level`, tagged with the actor name, if the gate allows it.
    pub fn log(&self, level: Level, message: impl fmt::Display) {
        if !self.enabled(level) {
            return;
        }
        let actor = &*self.name;
        if level == Level::ERROR {
            error!(actor = %actor, "{message}");
        } else if level == Level::WARN {
            warn!(actor = %actor, "{message}");
        } else if level == Level::INFO {
            info!(actor = %actor, "{message}");
        } else if level == Level::DEBUG {
            debug!(actor = %actor, "{message}");
        } else {
            trace!(actor = %actor, "{message}");
        }
    }

    /// Shorthand for `log(Level::ERROR, ..)`.
    #[inline]
    pub fn error(&self, message: impl fmt::Display) {
        self.log(Level::ERROR, message);
    }

    /// Shorthand for `log(Level::WARN, ..)`.
    #[inline]
    pub fn warn(&self, message: impl fmt::Display) {
        self.log(Level::WARN, message);
    }

    /// Shorthand for `log(Level::INFO, ..)`.
    #[inline]
    pub fn info(&self, message: impl fmt::Display) {
        self.log(Level::INFO, message);
    }

    /// Shorthand for `log(Level::DEBUG, ..)`.
    #[inline]
    pub fn debug(&self, message: impl fmt::Display) {
        self.log(Level::DEBUG, message);
    }

    /// Shorthand for `log(Level::TRACE, ..)`.
    #[inline]
    pub fn trace(&self, message: impl fmt::Display) {
        self.log(Level::TRACE, message);
    }
}

impl fmt::Debug for LogGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogGate")
            .field("name", &self.name)
            .field("level", &self.level())
            .finish()
    }
}

/// Parses a level name as written in configuration or sent with `set_log_level`.
///
/// Accepts everything [`LevelFilter`] accepts (case-insensitive names and `0`-`5`) plus the
/// aliases `warning`, `critical` and `fatal`.
///
/// # Errors
///
/// Returns the unparsable input.
pub fn parse_level(name: &str) -> Result<LevelFilter, String> {
    let trimmed = name.trim();
    if trimmed.eq_ignore_ascii_case("warning") {
        return Ok(LevelFilter::WARN);
    }
    if trimmed.eq_ignore_ascii_case("critical") || trimmed.eq_ignore_ascii_case("fatal") {
        return Ok(LevelFilter::ERROR);
    }
    LevelFilter::from_str(trimmed).map_err(|_| format!("`{name}` is not a log level"))
}

fn encode(level: LevelFilter) -> u8 {
    match level.into_level() {
        None => 0,
        Some(Level::ERROR) => 1,
        Some(Level::WARN) => 2,
        Some(Level::INFO) => 3,
        Some(Level::DEBUG) => 4,
        Some(_) => 5,
    }
}

fn decode(code: u8) -> LevelFilter {
    match code {
        0 => LevelFilter::OFF,
        1 => LevelFilter::ERROR,
        2 => LevelFilter::WARN,
        3 => LevelFilter::INFO,
        4 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_filters_by_level_and_can_be_changed() {
        let gate = LogGate::new("te", LevelFilter::WARN);
        assert!(gate.enabled(Level::ERROR));
        assert!(gate.enabled(Level::WARN));
        assert!(!gate.enabled(Level::INFO));

        let shared = gate.clone();
        shared.set_level(LevelFilter::TRACE);
        assert!(gate.enabled(Level::TRACE));
        assert_eq!(gate.level(), LevelFilter::TRACE);

        gate.set_level(LevelFilter::OFF);
        assert!(!shared.enabled(Level::ERROR));
    }

    #[test]
    fn level_names_and_aliases_parse() {
        assert_eq!(parse_level("debug"), Ok(LevelFilter::DEBUG));
        assert_eq!(parse_level("INFO"), Ok(LevelFilter::INFO));
        assert_eq!(parse_level("Warning"), Ok(LevelFilter::WARN));
        assert_eq!(parse_level("critical"), Ok(LevelFilter::ERROR));
        assert_eq!(parse_level(" off "), Ok(LevelFilter::OFF));
        assert!(parse_level("loud").is_err());
    }
}
