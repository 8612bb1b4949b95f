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

use derive_new::new;
use tracing::level_filters::LevelFilter;

use crate::common::LogGate;

/// Parameters for constructing an actor.
///
/// The name is the actor's address in the [`Directory`](crate::common::Directory) and the
/// prefix of every report it logs. Without an explicit level the actor starts at the level
/// configured for its name in the runtime's [`SwitchboardConfig`](crate::common::SwitchboardConfig).
#[derive(new, Debug, Clone)]
pub struct ActorConfig {
    #[new(into)]
    name: String,
    #[new(default)]
    log_level: Option<LevelFilter>,
    /// A gate shared with a service that reports on the actor's behalf.
    #[new(default)]
    pub(crate) log_gate: Option<LogGate>,
}

impl ActorConfig {
    /// Overrides the starting log level.
    #[must_use]
    pub const fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = Some(level);
        self
    }

    #[must_use]
    pub(crate) fn with_log_gate(mut self, gate: LogGate) -> Self {
        self.log_gate = Some(gate);
        self
    }

    /// The actor name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The explicit starting level, if any.
    #[inline]
    #[must_use]
    pub const fn log_level(&self) -> Option<LevelFilter> {
        self.log_level
    }
}

impl From<&str> for ActorConfig {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ActorConfig {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}
