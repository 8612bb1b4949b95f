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
use std::sync::atomic::{AtomicU8, Ordering};

/// Where an actor is in its lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActorStatus {
    /// Constructed; the dispatch worker has not been started.
    Idle,
    /// The dispatch worker is processing messages.
    Running,
    /// The dispatch loop has ended and stop hooks are running.
    Stopping,
    /// The worker has terminated.
    Stopped,
}

impl ActorStatus {
    const fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for ActorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(label)
    }
}

/// An atomically readable [`ActorStatus`], shared between the worker and every handle.
#[derive(Debug, Default)]
pub(crate) struct StatusCell(AtomicU8);

impl StatusCell {
    pub(crate) fn get(&self) -> ActorStatus {
        ActorStatus::from_code(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, status: ActorStatus) {
        self.0.fetch_max(status as u8, Ordering::AcqRel);
    }
}
