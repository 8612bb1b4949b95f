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
use std::sync::Arc;

use crate::message::MessageContext;

/// A callable that runs directly on the recipient's worker, bypassing its command table.
///
/// It sees the same [`MessageContext`] a command handler does, so it can answer a `query`.
pub type DirectOperation =
    Arc<dyn Fn(&mut MessageContext) -> anyhow::Result<()> + Send + Sync + 'static>;

/// The target of a [`Message`](crate::message::Message).
///
/// A `Command` is a symbolic name looked up in the recipient's command table when the
/// message is dequeued; unknown names are reported and the message is discarded. A `Direct`
/// operation carries its own callable and is invoked as-is.
#[derive(Clone)]
pub enum Operation {
    /// A command name resolved against the recipient's command table.
    Command(String),
    /// A callable invoked with the message context.
    Direct(DirectOperation),
}

impl Operation {
    /// Wraps a closure as a direct operation.
    pub fn direct<F>(operation: F) -> Self
    where
        F: Fn(&mut MessageContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::Direct(Arc::new(operation))
    }

    /// The command name, if this is a symbolic operation.
    #[must_use]
    pub fn command_name(&self) -> Option<&str> {
        match self {
            Self::Command(name) => Some(name),
            Self::Direct(_) => None,
        }
    }
}

impl From<&str> for Operation {
    fn from(name: &str) -> Self {
        Self::Command(name.to_string())
    }
}

impl From<String> for Operation {
    fn from(name: String) -> Self {
        Self::Command(name)
    }
}

impl From<&String> for Operation {
    fn from(name: &String) -> Self {
        Self::Command(name.clone())
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(name) => f.debug_tuple("Command").field(name).finish(),
            Self::Direct(_) => f.write_str("Direct(<fn>)"),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(name) => f.write_str(name),
            Self::Direct(_) => f.write_str("<direct>"),
        }
    }
}
