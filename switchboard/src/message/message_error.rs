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

use std::time::Duration;

use thiserror::Error;

/// Why a message could not be delivered or executed.
///
/// These errors never reach the sender: the dispatch loop and the enqueue helpers report
/// them through the owning actor's log and discard the message.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The destination name is not registered in the directory.
    #[error("destination `{0}` does not exist")]
    DestinationNotFound(String),
    /// The destination exists but its worker has stopped.
    #[error("mailbox of `{0}` is closed")]
    MailboxClosed(String),
    /// The symbolic command is not in the recipient's command table.
    #[error("`{command}` is not a command of `{actor}`")]
    UnknownCommand {
        /// Recipient.
        actor: String,
        /// The unresolved name.
        command: String,
    },
    /// A built-in command received arguments it could not use.
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    /// The operation ran and returned an error.
    #[error("operation failed: {0:#}")]
    Failed(anyhow::Error),
    /// The operation panicked; the panic was contained.
    #[error("operation panicked: {0}")]
    Panicked(String),
}

/// A command argument was missing or had the wrong shape.
#[derive(Debug, Error)]
pub enum ArgumentError {
    /// Fewer positional arguments than required.
    #[error("missing positional argument {0}")]
    MissingPositional(usize),
    /// A required named argument was not supplied.
    #[error("missing named argument `{0}`")]
    MissingNamed(String),
    /// The value could not be deserialized into the requested type.
    #[error("argument `{argument}` has the wrong type: {source}")]
    Mismatch {
        /// Position or name of the argument.
        argument: String,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
    /// The value was well-typed but not acceptable.
    #[error("argument `{argument}` is invalid: {reason}")]
    Invalid {
        /// Position or name of the argument.
        argument: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Why a `query` produced no answer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The destination name is not registered in the directory.
    #[error("destination `{0}` does not exist")]
    DestinationNotFound(String),
    /// The destination has stopped and cannot receive the request.
    #[error("mailbox of `{0}` is closed")]
    MailboxClosed(String),
    /// No reply arrived before the deadline.
    #[error("no reply within {0:?}")]
    Timeout(Duration),
}

impl QueryError {
    /// Status code reported for every failed query. Successful queries have status `0`.
    pub const FAILED: i32 = -1;

    /// The numeric status of this failure.
    #[must_use]
    pub const fn status(&self) -> i32 {
        Self::FAILED
    }
}
