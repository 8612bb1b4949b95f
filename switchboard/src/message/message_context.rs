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

use std::time::Instant;

use serde::de::DeserializeOwned;
use serde_json::Value;
use static_assertions::assert_impl_all;

use crate::message::{ArgumentError, Arguments, ReplyTo};

/// Everything a command handler gets to know about the message it is processing.
#[derive(Debug)]
pub struct MessageContext {
    pub(crate) operation: String,
    pub(crate) args: Arguments,
    pub(crate) reply_to: Option<ReplyTo>,
    pub(crate) sender: String,
    pub(crate) enqueued_at: Instant,
}

impl MessageContext {
    /// The operation name as it was addressed (`<direct>` for direct callables).
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Name of the actor that sent the message.
    #[must_use]
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// When the message was enqueued.
    #[must_use]
    pub const fn enqueued_at(&self) -> Instant {
        self.enqueued_at
    }

    /// All arguments.
    #[must_use]
    pub const fn args(&self) -> &Arguments {
        &self.args
    }

    /// Shorthand for [`Arguments::get`].
    ///
    /// # Errors
    ///
    /// See [`Arguments::get`].
    pub fn arg<T: DeserializeOwned>(&self, index: usize) -> Result<T, ArgumentError> {
        self.args.get(index)
    }

    /// Shorthand for [`Arguments::named`].
    ///
    /// # Errors
    ///
    /// See [`Arguments::named`].
    pub fn named<T: DeserializeOwned>(&self, key: &str) -> Result<T, ArgumentError> {
        self.args.named(key)
    }

    /// Whether the sender is waiting synchronously for a reply.
    #[must_use]
    pub const fn expects_reply(&self) -> bool {
        self.reply_to.is_some()
    }

    /// Answers a `query`. Returns `false` if there was no reply channel or the caller left.
    pub fn reply(&mut self, value: impl Into<Value>) -> bool {
        self.reply_to
            .take()
            .is_some_and(|reply_to| reply_to.send(value))
    }

    /// Takes ownership of the reply channel, e.g. to answer from a spawned task later.
    pub fn take_reply(&mut self) -> Option<ReplyTo> {
        self.reply_to.take()
    }
}

assert_impl_all!(MessageContext: Send);
