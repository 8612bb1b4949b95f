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

use static_assertions::assert_impl_all;

use crate::message::{Arguments, Operation, ReplyTo, SystemSignal};

/// An operation plus its arguments, enqueued for later execution by the recipient.
///
/// A message is immutable once enqueued. When it was sent by [`query`](crate::common::ActorHandle::query)
/// it also carries the private reply channel the caller is waiting on.
#[derive(Debug)]
pub struct Message {
    pub(crate) operation: Operation,
    pub(crate) args: Arguments,
    pub(crate) reply_to: Option<ReplyTo>,
    /// Name of the sending actor, used as a prefix in reports about this message.
    pub(crate) sender: String,
    pub(crate) enqueued_at: Instant,
}

impl Message {
    /// Creates a message that expects no reply.
    pub fn new(sender: impl Into<String>, operation: impl Into<Operation>, args: Arguments) -> Self {
        Self {
            operation: operation.into(),
            args,
            reply_to: None,
            sender: sender.into(),
            enqueued_at: Instant::now(),
        }
    }

    /// Attaches a reply channel.
    #[must_use]
    pub(crate) fn with_reply_to(mut self, reply_to: ReplyTo) -> Self {
        self.reply_to = Some(reply_to);
        self
    }

    /// The target operation.
    #[must_use]
    pub const fn operation(&self) -> &Operation {
        &self.operation
    }

    /// The arguments.
    #[must_use]
    pub const fn args(&self) -> &Arguments {
        &self.args
    }

    /// The sending actor's name.
    #[must_use]
    pub fn sender(&self) -> &str {
        &self.sender
    }
}

/// What actually travels through a mailbox: either an application message or a signal.
#[derive(Debug)]
pub(crate) enum Envelope {
    Message(Message),
    Signal(SystemSignal),
}

assert_impl_all!(Envelope: Send);
