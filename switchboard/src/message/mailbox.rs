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

use tokio::sync::mpsc::UnboundedSender;

use crate::message::{Envelope, Message, SystemSignal};

/// The sending half of an actor's mailbox, as stored in the directory.
///
/// Posting never blocks: the mailbox is an unbounded multi-producer, single-consumer
/// FIFO. A post fails only when the owning actor has already stopped.
#[derive(Clone, Debug)]
pub struct Mailbox {
    /// Name of the owning actor.
    pub(crate) owner: String,
    pub(crate) outbox: UnboundedSender<Envelope>,
}

impl Mailbox {
    pub(crate) const fn new(owner: String, outbox: UnboundedSender<Envelope>) -> Self {
        Self { owner, outbox }
    }

    /// Name of the actor that owns this mailbox.
    #[inline]
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Places a message at the tail of the mailbox.
    ///
    /// Returns the message back when the mailbox has been closed.
    pub fn post(&self, message: Message) -> Result<(), Message> {
        self.outbox
            .send(Envelope::Message(message))
            .map_err(|rejected| match rejected.0 {
                Envelope::Message(message) => message,
                Envelope::Signal(_) => unreachable!("a message was posted, not a signal"),
            })
    }

    /// Places a signal at the tail of the mailbox. Returns `false` if the mailbox is closed.
    pub(crate) fn signal(&self, signal: SystemSignal) -> bool {
        self.outbox.send(Envelope::Signal(signal)).is_ok()
    }

    /// Whether the owning actor's worker has stopped receiving.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.outbox.is_closed()
    }
}
