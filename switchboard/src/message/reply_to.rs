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

use serde_json::Value;
use tokio::sync::oneshot;
use tracing::trace;

/// The private, one-shot reply channel attached to a message sent with `query`.
///
/// Replying consumes the channel. If the caller has already timed out and gone away,
/// the reply is silently discarded.
#[derive(Debug)]
pub struct ReplyTo {
    sender: oneshot::Sender<Value>,
}

impl ReplyTo {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<Value>) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender }, receiver)
    }

    /// Delivers the reply. Returns `false` when nobody is waiting any more.
    pub fn send(self, value: impl Into<Value>) -> bool {
        if self.sender.send(value.into()).is_err() {
            trace!("reply dropped, the querying caller is no longer waiting");
            return false;
        }
        true
    }

    /// Whether the querying caller has given up.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.sender.is_closed()
    }
}
