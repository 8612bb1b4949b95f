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
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tokio::time::Instant;
use tracing::trace;

use crate::common::LogGate;
use crate::message::{
    Arguments, DispatchError, Mailbox, Message, Operation, QueryError, ReplyTo, SystemSignal,
};

/// The process-wide registry mapping actor names to mailboxes.
///
/// An entry is added when an actor is constructed and is never removed; looking up a
/// stopped actor yields a closed mailbox. Cloning a `Directory` is cheap and every clone
/// refers to the same table.
#[derive(Clone, Default)]
pub struct Directory {
    entries: Arc<DashMap<String, Mailbox>>,
}

impl Directory {
    /// Adds `mailbox` under its owner's name, returning any mailbox it displaced.
    pub(crate) fn register(&self, mailbox: Mailbox) -> Option<Mailbox> {
        trace!(actor = mailbox.owner(), "registering mailbox");
        self.entries.insert(mailbox.owner().to_string(), mailbox)
    }

    /// The mailbox registered under `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Mailbox> {
        self.entries.get(name).map(|entry| entry.value().clone())
    }

    /// Whether an actor named `name` was ever registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of registered actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no actor has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        names.sort_unstable();
        names
    }

    /// Posts `message` to the mailbox registered under `destination`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::DestinationNotFound`] when no such actor exists and
    /// [`DispatchError::MailboxClosed`] when it has stopped. The message is dropped.
    pub fn deliver(&self, destination: &str, message: Message) -> Result<(), DispatchError> {
        let mailbox = self
            .lookup(destination)
            .ok_or_else(|| DispatchError::DestinationNotFound(destination.to_string()))?;
        mailbox
            .post(message)
            .map_err(|_| DispatchError::MailboxClosed(destination.to_string()))
    }

    /// Delivers `message`, reporting a failure through `gate` instead of returning it.
    pub(crate) fn send(&self, gate: &LogGate, destination: &str, message: Message) {
        gate.trace(format_args!(
            "enqueue dest={destination} op={} {:?}",
            message.operation(),
            message.args()
        ));
        let rejected = match self.lookup(destination) {
            None => (DispatchError::DestinationNotFound(destination.to_string()), message),
            Some(mailbox) => match mailbox.post(message) {
                Ok(()) => return,
                Err(message) => (DispatchError::MailboxClosed(destination.to_string()), message),
            },
        };
        let (error, message) = rejected;
        gate.error(format_args!(
            "{error}, dropped op={} {:?}",
            message.operation(),
            message.args()
        ));
    }

    /// Sends `operation` to `destination` with a private reply channel and waits for the reply.
    ///
    /// A missing destination fails at once. A destination that never replies, or that drops
    /// the request without replying, fails once `timeout` has elapsed.
    pub(crate) async fn request(
        &self,
        gate: &LogGate,
        destination: &str,
        operation: Operation,
        timeout: Duration,
        args: Arguments,
    ) -> Result<Value, QueryError> {
        let deadline = Instant::now() + timeout;
        gate.trace(format_args!(
            "query dest={destination} op={operation} {args:?}"
        ));

        let Some(mailbox) = self.lookup(destination) else {
            gate.error(format_args!(
                "query failed, destination `{destination}` does not exist, op={operation} {args:?}"
            ));
            return Err(QueryError::DestinationNotFound(destination.to_string()));
        };

        let (reply_to, reply) = ReplyTo::channel();
        let message = Message::new(gate.name(), operation, args).with_reply_to(reply_to);
        if let Err(message) = mailbox.post(message) {
            gate.error(format_args!(
                "query failed, mailbox of `{destination}` is closed, op={} {:?}",
                message.operation(),
                message.args()
            ));
            return Err(QueryError::MailboxClosed(destination.to_string()));
        }

        match tokio::time::timeout_at(deadline, reply).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => {
                // The request was discarded unanswered; the caller still waits out its timeout.
                tokio::time::sleep_until(deadline).await;
                gate.error(format_args!(
                    "query timeout, dest={destination} gave no reply within {timeout:?}"
                ));
                Err(QueryError::Timeout(timeout))
            }
            Err(_) => {
                gate.error(format_args!(
                    "query timeout, dest={destination} gave no reply within {timeout:?}"
                ));
                Err(QueryError::Timeout(timeout))
            }
        }
    }

    /// Places `signal` at the tail of every registered mailbox. Returns how many accepted it.
    pub(crate) fn broadcast_signal(&self, signal: SystemSignal) -> usize {
        let mailboxes: Vec<Mailbox> = self.entries.iter().map(|e| e.value().clone()).collect();
        mailboxes
            .iter()
            .filter(|mailbox| mailbox.signal(signal))
            .count()
    }
}

impl fmt::Debug for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directory")
            .field("actors", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::unbounded_channel;
    use tracing::level_filters::LevelFilter;

    use super::*;
    use crate::message::Envelope;

    fn register(directory: &Directory, name: &str) -> tokio::sync::mpsc::UnboundedReceiver<Envelope> {
        let (outbox, inbox) = unbounded_channel();
        directory.register(Mailbox::new(name.to_string(), outbox));
        inbox
    }

    #[test]
    fn deliver_reports_missing_and_closed_destinations() {
        let directory = Directory::default();
        let mut inbox = register(&directory, "b");
        let closed = register(&directory, "gone");
        drop(closed);

        directory
            .deliver("b", Message::new("a", "ping", Arguments::new()))
            .unwrap();
        assert!(matches!(inbox.try_recv(), Ok(Envelope::Message(_))));

        assert!(matches!(
            directory.deliver("nobody", Message::new("a", "ping", Arguments::new())),
            Err(DispatchError::DestinationNotFound(name)) if name == "nobody"
        ));
        assert!(matches!(
            directory.deliver("gone", Message::new("a", "ping", Arguments::new())),
            Err(DispatchError::MailboxClosed(_))
        ));
        assert_eq!(directory.names(), vec!["b".to_string(), "gone".to_string()]);
        assert_eq!(directory.broadcast_signal(SystemSignal::Terminate), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn request_to_missing_destination_fails_immediately() {
        let directory = Directory::default();
        let gate = LogGate::new("a", LevelFilter::OFF);
        let started = Instant::now();

        let outcome = directory
            .request(&gate, "nobody", "ping".into(), Duration::from_secs(5), Arguments::new())
            .await;

        assert_eq!(outcome, Err(QueryError::DestinationNotFound("nobody".to_string())));
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn request_dropped_unanswered_still_waits_for_timeout() {
        let directory = Directory::default();
        let mut inbox = register(&directory, "b");
        let gate = LogGate::new("a", LevelFilter::OFF);
        tokio::spawn(async move {
            // Receive the request and drop it along with its reply channel.
            let _ = inbox.recv().await;
        });
        let started = Instant::now();

        let outcome = directory
            .request(&gate, "b", "ping".into(), Duration::from_secs(2), Arguments::new())
            .await;

        assert_eq!(outcome, Err(QueryError::Timeout(Duration::from_secs(2))));
        assert!(started.elapsed() >= Duration::from_secs(2));
    }
}
