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
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};
use std::time::Duration;

use anyhow::ensure;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::Value;
use tokio_util::task::TaskTracker;
use tracing::level_filters::LevelFilter;
use tracing::{instrument, Level};

use crate::actor::builtin::{RECEIVE_DATA, RESET};
use crate::actor::{ActorStatus, StatusCell};
use crate::common::runtime_inner::RuntimeInner;
use crate::common::{ActorRuntime, Directory, LogGate};
use crate::message::{Arguments, Mailbox, Message, Operation, QueryError, SystemSignal};
use crate::service::ScheduleRequest;

tokio::task_local! {
    /// Name of the actor whose worker is running on the current task.
    static CURRENT_ACTOR: Arc<str>;
}

/// Name of the actor whose worker is executing the current task, if any.
pub(crate) fn current_actor() -> Option<Arc<str>> {
    CURRENT_ACTOR.try_with(Clone::clone).ok()
}

/// A cloneable reference to an actor.
///
/// The handle is how code outside an actor (and the actor's own handlers, via
/// [`ManagedActor::handle`](crate::actor::ManagedActor::handle)) interacts with it: sending
/// messages in its name, querying other actors, scheduling, publishing and subscribing, and
/// controlling the worker's lifecycle.
///
/// Sending never blocks and never fails from the caller's point of view. Messages to unknown
/// or stopped destinations are dropped and reported through this actor's log.
///
/// The runtime keeps a handle to every actor, so a handle only refers back to the runtime
/// weakly. Once the last [`ActorRuntime`] clone and every worker are gone, scheduling and
/// subscription calls are ignored with a warning.
#[derive(Clone)]
pub struct ActorHandle {
    pub(crate) name: Arc<str>,
    pub(crate) mailbox: Mailbox,
    pub(crate) tracker: TaskTracker,
    pub(crate) status: Arc<StatusCell>,
    pub(crate) log_gate: LogGate,
    worker: Arc<Mutex<Option<BoxFuture<'static, ()>>>>,
    directory: Directory,
    tokio: tokio::runtime::Handle,
    runtime: Weak<RuntimeInner>,
}

impl ActorHandle {
    pub(crate) fn new(name: String, mailbox: Mailbox, log_gate: LogGate, runtime: &ActorRuntime) -> Self {
        Self {
            name: Arc::from(name),
            mailbox,
            tracker: TaskTracker::new(),
            status: Arc::new(StatusCell::default()),
            log_gate,
            worker: Arc::new(Mutex::new(None)),
            directory: runtime.0.directory.clone(),
            tokio: runtime.0.tokio.clone(),
            runtime: Arc::downgrade(&runtime.0),
        }
    }

    /// The actor's name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The actor's current lifecycle status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> ActorStatus {
        self.status.get()
    }

    /// Whether the dispatch worker is processing messages.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status() == ActorStatus::Running
    }

    /// The actor's mailbox.
    #[inline]
    #[must_use]
    pub const fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// The runtime this actor belongs to, unless it has already been dropped.
    #[must_use]
    pub fn runtime(&self) -> Option<ActorRuntime> {
        self.runtime.upgrade().map(ActorRuntime)
    }

    /// The runtime, or a warning that `action` was ignored because it is gone.
    fn attached(&self, action: &str) -> Option<ActorRuntime> {
        let runtime = self.runtime();
        if runtime.is_none() {
            self.log_gate
                .warn(format_args!("runtime is gone, {action} ignored"));
        }
        runtime
    }

    /// The actor's log gate.
    #[inline]
    #[must_use]
    pub const fn log_gate(&self) -> &LogGate {
        &self.log_gate
    }

    pub(crate) fn install_worker(&self, worker: BoxFuture<'static, ()>) {
        let worker: BoxFuture<'static, ()> = Box::pin(CURRENT_ACTOR.scope(self.name.clone(), worker));
        *self.worker.lock() = Some(worker);
    }

    /// Drops the worker of an actor that was never started. Returns whether there was one.
    pub(crate) fn discard_unstarted(&self) -> bool {
        self.worker.lock().take().is_some()
    }

    /// Spawns the dispatch worker if it has not been started yet.
    ///
    /// Idempotent: calling it on a running actor, or on one that has already stopped, does
    /// nothing and returns `false`. A stopped actor cannot be restarted.
    pub fn start(&self) -> bool {
        let Some(worker) = self.worker.lock().take() else {
            self.log_gate
                .debug(format_args!("can't start, the actor is {}", self.status()));
            return false;
        };
        self.status.set(ActorStatus::Running);
        self.tracker.spawn_on(worker, &self.tokio);
        self.tracker.close();
        self.log_gate.debug("task monitor run initiated");
        true
    }

    /// Sends the stop sentinel and waits until the worker has terminated.
    ///
    /// Messages already in the mailbox ahead of the sentinel are processed first; anything
    /// enqueued after it is never processed. Calling `stop` on an actor that is not running
    /// returns immediately.
    ///
    /// # Errors
    ///
    /// Fails when awaited from the actor's own worker, which would wait on itself forever.
    /// A handler that wants its actor to stop should enqueue `exit` or call
    /// [`request_exit`](crate::actor::ManagedActor::request_exit).
    #[instrument(skip(self), fields(actor = %self.name), level = "trace")]
    pub async fn stop(&self) -> anyhow::Result<()> {
        let on_own_worker = current_actor().is_some_and(|current| current == self.name);
        ensure!(
            !on_own_worker,
            "actor `{}` cannot wait for its own worker to stop",
            self.name
        );

        match self.status() {
            ActorStatus::Idle | ActorStatus::Stopped => return Ok(()),
            ActorStatus::Running | ActorStatus::Stopping => {}
        }
        self.mailbox.signal(SystemSignal::Terminate);
        self.wait_stopped().await;
        Ok(())
    }

    /// Waits for the worker to terminate without asking it to.
    pub(crate) async fn wait_stopped(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// Asks the actor to reset itself.
    ///
    /// The reset runs on the actor's worker when it reaches this message: scheduled items
    /// owned by the actor are cancelled, everything still pending in its mailbox is discarded,
    /// then its `on_reset` hook runs.
    pub fn reset(&self) {
        self.enqueue_local(RESET, Arguments::new());
    }

    /// Places a message on this actor's own mailbox.
    pub fn enqueue_local(&self, operation: impl Into<Operation>, args: Arguments) {
        if let Err(message) = self.mailbox.post(Message::new(&*self.name, operation, args)) {
            self.log_gate.warn(format_args!(
                "mailbox closed, dropped op={} {:?}",
                message.operation(),
                message.args()
            ));
        }
    }

    /// Sends `operation` to the actor named `destination`.
    ///
    /// Unknown destinations are reported through this actor's log and the message is dropped.
    pub fn enqueue(&self, destination: &str, operation: impl Into<Operation>, args: Arguments) {
        let message = Message::new(&*self.name, operation, args);
        self.directory.send(&self.log_gate, destination, message);
    }

    /// Sends `data` under `topic` to `destination`'s `receive_data` command.
    pub fn send_data(&self, destination: &str, topic: &str, data: impl Into<Value>) {
        let data = data.into();
        self.log_gate
            .trace(format_args!("send data dest={destination}, topic={topic}, data={data}"));
        self.enqueue(destination, RECEIVE_DATA, Arguments::new().with(topic).with(data));
    }

    /// Sends `operation` to `destination` and waits up to `timeout` for its reply.
    ///
    /// Only the calling task waits; no actor worker is blocked. The receiving handler answers
    /// with [`MessageContext::reply`](crate::message::MessageContext::reply).
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] (status `-1`) at once when the destination does not exist or
    /// has stopped, and after `timeout` when no reply arrives.
    pub async fn query(
        &self,
        destination: &str,
        operation: impl Into<Operation>,
        timeout: Duration,
        args: Arguments,
    ) -> Result<Value, QueryError> {
        self.directory
            .request(&self.log_gate, destination, operation.into(), timeout, args)
            .await
    }

    /// Schedules `operation` to be sent to `destination` every `interval`, `count` times
    /// (`0` repeats until cancelled). This actor owns the item.
    pub fn sched(
        &self,
        sched_id: &str,
        interval: Duration,
        count: u32,
        destination: &str,
        operation: impl Into<Operation>,
        args: Arguments,
    ) {
        self.log_gate.trace(format_args!(
            "schedule event sched_id={sched_id}, interval={interval:?}, cnt={count}, dest={destination}"
        ));
        let request = ScheduleRequest::new(&*self.name, sched_id, destination, operation)
            .every(interval)
            .times(count)
            .with_args(args);
        if let Some(runtime) = self.attached("schedule") {
            runtime.scheduler().schedule(request);
        }
    }

    /// Like [`sched`](Self::sched) with this actor as the destination.
    pub fn sched_local(
        &self,
        sched_id: &str,
        interval: Duration,
        count: u32,
        operation: impl Into<Operation>,
        args: Arguments,
    ) {
        let name = self.name.clone();
        self.sched(sched_id, interval, count, &name, operation, args);
    }

    /// Cancels this actor's scheduled item `sched_id`, if it exists.
    pub fn sched_del_item(&self, sched_id: &str) {
        self.log_gate
            .trace(format_args!("schedule cancel event sched_id={sched_id}"));
        if let Some(runtime) = self.attached("schedule cancel") {
            runtime.scheduler().del_item(&self.name, sched_id);
        }
    }

    /// Subscribes this actor's `operation` to `topic`, returning the subscriber id.
    ///
    /// Every later publish to `topic` enqueues `operation` here with the arguments
    /// `(topic, attributes, data)`. Returns `None` once the runtime is gone.
    pub fn subscribe(
        &self,
        topic: &str,
        operation: impl Into<Operation>,
        attributes: Option<Value>,
    ) -> Option<String> {
        let operation = operation.into();
        self.log_gate
            .trace(format_args!("subscribe topic={topic} op={operation}"));
        let runtime = self.attached("subscribe")?;
        Some(
            runtime
                .subscriptions()
                .add_subscription(topic, &self.name, operation, attributes, None),
        )
    }

    /// Like [`subscribe`](Self::subscribe) with an explicit subscriber id, replacing any
    /// subscription already stored under that id.
    pub fn subscribe_with_id(
        &self,
        topic: &str,
        subs_id: &str,
        operation: impl Into<Operation>,
        attributes: Option<Value>,
    ) -> Option<String> {
        let runtime = self.attached("subscribe")?;
        Some(runtime.subscriptions().add_subscription(
            topic,
            &self.name,
            operation.into(),
            attributes,
            Some(subs_id),
        ))
    }

    /// Removes the subscription `subs_id` from `topic`. Returns whether it existed.
    pub fn unsubscribe(&self, topic: &str, subs_id: &str) -> bool {
        self.attached("unsubscribe")
            .is_some_and(|runtime| runtime.subscriptions().unsubscribe(topic, subs_id))
    }

    /// Publishes `data` under `topic` on the subscription bus.
    pub fn publish(&self, topic: &str, data: impl Into<Value>) {
        self.log_gate.trace(format_args!("published topic {topic}"));
        if let Some(runtime) = self.attached("publish") {
            runtime
                .subscriptions()
                .publish_from(&self.name, topic, data.into());
        }
    }

    /// The last value published under `topic`.
    #[must_use]
    pub fn get_data(&self, topic: &str) -> Option<Value> {
        self.attached("get_data")?.subscriptions().get_data(topic)
    }

    /// Changes the actor's log level immediately, from any thread.
    pub fn set_log_level(&self, level: LevelFilter) {
        self.log_gate.set_level(level);
    }

    /// Logs `message` in this actor's name, subject to its level.
    pub fn log(&self, level: Level, message: impl fmt::Display) {
        self.log_gate.log(level, message);
    }
}

impl Debug for ActorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorHandle")
            .field("name", &self.name)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl PartialEq for ActorHandle {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ActorHandle {}

impl Hash for ActorHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}
