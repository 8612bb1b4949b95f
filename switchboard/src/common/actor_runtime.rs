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

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::Value;
use tracing::{instrument, trace};

use crate::actor::builtin::SET_LOG_LEVEL;
use crate::actor::{ActorConfig, Idle, ManagedActor};
use crate::common::actor_handle::current_actor;
use crate::common::runtime_inner::RuntimeInner;
use crate::common::{ActorHandle, Directory, SwitchboardConfig};
use crate::message::{Arguments, Message, Operation, QueryError, SystemSignal};
use crate::service::{Scheduler, SubscriptionBus};

/// The launched actor system.
///
/// Obtained from [`SwitchboardApp::launch_async`](crate::common::SwitchboardApp::launch_async).
/// Every actor, and any other code that needs to address actors by name, holds a clone of
/// this context object: it owns the [`Directory`], the configuration, and the two built-in
/// services, the [`Scheduler`] and the [`SubscriptionBus`]. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct ActorRuntime(pub(crate) Arc<RuntimeInner>);

impl ActorRuntime {
    /// Creates an idle actor named `name` whose model starts as `State::default()`.
    ///
    /// The actor's mailbox is registered immediately, so it can be addressed (and messages
    /// will queue) before it is started.
    pub fn new_actor<State>(&self, name: &str) -> ManagedActor<Idle, State>
    where
        State: Default + Send + Debug + 'static,
    {
        self.new_actor_with_config(ActorConfig::new(name))
    }

    /// Creates an idle actor from an [`ActorConfig`] with a default model.
    pub fn new_actor_with_config<State>(&self, config: ActorConfig) -> ManagedActor<Idle, State>
    where
        State: Default + Send + Debug + 'static,
    {
        self.new_actor_with_model(config, State::default())
    }

    /// Creates an idle actor from an [`ActorConfig`] and an initial model.
    #[instrument(skip(self, model), fields(actor = config.name()), level = "trace")]
    pub fn new_actor_with_model<State>(
        &self,
        config: ActorConfig,
        model: State,
    ) -> ManagedActor<Idle, State>
    where
        State: Send + Debug + 'static,
    {
        let actor = ManagedActor::new(self, &config, model);
        self.0
            .actors
            .insert(config.name().to_string(), actor.handle().clone());
        actor
    }

    /// Creates an actor, lets `setup` register its commands and hooks, and starts it.
    pub fn spawn_actor<State>(
        &self,
        name: &str,
        setup: impl FnOnce(&mut ManagedActor<Idle, State>),
    ) -> ActorHandle
    where
        State: Default + Send + Debug + 'static,
    {
        let mut actor = self.new_actor::<State>(name);
        setup(&mut actor);
        actor.start()
    }

    /// The name-to-mailbox directory.
    #[inline]
    #[must_use]
    pub fn directory(&self) -> &Directory {
        &self.0.directory
    }

    /// The read-only configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SwitchboardConfig {
        &self.0.config
    }

    /// The scheduler service.
    #[inline]
    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.0.scheduler
    }

    /// The subscription bus service.
    #[inline]
    #[must_use]
    pub fn subscriptions(&self) -> &SubscriptionBus {
        &self.0.subscriptions
    }

    /// The handle of the actor named `name`.
    #[must_use]
    pub fn actor(&self, name: &str) -> Option<ActorHandle> {
        self.0.actors.get(name).map(|entry| entry.value().clone())
    }

    /// Number of actors created in this runtime, including the built-in services.
    #[inline]
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.0.actors.len()
    }

    /// Sends `operation` to `destination` from outside any actor.
    ///
    /// Same semantics as [`ActorHandle::enqueue`]; failures are reported under the name
    /// `runtime`.
    pub fn enqueue(&self, destination: &str, operation: impl Into<Operation>, args: Arguments) {
        let message = Message::new(self.0.log_gate.name(), operation, args);
        self.0.directory.send(&self.0.log_gate, destination, message);
    }

    /// Queries `destination` from outside any actor. See [`ActorHandle::query`].
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] when the destination is missing or no reply arrives in time.
    pub async fn query(
        &self,
        destination: &str,
        operation: impl Into<Operation>,
        timeout: Duration,
        args: Arguments,
    ) -> Result<Value, QueryError> {
        self.0
            .directory
            .request(&self.0.log_gate, destination, operation.into(), timeout, args)
            .await
    }

    /// Sends `set_log_level` to every named actor that exists; unknown names are skipped.
    pub fn update_log_levels(&self, levels: &BTreeMap<String, String>) {
        for (actor, level) in levels {
            if self.0.directory.contains(actor) {
                self.enqueue(actor, SET_LOG_LEVEL, Arguments::new().with(level.as_str()));
            } else {
                trace!(actor = actor.as_str(), "no such actor, log level not updated");
            }
        }
    }

    /// Stops the whole system.
    ///
    /// Shuts down the scheduler's wake monitor, places the stop sentinel at the tail of every
    /// registered mailbox, then waits for the workers to finish for at most the configured
    /// `exit_grace_period_ms`. Workers still running after that are cancelled and the overrun
    /// is logged. When called from inside an actor's handler, that actor stops once the
    /// handler returns; it is not waited for.
    #[instrument(skip(self), level = "debug")]
    pub async fn exit(&self) {
        let grace = self.config().exit_grace_period();
        let gate = &self.0.log_gate;
        gate.info("exiting");

        let monitor = self.scheduler().shutdown_monitor();
        let signalled = self.0.directory.broadcast_signal(SystemSignal::Terminate);
        gate.debug(format_args!("stop sentinel sent to {signalled} mailbox(es)"));
        let unstarted = self
            .0
            .actors
            .iter()
            .filter(|entry| entry.value().discard_unstarted())
            .count();
        if unstarted > 0 {
            gate.debug(format_args!("dropped {unstarted} actor(s) that were never started"));
        }

        let caller = current_actor();
        let stopping: Vec<_> = self
            .0
            .actors
            .iter()
            .filter(|entry| caller.as_deref() != Some(entry.key().as_str()))
            .map(|entry| {
                let handle = entry.value().clone();
                async move { handle.wait_stopped().await }
            })
            .collect();

        let all_stopped = async {
            join_all(stopping).await;
            if let Some(monitor) = monitor {
                if let Err(e) = monitor.await {
                    gate.error(format_args!("scheduler wake monitor failed: {e}"));
                }
            }
        };
        if tokio::time::timeout(grace, all_stopped).await.is_err() {
            gate.error(format_args!(
                "workers still running after the {grace:?} exit grace period; cancelling them"
            ));
            self.0.cancellation_token.cancel();
        } else {
            gate.info("exited");
        }
    }
}
