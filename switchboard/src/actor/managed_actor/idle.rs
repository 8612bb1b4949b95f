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

use std::fmt::Debug;
use std::marker::PhantomData;
use std::mem;

use tokio::sync::mpsc::unbounded_channel;
use tracing::{instrument, trace};

use crate::actor::builtin::{self, RESERVED};
use crate::actor::{ActorConfig, ManagedActor, Started};
use crate::common::{ActorHandle, ActorRuntime, FutureBox, LogGate, Reply};
use crate::message::{Mailbox, MessageContext};

/// Type-state marker for a [`ManagedActor`] that has been configured but not yet started.
///
/// While `Idle`, commands are registered with [`ManagedActor::command`] and lifecycle hooks
/// with [`ManagedActor::after_start`] and friends. The mailbox already exists and is
/// registered, so messages sent to the actor before it starts are kept and processed in order
/// once it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Idle;

impl<Model: Send + Debug + 'static> ManagedActor<Idle, Model> {
    /// Registers an asynchronous handler for the command `name`.
    ///
    /// The handler receives the running actor and the [`MessageContext`] of the message being
    /// processed and returns a [`FutureBox`], usually built with [`Reply`]. Registering a name
    /// twice replaces the earlier handler. The reserved names `reset`, `exit` and
    /// `set_log_level` cannot be registered; use [`on_reset`](Self::on_reset) to extend reset.
    #[instrument(skip(self, handler), level = "trace")]
    pub fn command<F>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: for<'a, 'b> Fn(&'a mut ManagedActor<Started, Model>, &'b mut MessageContext) -> FutureBox
            + Send
            + Sync
            + 'static,
    {
        if RESERVED.contains(&name) {
            self.handle
                .log_gate
                .error(format_args!("`{name}` is a reserved command and cannot be replaced"));
            return self;
        }
        trace!(actor = self.name(), command = name, "adding command");
        self.commands.insert(name.to_string(), Box::new(handler));
        self
    }

    /// Registers a synchronous handler for the command `name`.
    ///
    /// A convenience over [`command`](Self::command) for the common case where all the work
    /// happens on the actor. Returning `Err` reports the error through the actor's log.
    pub fn command_sync<F>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: for<'a, 'b> Fn(&'a mut ManagedActor<Started, Model>, &'b mut MessageContext) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.command(name, move |actor, ctx| Reply::from_result(handler(actor, ctx)))
    }

    /// Registers a hook run on the worker before the first message is processed.
    pub fn after_start<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&ManagedActor<Started, Model>) -> FutureBox + Send + Sync + 'static,
    {
        self.after_start = Some(Box::new(hook));
        self
    }

    /// Registers a hook run once the dispatch loop has ended, before the mailbox is closed.
    pub fn before_stop<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&ManagedActor<Started, Model>) -> FutureBox + Send + Sync + 'static,
    {
        self.before_stop = Some(Box::new(hook));
        self
    }

    /// Registers a hook run after the mailbox is closed, as the worker's last act.
    pub fn after_stop<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&ManagedActor<Started, Model>) -> FutureBox + Send + Sync + 'static,
    {
        self.after_stop = Some(Box::new(hook));
        self
    }

    /// Registers the second phase of `reset`.
    ///
    /// The built-in phase always runs first: the actor's scheduled items are cancelled and
    /// its pending mailbox contents discarded. The hook then gets mutable access to the
    /// actor, typically to clear parts of the model.
    pub fn on_reset<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut ManagedActor<Started, Model>) -> FutureBox + Send + Sync + 'static,
    {
        self.on_reset = Some(Box::new(hook));
        self
    }

    /// Moves the actor onto its worker task and starts processing messages.
    ///
    /// Must be called from within the runtime's Tokio context or from any thread once the
    /// runtime has been launched; the worker is spawned on the runtime's Tokio handle.
    #[instrument(skip(self), fields(actor = self.name()), level = "trace")]
    pub fn start(self) -> ActorHandle {
        let handle = self.defer();
        handle.start();
        handle
    }

    /// Prepares the worker without starting it.
    ///
    /// Messages sent to the actor accumulate in its mailbox until
    /// [`ActorHandle::start`] is called.
    pub fn defer(mut self) -> ActorHandle {
        trace!(actor = self.name(), model = ?self.model, "preparing worker");
        let commands = mem::take(&mut self.commands);
        let handle = self.handle.clone();
        let actor: ManagedActor<Started, Model> = self.into();
        handle.install_worker(Box::pin(actor.wake(commands)));
        handle
    }

    pub(crate) fn new(runtime: &ActorRuntime, config: &ActorConfig, model: Model) -> Self {
        let name = config.name().to_string();
        let log_gate = config.log_gate.clone().unwrap_or_else(|| {
            let level = config
                .log_level()
                .unwrap_or_else(|| runtime.config().level_for(&name));
            LogGate::new(&name, level)
        });

        let (outbox, inbox) = unbounded_channel();
        let mailbox = Mailbox::new(name.clone(), outbox);
        if runtime.directory().register(mailbox.clone()).is_some() {
            log_gate.warn("an actor with this name was already registered; its entry was replaced");
        }
        let handle = ActorHandle::new(name, mailbox, log_gate, runtime);
        handle.log_gate.debug("created");

        Self {
            handle,
            runtime: runtime.clone(),
            model,
            received_data: std::collections::HashMap::new(),
            inbox,
            commands: builtin::default_commands(),
            after_start: None,
            before_stop: None,
            after_stop: None,
            on_reset: None,
            halt_requested: false,
            _actor_state: PhantomData,
        }
    }
}

impl<Model: Send + Debug + 'static> From<ManagedActor<Idle, Model>>
    for ManagedActor<Started, Model>
{
    fn from(value: ManagedActor<Idle, Model>) -> Self {
        Self {
            handle: value.handle,
            runtime: value.runtime,
            model: value.model,
            received_data: value.received_data,
            inbox: value.inbox,
            commands: value.commands,
            after_start: value.after_start,
            before_stop: value.before_stop,
            after_stop: value.after_stop,
            on_reset: value.on_reset,
            halt_requested: value.halt_requested,
            _actor_state: PhantomData,
        }
    }
}
