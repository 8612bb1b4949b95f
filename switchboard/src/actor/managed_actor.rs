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

use std::collections::HashMap;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;

pub use idle::Idle;

use crate::common::{ActorHandle, ActorRuntime, CommandTable, LifecycleHook, ResetHook};
use crate::message::Envelope;

mod idle;
/// Contains the `Started` type-state marker and the dispatch loop.
pub mod started;

/// An actor: a private mailbox, a command table, user state and a single dispatch worker.
///
/// `ManagedActor` uses a type-state parameter. In the [`Idle`] state the command table and
/// lifecycle hooks are configured; [`start`](ManagedActor::start) (or
/// [`defer`](ManagedActor::defer)) then moves the actor into its worker task, where it lives
/// in the [`Started`](started::Started) state and is handed to every command handler.
/// Outside code talks to the actor only through its [`ActorHandle`] or by name.
///
/// # Type Parameters
///
/// *   `ActorState`: [`Idle`] or [`Started`](started::Started).
/// *   `Model`: the user-defined state. Handlers mutate it from the worker only, so it needs
///     to be `Send` but not `Sync`.
pub struct ManagedActor<ActorState, Model: Send + Debug + 'static> {
    pub(crate) handle: ActorHandle,

    pub(crate) runtime: ActorRuntime,

    /// The user-defined state of this actor.
    ///
    /// Command handlers and lifecycle hooks receive the actor and reach the model through
    /// this field.
    pub model: Model,

    /// Values delivered with `send_data`, keyed by topic.
    pub(crate) received_data: HashMap<String, Value>,

    pub(crate) inbox: UnboundedReceiver<Envelope>,

    pub(crate) commands: CommandTable<Model>,
    pub(crate) after_start: LifecycleHook<Model>,
    pub(crate) before_stop: LifecycleHook<Model>,
    pub(crate) after_stop: LifecycleHook<Model>,
    /// Second phase of `reset`, run after the built-in drain.
    pub(crate) on_reset: ResetHook<Model>,

    /// Set by the `exit` command or by a sentinel found while draining on `reset`.
    pub(crate) halt_requested: bool,

    _actor_state: PhantomData<ActorState>,
}

impl<ActorState, Model: Send + Debug + 'static> ManagedActor<ActorState, Model> {
    /// The actor's name, which is also its directory address.
    #[inline]
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// The actor's handle.
    #[inline]
    pub const fn handle(&self) -> &ActorHandle {
        &self.handle
    }

    /// The runtime this actor belongs to.
    #[inline]
    pub const fn runtime(&self) -> &ActorRuntime {
        &self.runtime
    }
}

impl<ActorState, Model: Send + Debug + 'static> Debug for ManagedActor<ActorState, Model> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedActor")
            .field("name", &self.name())
            .field("model", &self.model)
            .field("commands", &self.commands.len())
            .finish_non_exhaustive()
    }
}
