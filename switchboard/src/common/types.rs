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

//! Type aliases for handler signatures and boxed futures used across the crate.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::actor::{ManagedActor, Started};
use crate::message::MessageContext;

/// A pinned, boxed, `Send` future resolving to the outcome of a handler or hook.
///
/// This is the return type of every command handler and lifecycle hook. See
/// [`Reply`](crate::common::Reply) for helpers that build one.
pub type FutureBox = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

/// Signature of a command handler registered with `command`.
pub(crate) type CommandHandler<Model> = dyn for<'a, 'b> Fn(&'a mut ManagedActor<Started, Model>, &'b mut MessageContext) -> FutureBox
    + Send
    + Sync
    + 'static;

/// Crate-internal: the command table, populated while `Idle` and read-only afterwards.
pub(crate) type CommandTable<Model> = HashMap<String, Box<CommandHandler<Model>>>;

/// Crate-internal: an optional hook receiving the running actor immutably.
pub(crate) type LifecycleHook<Model> =
    Option<Box<dyn Fn(&ManagedActor<Started, Model>) -> FutureBox + Send + Sync + 'static>>;

/// Crate-internal: the optional second phase of `reset`, which may mutate the model.
pub(crate) type ResetHook<Model> =
    Option<Box<dyn Fn(&mut ManagedActor<Started, Model>) -> FutureBox + Send + Sync + 'static>>;
