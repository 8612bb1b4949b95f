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

use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::common::{ActorHandle, Directory, LogGate, SwitchboardConfig};
use crate::service::{Scheduler, SubscriptionBus};

/// Internal state of a launched runtime, shared by every clone of
/// [`ActorRuntime`](crate::common::ActorRuntime).
#[derive(Debug)]
pub(crate) struct RuntimeInner {
    /// Name to mailbox, used for all addressing.
    pub(crate) directory: Directory,

    /// Name to handle, used for lifecycle control and introspection.
    pub(crate) actors: DashMap<String, ActorHandle>,

    /// Read-only configuration.
    pub(crate) config: Arc<SwitchboardConfig>,

    /// Cancelled only when `exit` runs out of grace period.
    pub(crate) cancellation_token: CancellationToken,

    /// The Tokio runtime the system was launched on; workers are spawned here.
    pub(crate) tokio: tokio::runtime::Handle,

    pub(crate) scheduler: Scheduler,

    pub(crate) subscriptions: SubscriptionBus,

    /// Reports made by the runtime itself rather than by an actor.
    pub(crate) log_gate: LogGate,
}
