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
use tracing::trace;

use crate::common::runtime_inner::RuntimeInner;
use crate::common::{ActorRuntime, Directory, LogGate, SwitchboardConfig};
use crate::service::{Scheduler, SubscriptionBus};

/// Name under which the runtime itself reports.
pub(crate) const RUNTIME_NAME: &str = "runtime";

/// Entry point for launching an actor system.
///
/// ```rust,ignore
/// use switchboard::prelude::*;
///
/// #[tokio::main]
/// async fn main() {
///     let runtime = SwitchboardApp::launch_async().await;
///     // create and start actors...
///     runtime.exit().await;
/// }
/// ```
#[derive(Default, Debug, Clone)]
pub struct SwitchboardApp;

impl SwitchboardApp {
    /// Launches a system configured from the XDG configuration file, if there is one.
    ///
    /// Must be called from within a Tokio runtime; actor workers are spawned on it.
    pub async fn launch_async() -> ActorRuntime {
        Self::launch_with_config(SwitchboardConfig::load()).await
    }

    /// Launches a system with an explicit configuration.
    ///
    /// Creates the directory, then starts the scheduler (and its wake monitor) and the
    /// subscription bus under their configured names.
    pub async fn launch_with_config(config: SwitchboardConfig) -> ActorRuntime {
        trace!(?config, "launching switchboard");
        let config = Arc::new(config);
        let directory = Directory::default();

        let runtime = ActorRuntime(Arc::new(RuntimeInner {
            scheduler: Scheduler::new(&config, directory.clone()),
            subscriptions: SubscriptionBus::new(&config, directory.clone()),
            log_gate: LogGate::new(RUNTIME_NAME, config.level_for(RUNTIME_NAME)),
            directory,
            actors: DashMap::new(),
            config,
            cancellation_token: CancellationToken::new(),
            tokio: tokio::runtime::Handle::current(),
        }));

        runtime.scheduler().launch(&runtime);
        runtime.subscriptions().launch(&runtime);

        trace!("switchboard launched");
        runtime
    }
}
