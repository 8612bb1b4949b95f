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

pub use actor_handle::ActorHandle;
pub use actor_reply::Reply;
pub use actor_runtime::ActorRuntime;
pub use app::SwitchboardApp;
pub use config::{
    AppConfig, LoggingConfig, SchedulerConfig, SubscriptionConfig, SwitchboardConfig,
    TimeoutConfig,
};
pub use directory::Directory;
pub use log_gate::{parse_level, LogGate};
pub use logging::init_tracing;
pub(crate) use types::{CommandTable, LifecycleHook, ResetHook};
pub use types::FutureBox;

mod actor_handle;
mod actor_reply;
mod actor_runtime;
mod app;
mod config;
mod directory;
mod log_gate;
mod logging;
mod runtime_inner;
mod types;
