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

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Switchboard
//!
//! A small in-process actor runtime on Tokio. Actors own an unbounded FIFO mailbox, process
//! one message at a time on their own worker task and talk to each other only by enqueuing
//! messages addressed by name through a shared directory.
//!
//! ## Key Concepts
//!
//! - **Actors (`ManagedActor`)**: a model plus a table of named commands, built in the `Idle`
//!   type-state and run in the `Started` one. Failed or panicking commands are logged and the
//!   actor keeps going.
//! - **Handles (`ActorHandle`)**: clonable references used to start, stop, reset and message
//!   an actor, and to act on its behalf (schedule, subscribe, publish, query).
//! - **Messages**: an `Operation` (a command name or a direct callable) plus `Arguments`.
//!   `query` adds a private reply channel and waits for the answer with a timeout.
//! - **Scheduler**: a built-in actor that delivers messages on an interval, a fixed number of
//!   times or forever, woken by a monitor task at the earliest due time.
//! - **Subscription bus**: a built-in actor that keeps the latest value per topic and fans
//!   each publish out to the topic's subscribers.
//! - **Runtime (`ActorRuntime`)**: the context object holding the directory, configuration
//!   and services, created by `SwitchboardApp` and shut down with `exit`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use switchboard::prelude::*;
//!
//! #[derive(Debug, Default)]
//! struct Counter {
//!     count: i64,
//! }
//!
//! let runtime = SwitchboardApp::launch_async().await;
//! let counter = runtime.spawn_actor::<Counter>("counter", |actor| {
//!     actor.command_sync("add", |actor, ctx| {
//!         actor.model.count += ctx.arg::<i64>(0)?;
//!         ctx.reply(actor.model.count);
//!         Ok(())
//!     });
//! });
//! let total = runtime
//!     .query("counter", "add", Duration::from_secs(1), Arguments::new().with(2))
//!     .await?;
//! runtime.exit().await;
//! ```

/// The runtime, handles, configuration and logging.
pub(crate) mod common;

/// Actor construction, type-states and the dispatch loop.
pub(crate) mod actor;

/// Messages, arguments, mailboxes and errors.
pub(crate) mod message;

/// The scheduler and the subscription bus.
pub(crate) mod service;

/// Command names understood by every actor and by the built-in services.
pub mod commands {
    pub use crate::actor::builtin::{EXIT, FLUSH_RECEIVED_DATA, RECEIVE_DATA, RESET, SET_LOG_LEVEL};
    pub use crate::service::{
        ADD_SUBSCRIPTION, DEL_ITEM, FLUSH_MY_ITEMS, GET_DATA, PUBLISH, SCHEDULE, UNSUBSCRIBE,
    };
}

/// Configuration types and loading.
pub mod config {
    pub use crate::common::{
        AppConfig, LoggingConfig, SchedulerConfig, SubscriptionConfig, SwitchboardConfig,
        TimeoutConfig,
    };
}

/// Tracing setup and per-actor log levels.
pub mod logging {
    pub use crate::common::{init_tracing, parse_level, LogGate};
}

/// A prelude module for conveniently importing the most commonly used items.
///
/// # Re-exports
///
/// ## Core Types
/// *   [`crate::actor::ActorConfig`]: Name and starting log level of a new actor.
/// *   [`crate::actor::ActorStatus`]: Observable lifecycle state of an actor.
/// *   [`crate::actor::Idle`] / [`crate::actor::Started`]: Actor type-states.
/// *   [`crate::actor::ManagedActor`]: An actor's model, commands and hooks.
/// *   [`crate::common::ActorHandle`]: Handle for interacting with an actor.
/// *   [`crate::common::ActorRuntime`]: The launched system.
/// *   [`crate::common::Reply`]: Helpers building command handler return values.
/// *   [`crate::common::SwitchboardApp`]: Entry point that launches the system.
/// *   [`crate::message::Arguments`]: Positional and named message arguments.
/// *   [`crate::message::MessageContext`]: What a command handler receives.
/// *   [`crate::message::Operation`]: A command name or a direct callable.
/// *   [`crate::service::Scheduler`] / [`crate::service::ScheduleRequest`]: Timed sends.
/// *   [`crate::service::SubscriptionBus`]: Topic publish and subscribe.
///
/// ## External Crates
/// *   [`serde_json::json`] and [`serde_json::Value`] for building arguments.
/// *   [`std::time::Duration`] for intervals and timeouts.
pub mod prelude {
    pub use serde_json::{json, Value};
    pub use std::time::Duration;
    pub use tracing::level_filters::LevelFilter;

    pub use crate::actor::{ActorConfig, ActorStatus, Idle, ManagedActor, Started};
    pub use crate::commands::*;
    pub use crate::common::{
        init_tracing, ActorHandle, ActorRuntime, Directory, FutureBox, Reply, SwitchboardApp,
        SwitchboardConfig,
    };
    pub use crate::message::{
        ArgumentError, Arguments, DirectOperation, DispatchError, Message, MessageContext, Operation,
        QueryError,
    };
    pub use crate::service::{ScheduleRequest, Scheduler, SubscriptionBus};
}
