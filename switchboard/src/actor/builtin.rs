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

//! Names and default implementations of the commands every actor understands.

use std::collections::HashMap;
use std::fmt::Debug;

use serde_json::Value;
use tracing::level_filters::LevelFilter;

use crate::actor::{ManagedActor, Started};
use crate::common::{parse_level, CommandTable, FutureBox, Reply};
use crate::message::{ArgumentError, MessageContext};

/// `receive_data(topic, data)`: stores `data` in the actor's received-data map.
/// This is the target of [`send_data`](crate::common::ActorHandle::send_data).
pub const RECEIVE_DATA: &str = "receive_data";

/// `flush_received_data([topic])`: forgets one topic, or everything when no topic is given.
pub const FLUSH_RECEIVED_DATA: &str = "flush_received_data";

/// `set_log_level(level)`: changes the actor's log level. Reserved.
pub const SET_LOG_LEVEL: &str = "set_log_level";

/// `reset()`: cancels the actor's scheduled items, drops pending mailbox contents, then runs
/// the actor's `on_reset` hook. Reserved.
pub const RESET: &str = "reset";

/// `exit()`: ends the dispatch loop after the current message. Reserved.
pub const EXIT: &str = "exit";

/// Command names whose behavior cannot be replaced with `command`.
pub(crate) const RESERVED: [&str; 3] = [RESET, EXIT, SET_LOG_LEVEL];

pub(crate) fn default_commands<Model: Send + Debug + 'static>() -> CommandTable<Model> {
    let mut commands: CommandTable<Model> = HashMap::new();
    commands.insert(RECEIVE_DATA.to_string(), Box::new(receive_data::<Model>));
    commands.insert(
        FLUSH_RECEIVED_DATA.to_string(),
        Box::new(flush_received_data::<Model>),
    );
    commands
}

fn receive_data<Model: Send + Debug + 'static>(
    actor: &mut ManagedActor<Started, Model>,
    ctx: &mut MessageContext,
) -> FutureBox {
    let stored = ctx.arg::<String>(0).and_then(|topic| {
        let data = ctx.args().get_opt::<Value>(1)?.unwrap_or(Value::Null);
        actor
            .handle
            .log_gate
            .trace(format_args!("receive data topic={topic}, data={data}"));
        actor.received_data.insert(topic, data);
        Ok(())
    });
    Reply::from_result(stored)
}

fn flush_received_data<Model: Send + Debug + 'static>(
    actor: &mut ManagedActor<Started, Model>,
    ctx: &mut MessageContext,
) -> FutureBox {
    let flushed = ctx
        .args()
        .named_or_at::<String>("topic", 0)
        .map(|topic| match topic {
            Some(topic) => {
                actor.received_data.remove(&topic);
            }
            None => actor.received_data.clear(),
        });
    Reply::from_result(flushed)
}

/// Reads the level argument of `set_log_level`, given either as a name or as `0`-`5`.
pub(crate) fn level_argument(ctx: &MessageContext) -> Result<LevelFilter, ArgumentError> {
    let raw = ctx
        .args()
        .named_or_at::<Value>("level", 0)?
        .ok_or(ArgumentError::MissingPositional(0))?;
    let text = match raw {
        Value::String(name) => name,
        other => other.to_string(),
    };
    parse_level(&text).map_err(|reason| ArgumentError::Invalid {
        argument: "level".to_string(),
        reason,
    })
}
