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

use serde_json::Value;
use switchboard::prelude::*;
use switchboard_test::prelude::*;

/// One message as the recorder saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub operation: String,
    pub sender: String,
    pub args: Vec<Value>,
}

/// Writes every message it handles into a [`Probe`].
#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Probe<Call>,
}

fn call_of(ctx: &MessageContext) -> Call {
    Call {
        operation: ctx.operation().to_string(),
        sender: ctx.sender().to_string(),
        args: ctx.args().positional().to_vec(),
    }
}

/// Starts a recorder named `name` that accepts each of `commands`.
///
/// A command named `slow` is recorded 50 ms after it is dequeued.
pub fn spawn_recorder(runtime: &ActorRuntime, name: &str, commands: &[&str]) -> (ActorHandle, Probe<Call>) {
    let calls = Probe::new();
    let mut actor = runtime.new_actor_with_model(
        ActorConfig::new(name),
        Recorder {
            calls: calls.clone(),
        },
    );
    for command in commands {
        if *command == "slow" {
            actor.command(command, |actor, ctx| {
                let calls = actor.model.calls.clone();
                let call = call_of(ctx);
                Reply::pending(async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    calls.record(call);
                })
            });
        } else {
            actor.command_sync(command, |actor, ctx| {
                actor.model.calls.record(call_of(ctx));
                Ok(())
            });
        }
    }
    (actor.start(), calls)
}
