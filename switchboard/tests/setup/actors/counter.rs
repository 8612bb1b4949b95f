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

use anyhow::anyhow;
use switchboard::prelude::*;

/// A number that can be added to, read, failed on and panicked in.
#[derive(Debug, Default)]
pub struct Counter {
    pub count: i64,
}

/// Starts a counter named `name`.
///
/// * `add(n)` adds `n` and replies with the new total.
/// * `get()` replies with the total.
/// * `fail()` returns an error, `boom()` panics.
/// * `silent()` never replies.
pub fn spawn_counter(runtime: &ActorRuntime, name: &str) -> ActorHandle {
    runtime.spawn_actor::<Counter>(name, |actor| {
        actor
            .command_sync("add", |actor, ctx| {
                actor.model.count += ctx.arg::<i64>(0)?;
                ctx.reply(actor.model.count);
                Ok(())
            })
            .command_sync("get", |actor, ctx| {
                ctx.reply(actor.model.count);
                Ok(())
            })
            .command("fail", |_actor, _ctx| Reply::fail(anyhow!("counter refused")))
            .command("boom", |_actor, _ctx| panic!("counter exploded"))
            .command("silent", |_actor, _ctx| Reply::ready())
            .on_reset(|actor| {
                actor.model.count = 0;
                Reply::ready()
            });
    })
}
