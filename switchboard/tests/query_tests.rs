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

use std::time::Instant;

use switchboard::prelude::*;
use switchboard_test::prelude::*;

use crate::setup::*;
use crate::setup::actors::*;

mod setup;

#[switchboard_test(timeout_secs = 10)]
async fn test_query_returns_the_reply() -> anyhow::Result<()> {
    let runtime = launch().await;
    let _counter = spawn_counter(&runtime, "counter");

    let total = runtime
        .query("counter", "add", Duration::from_secs(1), Arguments::new().with(3))
        .await?;
    assert_eq!(total, json!(3));
    let total = runtime
        .query("counter", "add", Duration::from_secs(1), Arguments::new().with(4))
        .await?;
    assert_eq!(total, json!(7));

    runtime.exit().await;
    Ok(())
}

#[switchboard_test(timeout_secs = 10)]
async fn test_query_to_missing_destination_fails_at_once() -> anyhow::Result<()> {
    let runtime = launch().await;

    let started = Instant::now();
    let result = runtime
        .query("nobody", "get", Duration::from_secs(3), Arguments::new())
        .await;

    assert!(started.elapsed() < Duration::from_secs(1));
    let error = result.unwrap_err();
    assert_eq!(error, QueryError::DestinationNotFound("nobody".to_string()));
    assert_eq!(error.status(), -1);

    runtime.exit().await;
    Ok(())
}

#[switchboard_test(timeout_secs = 10)]
async fn test_query_without_reply_waits_out_the_timeout() -> anyhow::Result<()> {
    let runtime = launch().await;
    let _counter = spawn_counter(&runtime, "counter");
    let timeout = Duration::from_millis(300);

    for operation in ["silent", "no_such_command"] {
        let started = Instant::now();
        let result = runtime
            .query("counter", operation, timeout, Arguments::new())
            .await;
        assert!(started.elapsed() >= timeout, "{operation} returned early");
        assert_eq!(result, Err(QueryError::Timeout(timeout)));
    }

    runtime.exit().await;
    Ok(())
}

#[switchboard_test(timeout_secs = 10)]
async fn test_direct_operation_answers_a_query() -> anyhow::Result<()> {
    let runtime = launch().await;
    let _counter = spawn_counter(&runtime, "counter");

    let double = Operation::direct(|ctx| {
        let value = ctx.arg::<i64>(0)?;
        ctx.reply(value * 2);
        Ok(())
    });
    let started = Instant::now();
    let answer = runtime
        .query("counter", double, Duration::from_secs(3), Arguments::new().with(21))
        .await?;

    assert_eq!(answer, json!(42));
    assert!(started.elapsed() < Duration::from_secs(1));

    runtime.exit().await;
    Ok(())
}

#[switchboard_test(timeout_secs = 10)]
async fn test_query_to_stopped_actor_fails() -> anyhow::Result<()> {
    let runtime = launch().await;
    let counter = spawn_counter(&runtime, "counter");
    counter.stop().await?;

    let result = runtime
        .query("counter", "get", Duration::from_secs(3), Arguments::new())
        .await;
    assert_eq!(result, Err(QueryError::MailboxClosed("counter".to_string())));

    runtime.exit().await;
    Ok(())
}

#[switchboard_test(timeout_secs = 10)]
async fn test_late_reply_is_tolerated() -> anyhow::Result<()> {
    let runtime = launch().await;
    let delivered: Probe<bool> = Probe::new();

    let probe = delivered.clone();
    runtime.spawn_actor::<Counter>("sluggish", move |actor| {
        actor.command("answer", move |_actor, ctx| {
            let reply = ctx.take_reply();
            let probe = probe.clone();
            Reply::pending(async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                if let Some(reply) = reply {
                    probe.record(reply.send(42));
                }
            })
        });
    });

    let result = runtime
        .query("sluggish", "answer", Duration::from_millis(50), Arguments::new())
        .await;
    assert!(matches!(result, Err(QueryError::Timeout(_))));

    assert!(wait_for(Duration::from_secs(2), || delivered.len() == 1).await);
    assert_eq!(delivered.values(), vec![false]);

    let answer = runtime
        .query("sluggish", "answer", Duration::from_secs(2), Arguments::new())
        .await?;
    assert_eq!(answer, json!(42));

    runtime.exit().await;
    Ok(())
}

#[switchboard_test(timeout_secs = 10)]
async fn test_handler_can_query_another_actor() -> anyhow::Result<()> {
    let runtime = launch().await;
    let _counter = spawn_counter(&runtime, "counter");
    let (_display, shown) = spawn_recorder(&runtime, "display", &["show"]);

    runtime.spawn_actor::<Counter>("relay", |actor| {
        actor.command("forward", |actor, ctx| {
            let handle = actor.handle().clone();
            let args = ctx.args().clone();
            Reply::try_pending(async move {
                let total = handle
                    .query("counter", "add", Duration::from_secs(1), args)
                    .await?;
                handle.enqueue("display", "show", Arguments::new().with(total));
                Ok(())
            })
        });
    });

    runtime.enqueue("relay", "forward", Arguments::new().with(10));

    assert!(wait_for(Duration::from_secs(2), || shown.len() == 1).await);
    assert_eq!(shown.values()[0].args, vec![json!(10)]);
    assert_eq!(shown.values()[0].sender, "relay");

    runtime.exit().await;
    Ok(())
}
