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
use std::sync::Arc;

use switchboard::prelude::*;
use switchboard_test::prelude::*;

use crate::setup::*;
use crate::setup::actors::*;

mod setup;

#[switchboard_test(timeout_secs = 10)]
async fn test_mailbox_is_fifo_per_producer() -> anyhow::Result<()> {
    let runtime = launch().await;
    let (_recorder, calls) = spawn_recorder(&runtime, "b", &["ping"]);

    let producers: Vec<_> = (0..4)
        .map(|producer| {
            let sender = runtime.new_actor::<Counter>(&format!("producer_{producer}")).defer();
            tokio::spawn(async move {
                for seq in 0..100 {
                    sender.enqueue("b", "ping", Arguments::new().with(producer).with(seq));
                }
            })
        })
        .collect();
    for producer in producers {
        producer.await?;
    }

    assert!(wait_for(Duration::from_secs(5), || calls.len() == 400).await);
    let mut last_seen: HashMap<i64, i64> = HashMap::new();
    for call in calls.values() {
        let producer = call.args[0].as_i64().unwrap();
        let seq = call.args[1].as_i64().unwrap();
        let previous = last_seen.insert(producer, seq);
        assert_eq!(previous.map_or(0, |p| p + 1), seq, "producer {producer} out of order");
        assert_eq!(call.sender, format!("producer_{producer}"));
    }

    runtime.exit().await;
    Ok(())
}

#[switchboard_test(timeout_secs = 10)]
async fn test_slow_handler_keeps_mailbox_order() -> anyhow::Result<()> {
    let runtime = launch().await;
    let (recorder, calls) = spawn_recorder(&runtime, "b", &["slow", "ping"]);

    recorder.enqueue_local("slow", Arguments::new().with(1));
    recorder.enqueue_local("ping", Arguments::new().with(2));

    assert!(wait_for(Duration::from_secs(2), || calls.len() == 2).await);
    let operations: Vec<_> = calls.values().into_iter().map(|c| c.operation).collect();
    assert_eq!(operations, vec!["slow", "ping"]);

    runtime.exit().await;
    Ok(())
}

#[switchboard_test(timeout_secs = 10)]
async fn test_unknown_command_is_dropped() -> anyhow::Result<()> {
    let runtime = launch().await;
    let (recorder, calls) = spawn_recorder(&runtime, "b", &["ping"]);

    runtime.enqueue("b", "pnig", Arguments::new());
    runtime.enqueue("b", "ping", Arguments::new());

    assert!(wait_for(Duration::from_secs(2), || calls.len() == 1).await);
    assert_eq!(calls.values()[0].operation, "ping");
    assert_eq!(calls.values()[0].sender, "runtime");
    assert!(recorder.is_running());

    runtime.exit().await;
    Ok(())
}

#[switchboard_test(timeout_secs = 10)]
async fn test_failures_and_panics_do_not_stop_the_actor() -> anyhow::Result<()> {
    let runtime = launch().await;
    let counter = spawn_counter(&runtime, "counter");

    runtime.enqueue("counter", "fail", Arguments::new());
    runtime.enqueue("counter", "boom", Arguments::new());
    runtime.enqueue("counter", "add", Arguments::new().with("not a number"));
    runtime.enqueue("counter", "add", Arguments::new().with(5));

    let total = runtime
        .query("counter", "get", Duration::from_secs(1), Arguments::new())
        .await?;
    assert_eq!(total, json!(5));
    assert_eq!(counter.status(), ActorStatus::Running);

    runtime.exit().await;
    Ok(())
}

#[switchboard_test(timeout_secs = 10)]
async fn test_missing_destination_is_silent() -> anyhow::Result<()> {
    let runtime = launch().await;
    let (recorder, calls) = spawn_recorder(&runtime, "b", &["ping"]);

    recorder.enqueue("nobody", "ping", Arguments::new());
    recorder.send_data("nobody", "TEMP", 21.5);
    recorder.enqueue_local("ping", Arguments::new());

    assert!(wait_for(Duration::from_secs(2), || calls.len() == 1).await);
    assert!(!runtime.directory().contains("nobody"));

    runtime.exit().await;
    Ok(())
}

#[switchboard_test(timeout_secs = 10)]
async fn test_send_data_is_stored_by_the_receiver() -> anyhow::Result<()> {
    let runtime = launch().await;
    runtime.spawn_actor::<Recorder>("display", |actor| {
        actor.command_sync("show", |actor, ctx| {
            let topic: String = ctx.arg(0)?;
            let value = actor.received_data(&topic).cloned().unwrap_or(Value::Null);
            ctx.reply(value);
            Ok(())
        });
    });
    let (sensor, _) = spawn_recorder(&runtime, "sensor", &[]);

    sensor.send_data("display", "TEMP", 21.5);
    sensor.send_data("display", "HUMIDITY", json!({"rel": 40}));
    let temp = sensor
        .query("display", "show", Duration::from_secs(1), Arguments::new().with("TEMP"))
        .await?;
    assert_eq!(temp, json!(21.5));

    runtime.enqueue("display", FLUSH_RECEIVED_DATA, Arguments::new().with("TEMP"));
    let temp = runtime
        .query("display", "show", Duration::from_secs(1), Arguments::new().with("TEMP"))
        .await?;
    assert_eq!(temp, Value::Null);
    let humidity = runtime
        .query("display", "show", Duration::from_secs(1), Arguments::new().with("HUMIDITY"))
        .await?;
    assert_eq!(humidity, json!({"rel": 40}));

    runtime.exit().await;
    Ok(())
}

#[switchboard_test(timeout_secs = 10)]
async fn test_direct_operation_runs_on_the_recipient() -> anyhow::Result<()> {
    let runtime = launch().await;
    let (_recorder, calls) = spawn_recorder(&runtime, "b", &["ping"]);
    let seen: Probe<i64> = Probe::new();

    let probe = seen.clone();
    let record = Operation::direct(move |ctx| {
        probe.record(ctx.arg::<i64>(0)?);
        Ok(())
    });
    runtime.enqueue("b", record.clone(), Arguments::new().with(7));
    runtime.enqueue("b", Operation::direct(|_| anyhow::bail!("direct failure")), Arguments::new());
    runtime.enqueue("b", record, Arguments::new().with(8));
    runtime.enqueue("b", "ping", Arguments::new());

    assert!(wait_for(Duration::from_secs(2), || calls.len() == 1).await);
    assert_eq!(seen.values(), vec![7, 8]);

    runtime.exit().await;
    Ok(())
}

#[switchboard_test(timeout_secs = 10)]
async fn test_handlers_can_message_other_actors() -> anyhow::Result<()> {
    let runtime = launch().await;
    let (_recorder, calls) = spawn_recorder(&runtime, "b", &["pong"]);
    let hops = Arc::new(std::sync::atomic::AtomicUsize::new(0));

    let counted = hops.clone();
    runtime.spawn_actor::<Counter>("a", move |actor| {
        actor.command_sync("ping", move |actor, ctx| {
            counted.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            actor.handle().enqueue("b", "pong", ctx.args().clone());
            Ok(())
        });
    });

    runtime.enqueue("a", "ping", Arguments::new().with("hello"));

    assert!(wait_for(Duration::from_secs(2), || calls.len() == 1).await);
    let call = &calls.values()[0];
    assert_eq!(call.sender, "a");
    assert_eq!(call.args, vec![json!("hello")]);
    assert_eq!(hops.load(std::sync::atomic::Ordering::SeqCst), 1);

    runtime.exit().await;
    Ok(())
}
