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

#[switchboard_test(timeout_secs = 15)]
async fn test_counted_item_fires_count_times_then_disappears() -> anyhow::Result<()> {
    let runtime = launch().await;
    let (_b, pings) = spawn_recorder(&runtime, "b", &["ping"]);
    let (a, _) = spawn_recorder(&runtime, "a", &[]);

    let scheduled_at = Instant::now();
    a.sched("beat", Duration::from_secs(1), 3, "b", "ping", Arguments::new().with("beat"));
    assert!(runtime.scheduler().contains("a", "beat"));

    tokio::time::sleep(Duration::from_millis(3_600)).await;
    assert_eq!(pings.len(), 3);
    assert!(!runtime.scheduler().contains("a", "beat"));

    let mut previous = scheduled_at;
    for arrived in pings.instants() {
        let gap = arrived.duration_since(previous);
        assert!(
            gap >= Duration::from_millis(900) && gap <= Duration::from_millis(1_500),
            "fires should be about a second apart, got {gap:?}"
        );
        previous = arrived;
    }
    for call in pings.values() {
        assert_eq!(call.sender, "sched");
        assert_eq!(call.args, vec![json!("beat")]);
    }

    tokio::time::sleep(Duration::from_millis(1_200)).await;
    assert_eq!(pings.len(), 3);

    runtime.exit().await;
    Ok(())
}

#[switchboard_test(timeout_secs = 10)]
async fn test_unbounded_item_repeats_until_cancelled() -> anyhow::Result<()> {
    let runtime = launch().await;
    let (b, pings) = spawn_recorder(&runtime, "b", &["ping"]);

    b.sched_local("poll", Duration::from_millis(50), 0, "ping", Arguments::new());
    assert!(wait_for(Duration::from_secs(3), || pings.len() >= 5).await);

    b.sched_del_item("poll");
    assert!(!runtime.scheduler().contains("b", "poll"));
    tokio::time::sleep(Duration::from_millis(100)).await;
    let settled = pings.len();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(pings.len(), settled);

    runtime.exit().await;
    Ok(())
}

#[switchboard_test(timeout_secs = 10)]
async fn test_cancellation_is_idempotent() -> anyhow::Result<()> {
    let runtime = launch().await;
    let scheduler = runtime.scheduler();

    assert!(!scheduler.del_item("a", "nothing"));
    assert_eq!(scheduler.flush_my_items("nobody"), 0);

    for id in ["one", "two"] {
        scheduler.schedule(
            ScheduleRequest::new("a", id, "b", "ping")
                .every(Duration::from_secs(60))
                .times(0),
        );
    }
    scheduler.schedule(ScheduleRequest::new("c", "one", "b", "ping").every(Duration::from_secs(60)));
    assert_eq!(scheduler.len(), 3);

    assert!(scheduler.del_item("c", "one"));
    assert!(!scheduler.del_item("c", "one"));
    assert_eq!(scheduler.flush_my_items("a"), 2);
    assert_eq!(scheduler.flush_my_items("a"), 0);
    assert!(scheduler.is_empty());

    runtime.exit().await;
    Ok(())
}

#[switchboard_test(timeout_secs = 10)]
async fn test_rescheduling_an_id_replaces_the_item() -> anyhow::Result<()> {
    let runtime = launch().await;
    let (b, pings) = spawn_recorder(&runtime, "b", &["ping"]);

    b.sched_local("x", Duration::from_secs(60), 1, "ping", Arguments::new().with("old"));
    b.sched_local("x", Duration::from_millis(50), 2, "ping", Arguments::new().with("new"));
    assert_eq!(runtime.scheduler().len(), 1);

    assert!(wait_for(Duration::from_secs(2), || pings.len() == 2).await);
    assert!(pings.values().iter().all(|call| call.args == vec![json!("new")]));
    assert!(wait_for(Duration::from_secs(1), || runtime.scheduler().is_empty()).await);

    runtime.exit().await;
    Ok(())
}

#[switchboard_test(timeout_secs = 10)]
async fn test_new_item_wakes_the_monitor_early() -> anyhow::Result<()> {
    let runtime = launch().await;
    let (b, pings) = spawn_recorder(&runtime, "b", &["ping", "pong"]);

    b.sched_local("slow", Duration::from_secs(60), 0, "pong", Arguments::new());
    // Let the monitor settle into its long idle wait.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let scheduled_at = Instant::now();
    b.sched_local("fast", Duration::from_millis(100), 1, "ping", Arguments::new());

    assert!(wait_for(Duration::from_secs(2), || pings.len() == 1).await);
    assert!(scheduled_at.elapsed() < Duration::from_secs(1));
    assert_eq!(pings.values()[0].operation, "ping");

    runtime.exit().await;
    Ok(())
}

#[switchboard_test(timeout_secs = 10)]
async fn test_huge_intervals_are_accepted_and_never_fire() -> anyhow::Result<()> {
    let runtime = launch().await;
    let (b, pings) = spawn_recorder(&runtime, "b", &["ping"]);
    let scheduler = runtime.scheduler();

    scheduler.schedule(
        ScheduleRequest::new("a", "never", "b", "ping")
            .every(Duration::MAX)
            .times(0),
    );
    runtime.enqueue(
        "sched",
        SCHEDULE,
        Arguments::from(vec![
            json!("a"),
            json!("someday"),
            json!(1.5e19),
            json!(0),
            json!("b"),
            json!("ping"),
        ]),
    );
    b.sched_local("soon", Duration::from_millis(50), 1, "ping", Arguments::new());

    assert!(wait_for(Duration::from_secs(2), || pings.len() == 1).await);
    assert!(wait_for(Duration::from_secs(1), || scheduler.contains("a", "someday")).await);
    assert!(scheduler.contains("a", "never"));
    assert!(scheduler.handle().is_some_and(ActorHandle::is_running));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(pings.len(), 1);

    runtime.exit().await;
    Ok(())
}

#[switchboard_test(timeout_secs = 10)]
async fn test_scheduler_mailbox_commands() -> anyhow::Result<()> {
    let runtime = launch().await;
    let (_b, pings) = spawn_recorder(&runtime, "b", &["ping"]);

    runtime.enqueue(
        "sched",
        SCHEDULE,
        Arguments::from(vec![
            json!("a"),
            json!("beat"),
            json!(0.05),
            json!(2),
            json!("b"),
            json!("ping"),
            json!("extra"),
        ]),
    );
    assert!(wait_for(Duration::from_secs(2), || pings.len() == 2).await);
    assert_eq!(pings.values()[0].args, vec![json!("extra")]);

    runtime.enqueue(
        "sched",
        SCHEDULE,
        Arguments::from(vec![
            json!("a"),
            json!("forever"),
            json!(60),
            json!(0),
            json!("b"),
            json!("ping"),
        ]),
    );
    runtime.enqueue("sched", DEL_ITEM, Arguments::new().with("a").with("nothing"));
    let flushed = runtime
        .query("sched", FLUSH_MY_ITEMS, Duration::from_secs(1), Arguments::new().with("a"))
        .await?;
    assert_eq!(flushed, json!(1));
    assert!(runtime.scheduler().is_empty());

    runtime.exit().await;
    Ok(())
}

#[switchboard_test(timeout_secs = 10)]
async fn test_scheduler_reset_clears_every_item() -> anyhow::Result<()> {
    let runtime = launch().await;
    let (a, _) = spawn_recorder(&runtime, "a", &[]);
    let (b, _) = spawn_recorder(&runtime, "b", &[]);

    a.sched_local("one", Duration::from_secs(60), 0, "ping", Arguments::new());
    b.sched_local("two", Duration::from_secs(60), 0, "ping", Arguments::new());
    assert_eq!(runtime.scheduler().len(), 2);

    runtime.enqueue("sched", RESET, Arguments::new());
    assert!(wait_for(Duration::from_secs(2), || runtime.scheduler().is_empty()).await);
    assert!(runtime.scheduler().handle().is_some_and(ActorHandle::is_running));

    runtime.exit().await;
    Ok(())
}

#[switchboard_test(timeout_secs = 10)]
async fn test_scheduler_stop_ends_delivery() -> anyhow::Result<()> {
    let runtime = launch().await;
    let (b, pings) = spawn_recorder(&runtime, "b", &["ping"]);

    runtime.scheduler().stop().await?;
    assert_eq!(
        runtime.scheduler().handle().map(ActorHandle::status),
        Some(ActorStatus::Stopped)
    );

    b.sched_local("late", Duration::from_millis(20), 1, "ping", Arguments::new());
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(pings.is_empty());

    runtime.exit().await;
    Ok(())
}
