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

//! A small bench: a test executive `te` reads three simulated channels on schedules and
//! publishes them, and a `display` actor subscribed to each channel shows the values.
//!
//! Run with `cargo run --example test_bench`. Configuration is read from
//! `$XDG_CONFIG_HOME/switchboard/config.toml` if present.

use std::collections::BTreeMap;

use switchboard::config::SwitchboardConfig;
use switchboard::prelude::*;
use tracing::info;

/// Simulated instrument state for the test executive.
#[derive(Debug, Default)]
struct TestExec {
    reading: u64,
}

impl TestExec {
    /// A slowly drifting value around `base`.
    fn sample(&mut self, base: f64) -> f64 {
        self.reading += 1;
        let wobble = (self.reading % 20) as f64 / 10.0;
        ((base + wobble) * 1_000.0).round() / 1_000.0
    }
}

/// What the display last showed per indicator.
#[derive(Debug, Default)]
struct Display {
    indicators: BTreeMap<String, Value>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = SwitchboardConfig::load();
    config.app.name = "Test_Executive".to_string();
    let _guard = init_tracing(&config)?;

    let runtime = SwitchboardApp::launch_with_config(config).await;

    let display = runtime.spawn_actor::<Display>("display", |actor| {
        actor
            .command_sync("set_indicator", |actor, ctx| {
                let name: String = ctx.arg(0)?;
                let value: Value = ctx.arg(1)?;
                info!(indicator = %name, %value, "display updated");
                actor.model.indicators.insert(name, value);
                Ok(())
            })
            .command_sync("on_data", |actor, ctx| {
                // Fan-out arguments are (topic, attributes, data).
                let topic: String = ctx.arg(0)?;
                let data: Value = ctx.arg(2)?;
                let label = ctx
                    .args()
                    .get_opt::<String>(1)?
                    .unwrap_or_else(|| topic.to_lowercase());
                info!(indicator = %label, value = %data, "display updated from {topic}");
                actor.model.indicators.insert(label, data);
                Ok(())
            })
            .before_stop(|actor| {
                info!(indicators = ?actor.model.indicators, "final display");
                Reply::ready()
            });
    });

    let te = runtime.spawn_actor::<TestExec>("te", |actor| {
        actor
            .command("read_1", |actor, _ctx| {
                let value = actor.model.sample(10.0);
                let handle = actor.handle().clone();
                Reply::pending(async move {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    handle.enqueue("display", "set_indicator", Arguments::new().with("data_1").with(value));
                })
            })
            .command_sync("read_2", |actor, _ctx| {
                let value = actor.model.sample(20.0);
                actor
                    .handle()
                    .enqueue("display", "set_indicator", Arguments::new().with("data_2").with(value));
                Ok(())
            })
            .command_sync("read_all", |actor, _ctx| {
                for (topic, base) in [("DATA_1", 10.0), ("DATA_2", 20.0), ("DATA_3", 30.0)] {
                    let value = actor.model.sample(base);
                    actor.handle().publish(topic, value);
                }
                Ok(())
            });
    });

    for topic in ["DATA_1", "DATA_2", "DATA_3"] {
        display.subscribe(topic, "on_data", None);
    }
    runtime.update_log_levels(&BTreeMap::from([
        ("display".to_string(), "debug".to_string()),
        ("te".to_string(), "debug".to_string()),
    ]));

    te.sched_local("read_1", Duration::from_millis(500), 0, "read_1", Arguments::new());
    te.sched_local("read_2", Duration::from_millis(750), 4, "read_2", Arguments::new());
    te.sched_local("read_all", Duration::from_secs(1), 0, "read_all", Arguments::new());

    tokio::time::sleep(Duration::from_secs(5)).await;
    info!(
        last = ?te.get_data("DATA_3"),
        scheduled = runtime.scheduler().len(),
        "bench finished"
    );

    runtime.exit().await;
    Ok(())
}
