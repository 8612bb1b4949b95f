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

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use derive_new::new;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::instrument;

use crate::actor::ActorConfig;
use crate::common::{ActorHandle, ActorRuntime, Directory, LogGate, Reply, SwitchboardConfig};
use crate::message::{ArgumentError, Arguments, Message, Operation};
use crate::service::{DEL_ITEM, FLUSH_MY_ITEMS, SCHEDULE};

use schedule_table::{DueDelivery, ScheduleKey, ScheduleTable};
use wake_monitor::{run_wake_monitor, WakeSignal};

mod schedule_table;
mod wake_monitor;

/// A timed, repeating send to be registered with the [`Scheduler`].
///
/// ```rust,ignore
/// let request = ScheduleRequest::new("sensor", "poll", "sensor", "read")
///     .every(Duration::from_millis(500))
///     .times(0);
/// runtime.scheduler().schedule(request);
/// ```
#[derive(new, Debug, Clone)]
pub struct ScheduleRequest {
    /// Actor that owns the item; `flush_my_items` and resets act per owner.
    #[new(into)]
    pub owner: String,
    /// Id chosen by the owner. Scheduling the same id again replaces the item.
    #[new(into)]
    pub sched_id: String,
    /// Actor the message goes to.
    #[new(into)]
    pub destination: String,
    /// Operation delivered on every fire.
    #[new(into)]
    pub operation: Operation,
    /// Time between fires, starting from the moment of scheduling.
    #[new(value = "Duration::from_secs(1)")]
    pub interval: Duration,
    /// Number of fires before the item is removed; `0` repeats until cancelled.
    #[new(value = "1")]
    pub count: u32,
    /// Arguments delivered with every fire.
    #[new(default)]
    pub args: Arguments,
}

impl ScheduleRequest {
    /// Sets the interval.
    #[must_use]
    pub const fn every(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the fire count; `0` means forever.
    #[must_use]
    pub const fn times(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Sets the delivered arguments.
    #[must_use]
    pub fn with_args(mut self, args: Arguments) -> Self {
        self.args = args;
        self
    }
}

/// The timer service.
///
/// Holds scheduled items keyed by `(owner, sched_id)` and delivers each one's message to its
/// destination when it comes due. A wake monitor task sleeps until the earliest due time (at
/// most `max_idle_wait_ms`) and then has the scheduler's own worker run the check, so
/// deliveries are serialized with the scheduler's other mailbox work.
///
/// Items can be managed through the direct calls here from any thread, or through the
/// scheduler actor's `schedule`, `del_item` and `flush_my_items` commands.
#[derive(Clone)]
pub struct Scheduler {
    core: Arc<SchedulerCore>,
}

struct SchedulerCore {
    name: String,
    table: Mutex<ScheduleTable>,
    wake: UnboundedSender<WakeSignal>,
    wake_signals: Mutex<Option<UnboundedReceiver<WakeSignal>>>,
    monitor: Mutex<Option<JoinHandle<()>>>,
    directory: Directory,
    gate: LogGate,
    max_idle: Duration,
    handle: OnceLock<ActorHandle>,
}

impl Scheduler {
    pub(crate) fn new(config: &SwitchboardConfig, directory: Directory) -> Self {
        let name = config.scheduler.name.clone();
        let (wake, wake_signals) = mpsc::unbounded_channel();
        Self {
            core: Arc::new(SchedulerCore {
                gate: LogGate::new(&name, config.level_for(&name)),
                name,
                table: Mutex::new(ScheduleTable::default()),
                wake,
                wake_signals: Mutex::new(Some(wake_signals)),
                monitor: Mutex::new(None),
                directory,
                max_idle: config.max_idle_wait(),
                handle: OnceLock::new(),
            }),
        }
    }

    /// Starts the scheduler actor and its wake monitor. Runs once, during launch.
    #[instrument(skip_all, fields(actor = %self.core.name), level = "trace")]
    pub(crate) fn launch(&self, runtime: &ActorRuntime) {
        let Some(signals) = self.core.wake_signals.lock().take() else {
            self.core.gate.warn("scheduler already launched");
            return;
        };

        let config = ActorConfig::new(self.core.name.as_str()).with_log_gate(self.core.gate.clone());
        let mut actor = runtime.new_actor_with_model(config, self.clone());
        actor
            .command_sync(SCHEDULE, |actor, ctx| {
                let request = request_from_args(ctx.args())?;
                actor.model.schedule(request);
                Ok(())
            })
            .command_sync(DEL_ITEM, |actor, ctx| {
                let owner: String = ctx.arg(0)?;
                let sched_id: String = ctx.arg(1)?;
                actor.model.del_item(&owner, &sched_id);
                Ok(())
            })
            .command_sync(FLUSH_MY_ITEMS, |actor, ctx| {
                let owner: String = ctx.arg(0)?;
                let flushed = actor.model.flush_my_items(&owner);
                ctx.reply(flushed);
                Ok(())
            })
            .on_reset(|actor| {
                actor.model.clear();
                Reply::ready()
            });
        let handle = actor.start();
        if self.core.handle.set(handle).is_err() {
            self.core.gate.warn("scheduler handle was already set");
        }

        let checker = self.clone();
        let monitor = runtime.0.tokio.spawn(run_wake_monitor(
            signals,
            self.core.max_idle,
            runtime.0.cancellation_token.clone(),
            move || checker.request_check(),
        ));
        *self.core.monitor.lock() = Some(monitor);
    }

    /// Inserts or replaces the item `(owner, sched_id)`. It first fires one interval from now.
    pub fn schedule(&self, request: ScheduleRequest) {
        let ScheduleRequest {
            owner,
            sched_id,
            destination,
            operation,
            interval,
            count,
            args,
        } = request;
        self.core.gate.debug(format_args!(
            "schedule owner={owner}, sched_id={sched_id}, interval={interval:?}, cnt={count}, dest={destination}, op={operation}"
        ));
        self.core.table.lock().upsert(
            ScheduleKey { owner, sched_id },
            interval,
            count,
            destination,
            operation,
            args,
            Instant::now(),
        );
        self.wake(Duration::ZERO);
    }

    /// Cancels the item `(owner, sched_id)`. Returns whether it existed; cancelling a missing
    /// item does nothing.
    pub fn del_item(&self, owner: &str, sched_id: &str) -> bool {
        let key = ScheduleKey {
            owner: owner.to_string(),
            sched_id: sched_id.to_string(),
        };
        let removed = self.core.table.lock().remove(&key);
        if removed {
            self.core
                .gate
                .debug(format_args!("deleted owner={owner}, sched_id={sched_id}"));
            self.rewake();
        }
        removed
    }

    /// Cancels every item owned by `owner` and returns how many there were.
    pub fn flush_my_items(&self, owner: &str) -> usize {
        let flushed = self.core.table.lock().flush_owner(owner);
        if flushed > 0 {
            self.core
                .gate
                .debug(format_args!("flushed {flushed} item(s) of {owner}"));
            self.rewake();
        }
        flushed
    }

    /// Whether the item `(owner, sched_id)` is still scheduled.
    #[must_use]
    pub fn contains(&self, owner: &str, sched_id: &str) -> bool {
        self.core.table.lock().contains(&ScheduleKey {
            owner: owner.to_string(),
            sched_id: sched_id.to_string(),
        })
    }

    /// Number of scheduled items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.core.table.lock().len()
    }

    /// Whether nothing is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Directory name of the scheduler actor.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Handle of the scheduler actor, once launched.
    #[must_use]
    pub fn handle(&self) -> Option<&ActorHandle> {
        self.core.handle.get()
    }

    /// Stops the wake monitor and waits for it, then stops the scheduler actor.
    ///
    /// # Errors
    ///
    /// Fails if the monitor task panicked or if called from the scheduler's own worker.
    pub async fn stop(&self) -> anyhow::Result<()> {
        if let Some(monitor) = self.shutdown_monitor() {
            monitor.await?;
        }
        match self.handle() {
            Some(handle) => handle.stop().await,
            None => Ok(()),
        }
    }

    /// Tells the wake monitor to leave its loop and hands back its task, if still owned.
    pub(crate) fn shutdown_monitor(&self) -> Option<JoinHandle<()>> {
        // A closed channel means the monitor is already gone.
        let _ = self.core.wake.send(WakeSignal::Shutdown);
        self.core.monitor.lock().take()
    }

    /// Delivers every due item and tells the monitor when to look again.
    pub(crate) fn check(&self) {
        let now = Instant::now();
        let (due, next) = {
            let mut table = self.core.table.lock();
            let due = table.take_due(now);
            (due, table.next_wake(now, self.core.max_idle))
        };
        for DueDelivery {
            destination,
            operation,
            args,
        } in due
        {
            let message = Message::new(self.core.name.as_str(), operation, args);
            self.core.directory.send(&self.core.gate, &destination, message);
        }
        self.wake(next);
    }

    fn clear(&self) {
        self.core.table.lock().clear();
        self.core.gate.debug("all items cleared");
        self.rewake();
    }

    /// Runs [`check`](Self::check) on the scheduler's own worker.
    fn request_check(&self) {
        let Some(mailbox) = self.core.directory.lookup(&self.core.name) else {
            return;
        };
        let scheduler = self.clone();
        let check = Operation::direct(move |_| {
            scheduler.check();
            Ok(())
        });
        if mailbox
            .post(Message::new(self.core.name.as_str(), check, Arguments::new()))
            .is_err()
        {
            self.core.gate.trace("scheduler stopped, check skipped");
        }
    }

    fn rewake(&self) {
        let next = self
            .core
            .table
            .lock()
            .next_wake(Instant::now(), self.core.max_idle);
        self.wake(next);
    }

    fn wake(&self, delay: Duration) {
        if self.core.wake.send(WakeSignal::Delay(delay)).is_err() {
            self.core.gate.trace("wake monitor gone, wake dropped");
        }
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("name", &self.core.name)
            .field("items", &self.core.table.try_lock().map(|table| table.len()))
            .field("max_idle", &self.core.max_idle)
            .finish_non_exhaustive()
    }
}

/// Reads `(owner, sched_id, interval_s, count, dest, op, *args)` from a `schedule` command.
fn request_from_args(args: &Arguments) -> Result<ScheduleRequest, ArgumentError> {
    let owner: String = args.get(0)?;
    let sched_id: String = args.get(1)?;
    let seconds: f64 = args.get(2)?;
    let interval = Duration::try_from_secs_f64(seconds).map_err(|err| ArgumentError::Invalid {
        argument: "2".to_string(),
        reason: err.to_string(),
    })?;
    let count: u32 = args.get(3)?;
    let destination: String = args.get(4)?;
    let operation: String = args.get(5)?;
    Ok(ScheduleRequest::new(owner, sched_id, destination, operation)
        .every(interval)
        .times(count)
        .with_args(args.skip(6)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn schedule_command_arguments() {
        let args = Arguments::new()
            .with("a")
            .with("beat")
            .with(0.5)
            .with(3)
            .with("b")
            .with("ping")
            .with(json!({"n": 1}))
            .with_named("loud", true);
        let request = request_from_args(&args).unwrap();
        assert_eq!(request.owner, "a");
        assert_eq!(request.sched_id, "beat");
        assert_eq!(request.interval, Duration::from_millis(500));
        assert_eq!(request.count, 3);
        assert_eq!(request.destination, "b");
        assert_eq!(request.operation.command_name(), Some("ping"));
        assert_eq!(request.args.positional(), &[json!({"n": 1})]);
        assert!(request.args.named::<bool>("loud").unwrap());
    }

    #[test]
    fn negative_interval_is_rejected() {
        let args = Arguments::from(vec![
            json!("a"),
            json!("beat"),
            json!(-1.0),
            json!(1),
            json!("b"),
            json!("ping"),
        ]);
        assert!(matches!(
            request_from_args(&args),
            Err(ArgumentError::Invalid { .. })
        ));
    }
}
