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

use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;
use std::panic::{catch_unwind, AssertUnwindSafe};

use futures::FutureExt;
use serde_json::Value;
use tracing::instrument;

use crate::actor::builtin::{self, EXIT, RESET, SET_LOG_LEVEL};
use crate::actor::{ActorStatus, ManagedActor};
use crate::common::{CommandTable, FutureBox, LogGate};
use crate::message::{DispatchError, Envelope, Message, MessageContext, Operation, SystemSignal};

/// Type-state marker for a [`ManagedActor`] whose worker owns it.
///
/// Command handlers and lifecycle hooks receive the actor in this state. It exposes the
/// model, the actor's handle (for sending, scheduling and publishing) and the values
/// delivered to it with `send_data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Started;

impl<Model: Send + Debug + 'static> ManagedActor<Started, Model> {
    /// The last value received for `topic` through `receive_data`.
    #[must_use]
    pub fn received_data(&self, topic: &str) -> Option<&Value> {
        self.received_data.get(topic)
    }

    /// Everything received through `receive_data`, keyed by topic.
    #[must_use]
    pub const fn received(&self) -> &HashMap<String, Value> {
        &self.received_data
    }

    /// Ends the dispatch loop once the current message has been handled.
    pub fn request_exit(&mut self) {
        self.halt_requested = true;
    }

    #[instrument(skip_all, fields(actor = self.name()), level = "trace")]
    pub(crate) async fn wake(mut self, commands: CommandTable<Model>) {
        let gate = self.handle.log_gate.clone();
        let cancel = self.runtime.0.cancellation_token.clone();
        gate.debug("task monitor running");

        let after_start = self.after_start.as_ref().map(|hook| guarded(|| hook(&self)));
        if let Some(outcome) = after_start {
            report_hook(&gate, "after_start", outcome).await;
        }

        loop {
            let incoming = tokio::select! {
                () = cancel.cancelled() => {
                    gate.warn("worker cancelled before its mailbox was drained");
                    break;
                }
                incoming = self.inbox.recv() => incoming,
            };
            match incoming {
                Some(Envelope::Message(message)) => self.dispatch(&commands, message).await,
                Some(Envelope::Signal(SystemSignal::Terminate)) | None => break,
            }
            if self.halt_requested {
                break;
            }
        }

        self.handle.status.set(ActorStatus::Stopping);
        let cancelled = self.runtime.scheduler().flush_my_items(self.name());
        if cancelled > 0 {
            gate.debug(format_args!("cancelled {cancelled} scheduled item(s) on stop"));
        }
        let before_stop = self.before_stop.as_ref().map(|hook| guarded(|| hook(&self)));
        if let Some(outcome) = before_stop {
            report_hook(&gate, "before_stop", outcome).await;
        }
        self.inbox.close();
        let after_stop = self.after_stop.as_ref().map(|hook| guarded(|| hook(&self)));
        if let Some(outcome) = after_stop {
            report_hook(&gate, "after_stop", outcome).await;
        }
        self.handle.status.set(ActorStatus::Stopped);
        gate.debug("task monitor stopped");
    }

    async fn dispatch(&mut self, commands: &CommandTable<Model>, message: Message) {
        let Message {
            operation,
            args,
            reply_to,
            sender,
            enqueued_at,
        } = message;
        let mut ctx = MessageContext {
            operation: operation.to_string(),
            args,
            reply_to,
            sender,
            enqueued_at,
        };
        self.handle.log_gate.trace(format_args!(
            "dequeue op={} from={} {:?}",
            ctx.operation, ctx.sender, ctx.args
        ));

        let outcome = match operation {
            Operation::Direct(callable) => match guarded(|| callable(&mut ctx)) {
                Ok(result) => result.map_err(DispatchError::Failed),
                Err(panicked) => Err(panicked),
            },
            Operation::Command(name) => self.run_command(commands, &name, &mut ctx).await,
        };

        if let Err(error) = outcome {
            self.handle.log_gate.error(format_args!(
                "{error}; message op={} from={} {:?}",
                ctx.operation, ctx.sender, ctx.args
            ));
        }
    }

    async fn run_command(
        &mut self,
        commands: &CommandTable<Model>,
        name: &str,
        ctx: &mut MessageContext,
    ) -> Result<(), DispatchError> {
        match name {
            RESET => {
                self.reset().await;
                return Ok(());
            }
            EXIT => {
                self.handle.log_gate.info("exiting");
                self.halt_requested = true;
                return Ok(());
            }
            SET_LOG_LEVEL => {
                let level = builtin::level_argument(ctx)?;
                self.handle.log_gate.set_level(level);
                return Ok(());
            }
            _ => {}
        }

        let Some(handler) = commands.get(name) else {
            return Err(DispatchError::UnknownCommand {
                actor: self.name().to_string(),
                command: name.to_string(),
            });
        };
        let future = guarded(|| handler(self, ctx))?;
        settle(future).await
    }

    /// Built-in reset: cancel this actor's timers, drop pending work, then run `on_reset`.
    async fn reset(&mut self) {
        let gate = self.handle.log_gate.clone();
        let cancelled = self.runtime.scheduler().flush_my_items(self.name());

        let mut discarded = 0_usize;
        while let Ok(envelope) = self.inbox.try_recv() {
            match envelope {
                Envelope::Message(_) => discarded += 1,
                Envelope::Signal(SystemSignal::Terminate) => self.halt_requested = true,
            }
        }
        gate.debug(format_args!(
            "reset: cancelled {cancelled} scheduled item(s), discarded {discarded} pending message(s)"
        ));

        if let Some(hook) = self.on_reset.take() {
            let outcome = guarded(|| hook(self));
            self.on_reset = Some(hook);
            report_hook(&gate, "on_reset", outcome).await;
        }
    }
}

/// Runs the synchronous part of a handler, converting a panic into an error.
fn guarded<T>(call: impl FnOnce() -> T) -> Result<T, DispatchError> {
    catch_unwind(AssertUnwindSafe(call)).map_err(|panic| DispatchError::Panicked(panic_message(&*panic)))
}

/// Drives a handler's future, converting a panic into an error.
async fn settle(future: FutureBox) -> Result<(), DispatchError> {
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result.map_err(DispatchError::Failed),
        Err(panic) => Err(DispatchError::Panicked(panic_message(&*panic))),
    }
}

async fn report_hook(gate: &LogGate, hook: &str, outcome: Result<FutureBox, DispatchError>) {
    let outcome = match outcome {
        Ok(future) => settle(future).await,
        Err(panicked) => Err(panicked),
    };
    if let Err(error) = outcome {
        gate.error(format_args!("{hook} hook: {error}"));
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
