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

use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Instruction for the wake monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WakeSignal {
    /// Sleep this long before the next check.
    Delay(Duration),
    /// Leave the loop.
    Shutdown,
}

/// Sleeps until the next item may be due, then asks for a check.
///
/// A [`WakeSignal::Delay`] arriving during the wait replaces the current delay and restarts
/// the wait. When the wait runs out the delay falls back to `max_idle` and `on_elapsed` runs;
/// the check it triggers is expected to push the real next delay. [`WakeSignal::Shutdown`], a
/// closed channel or `cancel` end the loop.
pub(crate) async fn run_wake_monitor<F>(
    mut signals: UnboundedReceiver<WakeSignal>,
    max_idle: Duration,
    cancel: CancellationToken,
    on_elapsed: F,
) where
    F: Fn() + Send + 'static,
{
    let mut delay = Duration::ZERO;
    loop {
        let received = tokio::select! {
            () = cancel.cancelled() => break,
            received = tokio::time::timeout(delay, signals.recv()) => received,
        };
        match received {
            Ok(Some(WakeSignal::Delay(next))) => delay = next,
            Ok(Some(WakeSignal::Shutdown) | None) => break,
            Err(_elapsed) => {
                delay = max_idle;
                on_elapsed();
            }
        }
    }
    trace!("wake monitor stopped");
}
