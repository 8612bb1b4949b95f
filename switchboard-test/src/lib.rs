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

//! Testing utilities for Switchboard actors.
//!
//! * [`switchboard_test`](prelude::switchboard_test) turns an `async fn` into a `#[test]`
//!   running on a fresh multi-threaded Tokio runtime.
//! * [`Probe`] is a cloneable, thread-safe log that actors write observations into
//!   and tests read back.
//! * [`wait_for`] polls a condition until it holds or a deadline passes, which is how
//!   assertions about asynchronous mailbox delivery are written.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Common imports for test modules.
pub mod prelude {
    pub use switchboard_test_macro::switchboard_test;

    pub use crate::{wait_for, Probe, TestOutcome};
}

#[doc(hidden)]
pub mod __private {
    pub use tokio;
    pub use tracing;
}

/// Converts the return value of a test body into pass or fail.
pub trait TestOutcome {
    /// Panics if the outcome represents a failure.
    fn finish(self);
}

impl TestOutcome for () {
    fn finish(self) {}
}

impl<E: Debug> TestOutcome for Result<(), E> {
    fn finish(self) {
        if let Err(err) = self {
            panic!("test returned an error: {err:?}");
        }
    }
}

/// A shared, append-only record of observations.
#[derive(Debug)]
pub struct Probe<T> {
    entries: Arc<Mutex<Vec<(Instant, T)>>>,
}

impl<T> Clone for Probe<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T> Default for Probe<T> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone> Probe<T> {
    /// Creates an empty probe.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an observation stamped with the current instant.
    pub fn record(&self, value: T) {
        self.entries.lock().push((Instant::now(), value));
    }

    /// Number of observations so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// The recorded values in arrival order.
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        self.entries.lock().iter().map(|(_, v)| v.clone()).collect()
    }

    /// The arrival instants in order.
    #[must_use]
    pub fn instants(&self) -> Vec<Instant> {
        self.entries.lock().iter().map(|(at, _)| *at).collect()
    }
}

/// Polls `condition` every 10 ms until it returns `true` or `timeout` elapses.
///
/// Returns whether the condition was met.
pub async fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
