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

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::message::{Arguments, Operation};

/// Shortest interval an item may repeat at.
pub(crate) const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Identity of a scheduled item: the issuing owner and an id chosen by that owner.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct ScheduleKey {
    pub(crate) owner: String,
    pub(crate) sched_id: String,
}

#[derive(Debug)]
struct ScheduledItem {
    interval: Duration,
    /// Fires left; `0` repeats forever.
    remaining: u32,
    /// `None` once the due time lies beyond what the clock can represent.
    next_due: Option<Instant>,
    destination: String,
    operation: Operation,
    args: Arguments,
}

/// A message that has come due and must be delivered.
#[derive(Debug)]
pub(crate) struct DueDelivery {
    pub(crate) destination: String,
    pub(crate) operation: Operation,
    pub(crate) args: Arguments,
}

/// The scheduler's item map, ordered by key.
#[derive(Debug, Default)]
pub(crate) struct ScheduleTable {
    items: BTreeMap<ScheduleKey, ScheduledItem>,
}

impl ScheduleTable {
    /// Inserts or replaces the item under `key`, first due one interval after `now`.
    ///
    /// An interval too long for the clock leaves the item scheduled but never due.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn upsert(
        &mut self,
        key: ScheduleKey,
        interval: Duration,
        count: u32,
        destination: String,
        operation: Operation,
        args: Arguments,
        now: Instant,
    ) {
        let interval = interval.max(MIN_INTERVAL);
        self.items.insert(
            key,
            ScheduledItem {
                interval,
                remaining: count,
                next_due: now.checked_add(interval),
                destination,
                operation,
                args,
            },
        );
    }

    pub(crate) fn remove(&mut self, key: &ScheduleKey) -> bool {
        self.items.remove(key).is_some()
    }

    /// Removes every item issued by `owner`, returning how many there were.
    pub(crate) fn flush_owner(&mut self, owner: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|key, _| key.owner != owner);
        before - self.items.len()
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }

    pub(crate) fn contains(&self, key: &ScheduleKey) -> bool {
        self.items.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// Collects every item due at `now`, advancing or retiring each one.
    ///
    /// A due item fires once per call. Its next due time moves forward by exactly one
    /// interval from the previous due time, so repeated firing does not drift.
    pub(crate) fn take_due(&mut self, now: Instant) -> Vec<DueDelivery> {
        let mut due = Vec::new();
        let mut finished = Vec::new();
        for (key, item) in &mut self.items {
            if !item.next_due.is_some_and(|next_due| next_due <= now) {
                continue;
            }
            due.push(DueDelivery {
                destination: item.destination.clone(),
                operation: item.operation.clone(),
                args: item.args.clone(),
            });
            if item.remaining > 0 {
                item.remaining -= 1;
                if item.remaining == 0 {
                    finished.push(key.clone());
                    continue;
                }
            }
            item.next_due = item
                .next_due
                .and_then(|next_due| next_due.checked_add(item.interval));
        }
        for key in &finished {
            self.items.remove(key);
        }
        due
    }

    /// How long until the earliest item is due, at most `max_idle` and never negative.
    pub(crate) fn next_wake(&self, now: Instant, max_idle: Duration) -> Duration {
        self.items
            .values()
            .filter_map(|item| item.next_due)
            .map(|next_due| next_due.saturating_duration_since(now))
            .min()
            .map_or(max_idle, |earliest| earliest.min(max_idle))
    }
}
