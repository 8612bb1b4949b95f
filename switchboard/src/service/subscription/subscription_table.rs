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

use indexmap::IndexMap;
use serde_json::Value;

use crate::message::Operation;

/// Where one subscriber wants a topic's data delivered.
#[derive(Debug, Clone)]
pub(crate) struct Subscription {
    pub(crate) destination: String,
    pub(crate) operation: Operation,
    pub(crate) attributes: Value,
}

/// A fan-out message produced by a publish.
#[derive(Debug)]
pub(crate) struct Notification {
    pub(crate) destination: String,
    pub(crate) operation: Operation,
    pub(crate) attributes: Value,
}

/// Published values and subscriptions of the bus.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionTable {
    published: HashMap<String, Value>,
    /// Topic to subscriber id to subscription. Fan-out follows the order subscriptions were
    /// first added; replacing an id keeps its place.
    subscriptions: HashMap<String, IndexMap<String, Subscription>>,
    /// Per base id, how many ids have been derived from it so far.
    id_counters: HashMap<String, u32>,
}

impl SubscriptionTable {
    /// Stores `data` as the latest value of `topic` and lists everyone to notify.
    pub(crate) fn publish(&mut self, topic: &str, data: Value) -> Vec<Notification> {
        self.published.insert(topic.to_string(), data);
        self.subscriptions
            .get(topic)
            .map(|subscribers| {
                subscribers
                    .values()
                    .map(|subscription| Notification {
                        destination: subscription.destination.clone(),
                        operation: subscription.operation.clone(),
                        attributes: subscription.attributes.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Stores a subscription and returns its id.
    ///
    /// Without an explicit id the destination name is used, suffixed `_1`, `_2`, ... when it
    /// has been used before. An explicit id replaces whatever is stored under it.
    pub(crate) fn add(
        &mut self,
        topic: &str,
        subscription: Subscription,
        subs_id: Option<&str>,
    ) -> String {
        let subs_id = match subs_id {
            Some(id) => id.to_string(),
            None => self.derive_id(&subscription.destination),
        };
        self.subscriptions
            .entry(topic.to_string())
            .or_default()
            .insert(subs_id.clone(), subscription);
        subs_id
    }

    fn derive_id(&mut self, base: &str) -> String {
        match self.id_counters.get_mut(base) {
            Some(count) => {
                let id = format!("{base}_{count}");
                *count += 1;
                id
            }
            None => {
                self.id_counters.insert(base.to_string(), 1);
                base.to_string()
            }
        }
    }

    pub(crate) fn remove(&mut self, topic: &str, subs_id: &str) -> bool {
        let Some(subscribers) = self.subscriptions.get_mut(topic) else {
            return false;
        };
        let removed = subscribers.shift_remove(subs_id).is_some();
        if subscribers.is_empty() {
            self.subscriptions.remove(topic);
        }
        removed
    }

    pub(crate) fn get(&self, topic: &str) -> Option<&Value> {
        self.published.get(topic)
    }

    pub(crate) fn subscriber_ids(&self, topic: &str) -> Vec<String> {
        self.subscriptions
            .get(topic)
            .map(|subscribers| subscribers.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Forgets every published value and subscription. Derived id counters are kept, so ids
    /// handed out before the clear are never reused.
    pub(crate) fn clear(&mut self) {
        self.published.clear();
        self.subscriptions.clear();
    }
}
