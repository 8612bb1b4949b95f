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

use parking_lot::Mutex;
use serde_json::Value;
use tracing::instrument;

use crate::actor::ActorConfig;
use crate::common::{ActorHandle, ActorRuntime, Directory, LogGate, Reply, SwitchboardConfig};
use crate::message::{Arguments, Message, Operation};
use crate::service::{ADD_SUBSCRIPTION, GET_DATA, PUBLISH, UNSUBSCRIBE};

use subscription_table::{Notification, Subscription, SubscriptionTable};

mod subscription_table;

/// The publish/subscribe service.
///
/// Keeps the latest value published under each topic and, on every publish, enqueues each
/// subscriber's operation at its destination with the arguments `(topic, attributes, data)`.
/// A publish stores its value before any of its notifications is sent, and holds the bus lock
/// until all of them are enqueued. Subscribers added later see only later publishes.
///
/// Besides the direct calls here, the bus actor accepts `publish`, `add_subscription`,
/// `unsubscribe` and `get_data` commands; the last three reply when queried.
#[derive(Clone)]
pub struct SubscriptionBus {
    core: Arc<BusCore>,
}

struct BusCore {
    name: String,
    table: Mutex<SubscriptionTable>,
    directory: Directory,
    gate: LogGate,
    handle: OnceLock<ActorHandle>,
}

impl SubscriptionBus {
    pub(crate) fn new(config: &SwitchboardConfig, directory: Directory) -> Self {
        let name = config.subscription.name.clone();
        Self {
            core: Arc::new(BusCore {
                gate: LogGate::new(&name, config.level_for(&name)),
                name,
                table: Mutex::new(SubscriptionTable::default()),
                directory,
                handle: OnceLock::new(),
            }),
        }
    }

    /// Starts the bus actor. Runs once, during launch.
    #[instrument(skip_all, fields(actor = %self.core.name), level = "trace")]
    pub(crate) fn launch(&self, runtime: &ActorRuntime) {
        if self.core.handle.get().is_some() {
            self.core.gate.warn("subscription bus already launched");
            return;
        }

        let config = ActorConfig::new(self.core.name.as_str()).with_log_gate(self.core.gate.clone());
        let mut actor = runtime.new_actor_with_model(config, self.clone());
        actor
            .command_sync(PUBLISH, |actor, ctx| {
                let topic: String = ctx.arg(0)?;
                let data: Value = ctx.arg(1)?;
                let publisher = ctx.sender().to_string();
                actor.model.publish_from(&publisher, &topic, data);
                Ok(())
            })
            .command_sync(ADD_SUBSCRIPTION, |actor, ctx| {
                let topic: String = ctx.arg(0)?;
                let destination: String = ctx.arg(1)?;
                let operation: String = ctx.arg(2)?;
                let attributes: Option<Value> = ctx.args().named_or_at("attributes", 3)?;
                let subs_id: Option<String> = ctx.args().named_or_at("subs_id", 4)?;
                let subs_id = actor.model.add_subscription(
                    &topic,
                    &destination,
                    operation,
                    attributes,
                    subs_id.as_deref(),
                );
                ctx.reply(subs_id);
                Ok(())
            })
            .command_sync(UNSUBSCRIBE, |actor, ctx| {
                let topic: String = ctx.arg(0)?;
                let subs_id: String = ctx.arg(1)?;
                let removed = actor.model.unsubscribe(&topic, &subs_id);
                ctx.reply(removed);
                Ok(())
            })
            .command_sync(GET_DATA, |actor, ctx| {
                let topic: String = ctx.arg(0)?;
                let default: Option<Value> = ctx.args().named_or_at("default", 1)?;
                let data = actor.model.get_data_or(&topic, default.unwrap_or(Value::Null));
                ctx.reply(data);
                Ok(())
            })
            .on_reset(|actor| {
                actor.model.clear();
                Reply::ready()
            });
        let handle = actor.start();
        if self.core.handle.set(handle).is_err() {
            self.core.gate.warn("subscription bus handle was already set");
        }
    }

    /// Publishes `data` under `topic` on behalf of the bus itself.
    ///
    /// Subscribers are notified in the order they first subscribed.
    pub fn publish(&self, topic: &str, data: impl Into<Value>) {
        self.publish_from(&self.core.name, topic, data.into());
    }

    /// Stores `data` under `topic` and notifies every current subscriber.
    pub(crate) fn publish_from(&self, publisher: &str, topic: &str, data: Value) {
        self.core.gate.trace(format_args!(
            "publish topic={topic} from={publisher} data={data}"
        ));
        let mut table = self.core.table.lock();
        let notifications = table.publish(topic, data.clone());
        for Notification {
            destination,
            operation,
            attributes,
        } in notifications
        {
            let args = Arguments::new()
                .with(topic)
                .with(attributes)
                .with(data.clone());
            let message = Message::new(self.core.name.as_str(), operation, args);
            self.core.directory.send(&self.core.gate, &destination, message);
        }
    }

    /// Subscribes `destination`'s `operation` to `topic` and returns the subscriber id.
    ///
    /// Without `subs_id` the id is derived from `destination`: the first is the name itself,
    /// later ones get `_1`, `_2`, ... appended. An explicit id replaces the subscription stored
    /// under it.
    pub fn add_subscription(
        &self,
        topic: &str,
        destination: &str,
        operation: impl Into<Operation>,
        attributes: Option<Value>,
        subs_id: Option<&str>,
    ) -> String {
        let operation = operation.into();
        let subscription = Subscription {
            destination: destination.to_string(),
            operation,
            attributes: attributes.unwrap_or(Value::Null),
        };
        let mut table = self.core.table.lock();
        let subs_id = table.add(topic, subscription, subs_id);
        self.core.gate.debug(format_args!(
            "subscription for {topic} subs_id={subs_id} dest={destination}"
        ));
        subs_id
    }

    /// Removes subscription `subs_id` from `topic`. Returns whether it existed.
    pub fn unsubscribe(&self, topic: &str, subs_id: &str) -> bool {
        let removed = self.core.table.lock().remove(topic, subs_id);
        if removed {
            self.core
                .gate
                .debug(format_args!("unsubscribed {subs_id} from {topic}"));
        }
        removed
    }

    /// The latest value published under `topic`.
    #[must_use]
    pub fn get_data(&self, topic: &str) -> Option<Value> {
        self.core.table.lock().get(topic).cloned()
    }

    /// The latest value published under `topic`, or `default` if there is none.
    #[must_use]
    pub fn get_data_or(&self, topic: &str, default: Value) -> Value {
        self.get_data(topic).unwrap_or(default)
    }

    /// Ids of the current subscribers of `topic`, in delivery order.
    #[must_use]
    pub fn subscriber_ids(&self, topic: &str) -> Vec<String> {
        self.core.table.lock().subscriber_ids(topic)
    }

    /// Directory name of the bus actor.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Handle of the bus actor, once launched.
    #[must_use]
    pub fn handle(&self) -> Option<&ActorHandle> {
        self.core.handle.get()
    }

    fn clear(&self) {
        self.core.table.lock().clear();
        self.core
            .gate
            .debug("published data and subscriptions cleared");
    }
}

impl fmt::Debug for SubscriptionBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionBus")
            .field("name", &self.core.name)
            .finish_non_exhaustive()
    }
}
