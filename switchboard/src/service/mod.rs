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

//! The two services every runtime starts with: the [`Scheduler`] and the [`SubscriptionBus`].
//!
//! Both are ordinary actors addressed by their configured names. The constants here are the
//! commands their mailboxes accept in addition to the built-in ones.

pub use scheduler::{ScheduleRequest, Scheduler};
pub use subscription::SubscriptionBus;

mod scheduler;
mod subscription;

/// `schedule(owner, sched_id, interval_s, count, dest, op, *args)` on the scheduler.
pub const SCHEDULE: &str = "schedule";
/// `del_item(owner, sched_id)` on the scheduler.
pub const DEL_ITEM: &str = "del_item";
/// `flush_my_items(owner)` on the scheduler; replies with the number removed.
pub const FLUSH_MY_ITEMS: &str = "flush_my_items";

/// `publish(topic, data)` on the subscription bus.
pub const PUBLISH: &str = "publish";
/// `add_subscription(topic, dest, op, attributes=None, subs_id=None)` on the subscription bus;
/// replies with the subscriber id.
pub const ADD_SUBSCRIPTION: &str = "add_subscription";
/// `unsubscribe(topic, subs_id)` on the subscription bus; replies with whether it existed.
pub const UNSUBSCRIBE: &str = "unsubscribe";
/// `get_data(topic, default=None)` on the subscription bus; replies with the value.
pub const GET_DATA: &str = "get_data";
