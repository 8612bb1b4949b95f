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

pub use arguments::Arguments;
pub(crate) use envelope::Envelope;
pub use envelope::Message;
pub use mailbox::Mailbox;
pub use message_context::MessageContext;
pub use message_error::{ArgumentError, DispatchError, QueryError};
pub use operation::{DirectOperation, Operation};
pub use reply_to::ReplyTo;
pub use signal::SystemSignal;

mod arguments;
mod envelope;
mod mailbox;
mod message_context;
mod message_error;
mod operation;
mod reply_to;
mod signal;
