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

//! Helpers for building handler return values.
//!
//! Command handlers return a [`FutureBox`]. Most handlers do their work synchronously on
//! the actor and finish with [`Reply::ready`]:
//!
//! ```ignore
//! actor.command("increment", |actor, _ctx| {
//!     actor.model.count += 1;
//!     Reply::ready()
//! });
//! ```
//!
//! Handlers that need to await something clone what they need out of the actor and
//! return [`Reply::pending`] or, when the work can fail, [`Reply::try_pending`]:
//!
//! ```ignore
//! actor.command("relay", |actor, ctx| {
//!     let handle = actor.handle().clone();
//!     let args = ctx.args().clone();
//!     Reply::try_pending(async move {
//!         let answer = handle.query("oracle", "ask", Duration::from_secs(1), args).await?;
//!         handle.publish("ANSWER", answer);
//!         Ok(())
//!     })
//! });
//! ```

use std::future::Future;

use crate::common::FutureBox;

/// A namespace for creating [`FutureBox`] values.
pub struct Reply;

impl Reply {
    /// An immediately successful outcome.
    #[inline]
    #[must_use]
    pub fn ready() -> FutureBox {
        Box::pin(async { Ok(()) })
    }

    /// Wraps infallible async work.
    #[inline]
    pub fn pending<F>(future: F) -> FutureBox
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Box::pin(async move {
            future.await;
            Ok(())
        })
    }

    /// Wraps fallible async work. An `Err` is reported through the actor's log.
    #[inline]
    pub fn try_pending<F>(future: F) -> FutureBox
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Box::pin(future)
    }

    /// An immediate failure.
    #[inline]
    pub fn fail(error: impl Into<anyhow::Error>) -> FutureBox {
        let error = error.into();
        Box::pin(async move { Err(error) })
    }

    /// Converts the result of synchronous work.
    #[inline]
    pub fn from_result<E>(result: Result<(), E>) -> FutureBox
    where
        E: Into<anyhow::Error>,
    {
        match result {
            Ok(()) => Self::ready(),
            Err(error) => Self::fail(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ready_and_pending_succeed() {
        assert!(Reply::ready().await.is_ok());
        assert!(Reply::pending(async {}).await.is_ok());
    }

    #[tokio::test]
    async fn failures_carry_their_error() {
        let err = Reply::fail(anyhow::anyhow!("sensor offline")).await.unwrap_err();
        assert_eq!(err.to_string(), "sensor offline");

        let err = Reply::from_result(Err::<(), _>(std::fmt::Error))
            .await
            .unwrap_err();
        assert!(err.is::<std::fmt::Error>());

        let err = Reply::try_pending(async { anyhow::bail!("late failure") })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "late failure");
    }
}
