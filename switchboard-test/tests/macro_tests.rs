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

use switchboard_test::prelude::*;
use tracing::Span;

fn current_span_name() -> Option<&'static str> {
    Span::current().metadata().map(|meta| meta.name())
}

#[switchboard_test(timeout_secs = 5)]
#[ignore = "needs a subscriber; run through test_body_stays_in_the_test_span"]
async fn traced_body() {
    assert_eq!(current_span_name(), Some("switchboard_test"));
    tokio::task::yield_now().await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(current_span_name(), Some("switchboard_test"));

    // Work spawned onto the runtime does not inherit the test span.
    let spawned = tokio::spawn(async { current_span_name() }).await;
    assert_eq!(spawned.ok().flatten(), None);
}

#[test]
fn test_body_stays_in_the_test_span() {
    tracing::subscriber::with_default(tracing_subscriber::registry(), traced_body);
    assert_eq!(current_span_name(), None);
}
