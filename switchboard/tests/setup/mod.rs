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

use std::sync::Once;

use switchboard::prelude::*;
use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub mod actors;

static INIT: Once = Once::new();

/// Installs a trace-level file subscriber once per test binary.
pub fn initialize_tracing() {
    INIT.call_once(|| {
        std::fs::create_dir_all("logs").expect("could not create logs dir");

        let file_appender = RollingFileAppender::new(Rotation::NEVER, "logs", "switchboard_tests.txt");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        // The writer must outlive every test in the binary.
        Box::leak(Box::new(guard));

        let filter = EnvFilter::new("trace")
            .add_directive("switchboard::actor::managed_actor::started=trace".parse().unwrap())
            .add_directive("switchboard::common::directory=trace".parse().unwrap())
            .add_directive("tokio=info".parse().unwrap());

        let subscriber = FmtSubscriber::builder()
            .with_span_events(FmtSpan::NONE)
            .with_max_level(Level::TRACE)
            .compact()
            .with_line_number(true)
            .without_time()
            .with_target(true)
            .with_env_filter(filter)
            .with_writer(non_blocking)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .expect("setting default subscriber failed");
    });
}

/// Default configuration with every actor logging at trace level.
///
/// Tests never read the user's configuration file.
pub fn test_config() -> SwitchboardConfig {
    let mut config = SwitchboardConfig::default();
    config.logging.default_level = "trace".to_string();
    config.logging.file_logging = false;
    config.timeouts.exit_grace_period_ms = 1_000;
    config
}

/// Launches a runtime with [`test_config`].
pub async fn launch() -> ActorRuntime {
    initialize_tracing();
    SwitchboardApp::launch_with_config(test_config()).await
}
