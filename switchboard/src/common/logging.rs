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

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::common::SwitchboardConfig;

/// Installs the global tracing subscriber for an application.
///
/// The subscriber writes compact lines to stdout and, when `logging.file_logging` is set,
/// to a daily rolling file `<file_prefix>_<app name>.<date>` in `logging.log_directory`.
/// `RUST_LOG` directives are honored; without them everything as verbose as the most verbose
/// configured actor level is let through, and each actor's [`LogGate`](crate::common::LogGate)
/// does the rest.
///
/// Keep the returned guard alive for as long as file output should be flushed.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or a global subscriber is
/// already installed. Logging keeps working through the existing subscriber in that case.
pub fn init_tracing(config: &SwitchboardConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::builder()
        .with_default_directive(config.most_verbose_level().into())
        .from_env_lossy();

    let console = fmt::layer().compact().with_target(false);

    let (file, guard) = if config.logging.file_logging {
        let directory = &config.logging.log_directory;
        std::fs::create_dir_all(directory)
            .with_context(|| format!("could not create log directory {}", directory.display()))?;
        let appender = tracing_appender::rolling::daily(
            directory,
            format!("{}_{}", config.logging.file_prefix, config.app.name),
        );
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(writer);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    Ok(guard)
}
