//! Structured logging setup.
//!
//! Console output goes to stderr so command output on stdout stays clean.
//! When a log directory is given, a JSON copy of every event is written to a
//! daily rolling file in it.

use std::path::Path;
use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static LOGGER: OnceLock<()> = OnceLock::new();

const LOG_FILE_PREFIX: &str = "onboard.log";

/// Filter directive from `ONBOARD_LOG`, then `RUST_LOG`, then `default`.
pub fn filter_directive(default: &str) -> String {
    std::env::var("ONBOARD_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_new(filter_directive(default)).unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber. Later calls are no-ops.
///
/// `default` is the filter used when neither `ONBOARD_LOG` nor `RUST_LOG` is set.
pub fn init_logging(log_dir: Option<&Path>, default: &str) {
    LOGGER.get_or_init(|| {
        let console = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(env_filter(default));

        let (file_layer, guard) = match log_dir.filter(|dir| std::fs::create_dir_all(dir).is_ok()) {
            Some(dir) => {
                let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .json()
                    .with_filter(env_filter(default));
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        if tracing_subscriber::registry()
            .with(console)
            .with(file_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!("Global tracing subscriber already set");
        }

        if let Some(dir) = log_dir {
            tracing::debug!(log_dir = %dir.display(), "File logging enabled");
        }

        // Keep the background writer alive for the life of the process.
        if let Some(guard) = guard {
            std::mem::forget(guard);
        }
    });
}
