//! Structured logging.
//!
//! - `combined.log`: every event that passes the filter, one JSON object per line
//! - `error.log`: error-level events only, same format
//! - stderr: human-readable output, dropped in production mode
//!
//! The filter comes from `RUST_LOG` and defaults to `wraith=info`.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::RuntimeMode;

const DEFAULT_FILTER: &str = "wraith=info";

/// Install the global subscriber.
pub fn init(log_dir: &Path, mode: RuntimeMode) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    subscriber(log_dir, mode, filter)?.try_init()?;
    Ok(())
}

fn subscriber(
    log_dir: &Path,
    mode: RuntimeMode,
    filter: EnvFilter,
) -> io::Result<impl Subscriber + Send + Sync + 'static> {
    std::fs::create_dir_all(log_dir)?;
    let combined = open_append(&log_dir.join("combined.log"))?;
    let errors = open_append(&log_dir.join("error.log"))?;

    let console = match mode {
        RuntimeMode::Development => Some(fmt::layer().with_writer(io::stderr).compact()),
        RuntimeMode::Production => None,
    };

    Ok(tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .json()
                .with_current_span(false)
                .with_writer(Mutex::new(combined)),
        )
        .with(
            fmt::layer()
                .json()
                .with_current_span(false)
                .with_writer(Mutex::new(errors))
                .with_filter(LevelFilter::ERROR),
        )
        .with(console))
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
