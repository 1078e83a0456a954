//! This module provides observability and diagnostics for the pipeline.
//!
//! The pipeline runs on devices where a failed call is only visible as an empty
//! payload, so the diagnostic trail matters. `log_metric!` emits structured
//! key/value records through the `log` facade, and `enable_verbose_logging`
//! installs an `env_logger` backend for hosts that have none.
//!
//! `log_metric!` is compiled out of release builds via `#[cfg(debug_assertions)]`.

use std::fs::{File, OpenOptions};
use std::sync::Once;

use log::LevelFilter;

use crate::error::TextpackError;

/// Logs a structured key-value metric at `debug` level, only in debug builds.
///
/// # Example
/// ```
/// use textpack::log_metric;
/// let size = 4096;
/// log_metric!("event"="alloc", "outcome"="ok", "size"=&size);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        #[cfg(debug_assertions)]
        {
            // Collect each pair as a JSON string fragment
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+

            $crate::__log::debug!(target: "textpack::metric", "TEXTPACK_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}

static INIT_LOGGER: Once = Once::new();

/// Installs a `debug`-level `env_logger`, optionally appending to `log_file`.
///
/// `debug` is where the pipeline reports and `log_metric!` records are written.
/// `RUST_LOG`, when set, overrides the level. Only the first call has any effect;
/// later calls return `Ok(())`. If another logger is already installed the call is
/// a no-op.
///
/// # Errors
/// Returns `TextpackError::Io` if `log_file` cannot be opened for appending.
pub fn enable_verbose_logging(log_file: Option<&str>) -> Result<(), TextpackError> {
    let file = match log_file {
        Some(path) if !INIT_LOGGER.is_completed() => {
            Some(OpenOptions::new().append(true).create(true).open(path)?)
        }
        _ => None,
    };

    INIT_LOGGER.call_once(move || {
        let _ = verbose_builder(file).try_init();
    });

    Ok(())
}

fn verbose_builder(file: Option<File>) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();

    builder.is_test(false);
    builder.filter_level(LevelFilter::Debug);
    builder.parse_default_env();

    // Custom formatter: just print the level and message
    builder.format(|buf, record| {
        use std::io::Write;
        writeln!(buf, "[{}] {}", record.level(), record.args())?;
        buf.flush()?;
        Ok(())
    });

    if let Some(file) = file {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder
}
