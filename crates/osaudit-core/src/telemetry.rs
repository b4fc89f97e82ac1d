//! Centralised tracing initialisation for osaudit binaries.
//!
//! Call [`init_tracing`] once at program start. Logs go to stderr so that
//! the report on stdout stays machine-readable.
//!
//! Safe to call more than once; only the first call takes effect.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global tracing subscriber.
///
/// * `json`: when `true`, emit newline-delimited JSON log lines.
/// * `level`: default verbosity when `RUST_LOG` is not set.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}

/// Default level for a run given the CLI verbosity switches.
pub fn level_for(verbose: bool, trace: bool) -> Level {
    if trace {
        Level::TRACE
    } else if verbose {
        Level::DEBUG
    } else {
        Level::WARN
    }
}
