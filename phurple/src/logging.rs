//! Process-wide `tracing` subscriber setup.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::{Error, Result};

static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// Initialize the tracing logger. Call at most once; later calls are no-ops.
///
/// `level` is a filter directive such as `"debug"`, `"warn"`,
/// `"phurple=trace"` or `"off"`. `None` means `"info"`.
///
/// # Errors
///
/// Returns [`Error::Config`] if another global subscriber is already set.
pub fn init_logger(level: Option<&str>) -> Result<()> {
    let mut outcome = Ok(());
    LOGGER_INIT.get_or_init(|| {
        let filter = EnvFilter::builder().parse_lossy(level.unwrap_or("info"));
        outcome = tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .try_init()
            .map_err(|e| Error::Config(format!("logger: {e}")));
    });
    outcome
}
