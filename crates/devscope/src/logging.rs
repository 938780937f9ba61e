//! Tracing initialization.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

/// Environment variable holding the log filter, e.g. `DEVSCOPE_LOG=devscope_export=debug`.
pub const LOG_ENV: &str = "DEVSCOPE_LOG";

const DEFAULT_FILTER: &str = "devscope=warn,devscope_inventory=warn,devscope_export=warn";

/// Install the stderr subscriber. Falls back to warnings only when
/// `DEVSCOPE_LOG` is unset or invalid. Safe to call more than once.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(filter)
            .try_init();
    });
}
