use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding the log filter, e.g. `MORTGAGE_LOG=mortgage_calc_core=debug`.
pub const LOG_ENV: &str = "MORTGAGE_LOG";

/// Install the stderr log subscriber. Stdout stays reserved for results.
///
/// Falls back to `warn` when `MORTGAGE_LOG` is unset or invalid. Safe to
/// call more than once.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(filter)
            .init();
    });
}
