//! Diagnostic logging setup.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "SHPBUNDLE_LOG";

static INIT: Once = Once::new();

/// Install the stderr subscriber. Later calls are no-ops.
///
/// `SHPBUNDLE_LOG` wins over `fallback_filter`; stdout stays reserved for output.
pub fn init(fallback_filter: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_new(fallback_filter))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}
