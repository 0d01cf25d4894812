//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Initialize logging. Idempotent.
///
/// Levels come from `GOSCOPE_LOG` (e.g. `GOSCOPE_LOG=goscope=debug`), falling
/// back to `goscope=info`. Output goes to stderr so stdout can carry the graph.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("GOSCOPE_LOG").unwrap_or_else(|_| EnvFilter::new("goscope=info"));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .with(filter)
            .init();
    });
}
