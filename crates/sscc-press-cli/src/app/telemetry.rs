//! Console logging.
//!
//! Events from the binary and from `sscc-press` (built with its `tracing`
//! feature) go to stderr through `tracing_subscriber::fmt`. The level defaults
//! to `info` and can be changed with `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=sscc_press=debug sscc-press shipments.xlsx
//! ```

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true)
                .pretty(),
        )
        .try_init()?;
    Ok(())
}
