//! Logging initialization
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to the
//! mashup crates. Every line carries a timestamp from the fmt layer.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter used when `RUST_LOG` is not set
pub fn default_filter(level: &str) -> String {
    format!(
        "mashup_common={level},mashup_pipeline={level},mashup_web={level},tower_http=info"
    )
}

/// Initialize the global tracing subscriber
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}
