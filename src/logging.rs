//! Logging subscriber initialisation
//!
//! `RUST_LOG` takes precedence over the configured level, e.g.
//! `RUST_LOG=campaign_opt=debug`.

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

use crate::config::LoggingConfig;

pub fn init(config: &LoggingConfig) -> Result<(), TryInitError> {
    let json = config.json;

    tracing_subscriber::registry()
        .with(build_env_filter(config))
        .with((!json).then(|| fmt::layer().with_target(true).with_line_number(true)))
        .with(json.then(|| {
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
        }))
        .try_init()
}

fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{},hyper=warn,tower_http=info",
            config.level
        ))
    })
}

/// Verbose logging for tests; safe to call more than once.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
