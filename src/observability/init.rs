//! Tracing initialization and subscriber setup.

use crate::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LEVEL: &str = "info";

/// Builds the event filter for `config`.
///
/// `RUST_LOG` wins over the configured level. An unparsable directive falls
/// back to `info`.
#[must_use]
pub fn filter_for(config: &Config) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = config.trace_level.as_deref().unwrap_or(DEFAULT_LEVEL);
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
    })
}

/// Installs a global subscriber that writes formatted events to stderr.
///
/// Idempotent: if a global subscriber is already set (by the embedder or an
/// earlier call), this call does nothing.
///
/// # Example
///
/// ```rust
/// use modeler_session::observability::init_tracing;
/// use modeler_session::Config;
///
/// let config = Config {
///     trace_level: Some("debug".to_string()),
///     ..Default::default()
/// };
///
/// init_tracing(&config);
/// init_tracing(&config);
/// ```
pub fn init_tracing(config: &Config) {
    let subscriber = tracing_subscriber::registry()
        .with(filter_for(config))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        );

    if subscriber.try_init().is_err() {
        tracing::debug!("global subscriber already installed");
    }
}
