//! Tracing setup for the `ruleflow` binary
//!
//! The library only emits events; installing a subscriber is left to the host.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a stderr subscriber in compact format.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` applies (see `logging.filter`
/// in the configuration).
///
/// ```bash
/// RUST_LOG=ruleflow_core=debug ruleflow eval --workflows rules.toml --input order.json
/// ```
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
