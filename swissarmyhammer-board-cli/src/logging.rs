use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

/// Send logs to stderr; stdout carries the board protocol.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn configure_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("notify=warn,{log_level}")));

    registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
