// src/infra/logger.rs - Structured logging with tracing

use tracing_subscriber::{fmt, EnvFilter};

use crate::infra::config::Config;

/// Install a compact fmt subscriber. `SQLITE3M_LOG` wins over `RUST_LOG`,
/// which wins over `level`. A no-op if a global subscriber is already set.
pub fn init_logging(level: &str) {
    let filter = std::env::var("SQLITE3M_LOG")
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}

/// `init_logging` with the `[logging] level` from `config`.
pub fn init_logging_from(config: &Config) {
    init_logging(&config.logging.level);
}
