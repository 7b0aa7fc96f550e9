// Logging module - Logging infrastructure
use crate::domain::error::{F4tError, F4tResult};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter directive for a configured level
pub fn filter_directive(log_level: &str, verbose: bool) -> String {
    let level = if verbose {
        "debug"
    } else {
        match log_level {
            "error" | "warn" | "info" | "debug" | "trace" => log_level,
            _ => "info",
        }
    };
    format!("f4tcom={},warn", level)
}

/// Initialize logging system. `RUST_LOG` takes precedence over the config.
pub fn init_logging(log_level: &str, verbose: bool) -> F4tResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(log_level, verbose)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_level(true)
                .with_file(verbose)
                .with_line_number(verbose),
        )
        .try_init()
        .map_err(|e| F4tError::Config {
            message: format!("Failed to initialize logging: {}", e),
        })?;

    tracing::debug!("F4TCom logging system initialized");
    Ok(())
}
