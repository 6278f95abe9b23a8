//! Logging initialisation.

use tracing::Level;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Parse a log level name, defaulting to `INFO`.
fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Install a console subscriber.
///
/// `RUST_LOG` directives win over `default_level`.  Logs go to stderr so the
/// binary's stdout stays a clean list of media URLs.
pub fn init(default_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(parse_level(default_level).into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    Ok(())
}
