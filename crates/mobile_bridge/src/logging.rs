//! tracing subscriber setup

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOGGING: OnceCell<()> = OnceCell::new();

/// Install the global subscriber
///
/// `level` sets the default directive; `RUST_LOG` still overrides it. Only the
/// first call installs anything, later calls return `Ok(())`.
pub fn setup_logging(level: &str) -> Result<()> {
    LOGGING.get_or_try_init(|| {
        let log_level = level.parse::<Level>().unwrap_or(Level::INFO);

        let filter = EnvFilter::builder()
            .with_default_directive(log_level.into())
            .from_env_lossy();

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_ansi(false).with_writer(std::io::stderr))
            .try_init()
            .context("Failed to install tracing subscriber")
    })?;

    Ok(())
}
