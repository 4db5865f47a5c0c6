// 📜 Logging - process-wide tracing subscriber setup

use anyhow::{anyhow, Result};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install the compact fmt subscriber. Fails if one is already installed.
pub fn init_tracing(verbose: bool) -> Result<()> {
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}
