//! routine-predictor - predicts the likely recurring activity for now
//!
//! Records activity observations and learns a decision tree over time of day
//! and weekday from them.

use routine_predictor::{cli, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    cli::run_with(config).await
}
