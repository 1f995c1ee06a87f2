use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use univ2_sandwich_bot::{bot::SandwichBot, config::Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration first so its log level can seed the filter
    let config = Config::load();
    let level = config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting Uniswap V2 sandwich bot");

    let config = config.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");

    let mut bot = SandwichBot::new(config).await.map_err(|e| {
        error!("Failed to initialize bot: {}", e);
        e
    })?;

    let shutdown_signal = tokio::signal::ctrl_c();

    tokio::select! {
        result = bot.start() => {
            match result {
                Ok(_) => info!("Bot completed successfully"),
                Err(e) => error!("Bot error: {}", e),
            }
        }
        _ = shutdown_signal => {
            info!("Shutdown signal received");
        }
    }

    bot.stop().await;
    info!("Sandwich bot shutdown complete");
    Ok(())
}
