//! vakhta-bot entry point

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vakhta_bot::database::{DatabaseConfig, DatabaseManager};
use vakhta_bot::telegram::{self, BotContext, TelegramClient};
use vakhta_bot::weather::OpenWeatherClient;
use vakhta_bot::BotConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vakhta_bot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BotConfig::from_env().context("Failed to load configuration")?;
    if config.weather.api_key.is_none() {
        tracing::warn!("WEATHER_API_KEY is not set, weather features will report errors");
    }

    let db = DatabaseManager::init(DatabaseConfig::new(&config.database_path)).await?;

    let api = TelegramClient::new(&config.telegram_api_url, &config.telegram_token)?;
    let weather = OpenWeatherClient::new(&config.weather)?;
    let ctx = Arc::new(BotContext::new(
        Arc::new(api),
        db.clone(),
        Arc::new(weather),
        &config,
    ));

    tracing::info!(
        database = %config.database_path.display(),
        "Starting bot"
    );
    telegram::run(ctx).await?;

    db.close().await;
    Ok(())
}
