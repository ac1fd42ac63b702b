use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use chart_sniper::signal_core::{SessionController, SessionStore, SignalConfig};
use chart_sniper::telegram::TelegramClient;
use chart_sniper::vision::VisionClient;
use chart_sniper::SniperBot;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_TOKEN", hide_env_values = true)]
    telegram_token: String,

    /// Google Vision API key
    #[arg(long, env = "GOOGLE_VISION_API_KEY", hide_env_values = true)]
    vision_api_key: String,

    /// Directory for screenshot audit copies and pending session files
    #[arg(long, default_value = "uploads")]
    upload_dir: PathBuf,

    /// Account balance used for position sizing
    #[arg(long, default_value = "10000.0")]
    balance: f64,

    /// Long-poll hold time in seconds
    #[arg(long, default_value = "30")]
    poll_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chart_sniper=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    info!("Starting chart-sniper bot");
    info!("Upload dir: {}", args.upload_dir.display());
    info!("Balance: {}", args.balance);

    let telegram = TelegramClient::new(&args.telegram_token)?;
    let ocr = VisionClient::new(&args.vision_api_key)?;

    let store = SessionStore::with_dir(&args.upload_dir)?;
    let config = SignalConfig {
        balance: args.balance,
        ..Default::default()
    };
    let controller = SessionController::new(store, config);

    let mut bot = SniperBot::new(
        telegram,
        Box::new(ocr),
        controller,
        args.upload_dir,
        args.poll_timeout,
    );
    bot.run().await
}
