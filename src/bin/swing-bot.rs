// Swing Trading Bot - unified CLI
// Single entry point for configuration, live trading and the passive
// price monitor

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use rust_decimal::Decimal;
use swing_trading_bot::{monitor, CoinbaseRestClient, Config, TradingSession, TradingState};

#[derive(Parser)]
#[command(name = "swing-bot")]
#[command(version = "0.1.0")]
#[command(about = "Buy-low/sell-high trading bot", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,

    /// Run the trading session until stopped
    Trade,

    /// Passively display live prices, no trading
    Monitor {
        /// Product to watch instead of the configured one
        #[arg(short, long)]
        product: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging first so config errors are visible
    let log_level = if cli.verbose { "debug" } else { "info" };
    std::env::set_var("RUST_LOG", log_level);
    tracing_subscriber::fmt::init();

    match cli.command {
        Commands::Init => init_config(&cli.config)?,
        Commands::Trade => run_trading(&cli.config).await?,
        Commands::Monitor { product } => run_monitor(&cli.config, product).await?,
    }

    Ok(())
}

fn init_config(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    if std::path::Path::new(path).exists() {
        warn!("config file {} already exists, leaving it untouched", path);
        return Ok(());
    }

    Config::default().to_file(path)?;
    info!("created default config file: {}", path);
    info!("edit it with your market and API credentials, or set COINBASE_KEY / COINBASE_SECRET / COINBASE_PASSPHRASE");
    Ok(())
}

async fn run_trading(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_file(config_path)?;

    if !config.api.has_credentials() {
        error!("API credentials missing: set them in {} or via COINBASE_KEY / COINBASE_SECRET / COINBASE_PASSPHRASE", config_path);
        return Err("missing API credentials".into());
    }

    let trading_currency = config.trade.trading_currency.clone();
    let crypto_currency = config.trade.crypto_currency.clone();

    info!(
        "starting session for {} ({} interval, {}% of available funds per BUY)",
        config.trade.product_id, config.trade.interval_ms, config.trade.percent_of_available
    );

    let gateway = CoinbaseRestClient::new(&config.api);
    let session = TradingSession::start(gateway, config.trade).await?;

    // Status display: read-only snapshot consumer, logging the full
    // block whenever the session moves (per-tick prices stay at debug)
    let mut updates = session.subscribe();
    let display_currency = trading_currency.clone();
    let display_crypto = crypto_currency.clone();
    let display = tokio::spawn(async move {
        let mut last_seen: Option<(TradingState, u32, Decimal)> = None;
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow().clone();
            let key = (snapshot.state, snapshot.cycles_completed, snapshot.anchor_price);
            if last_seen != Some(key) {
                monitor::log_snapshot(&snapshot, &display_currency, &display_crypto);
                last_seen = Some(key);
            }
        }
    });

    let result = tokio::select! {
        result = session.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("received shutdown signal, stopping scheduler");
            Ok(())
        }
    };
    display.abort();

    let summary = session.subscribe().borrow().clone();
    info!(
        "session finished: {} {} earned over {} cycles",
        summary.total_earnings, trading_currency, summary.cycles_completed
    );

    result.map_err(Into::into)
}

async fn run_monitor(
    config_path: &str,
    product: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_file(config_path)?;
    let product_id = product.unwrap_or(config.trade.product_id);

    tokio::select! {
        result = monitor::run_price_monitor(&config.api.ws_url, &product_id) => result?,
        _ = tokio::signal::ctrl_c() => info!("received shutdown signal"),
    }

    Ok(())
}
