//! ZigPool Trader - Main Entry Point
//!
//! A Rust application that trades a liquidity pool from its Tendermint
//! reserve stream: EMA price smoothing, zone classification and
//! simulation-sized swaps.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use zigpool_trader::chain::{ChainRestClient, DryRunExecutor, NoopNotifier, Notifier};
use zigpool_trader::common::channels::create_event_channel;
use zigpool_trader::config::{load_config, load_from_env};
use zigpool_trader::telegram::TelegramNotifier;
use zigpool_trader::tendermint::TendermintWsClient;
use zigpool_trader::trader::{TraderDeps, ZoneTrader};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Read all settings from environment variables instead of the file
    #[arg(long)]
    env_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting ZigPool Trader");
    info!("Configuration file: {}", args.config);

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let config = if args.env_only {
        load_from_env()?
    } else {
        load_config(Some(&args.config))?
    };
    info!(
        "Trading pool {} ({} / {})",
        config.chain.pool_contract, config.chain.base_denom, config.chain.quote_denom
    );

    // Chain collaborators
    let rest = ChainRestClient::with_timeout(
        &config.chain.rest_url,
        &config.chain.pool_contract,
        &config.chain.base_denom,
        &config.chain.quote_denom,
        Duration::from_secs(config.settings.request_timeout_seconds),
    )?;
    let rest = Arc::new(rest);

    let notifier: Arc<dyn Notifier> = match &config.telegram {
        Some(telegram) => {
            info!("Telegram notifications enabled");
            Arc::new(TelegramNotifier::new(telegram)?)
        }
        None => Arc::new(NoopNotifier),
    };

    let mut trader = ZoneTrader::new(
        &config,
        TraderDeps {
            simulator: rest.clone(),
            balances: rest.clone(),
            executor: Arc::new(DryRunExecutor),
            notifier,
        },
    );

    // Stream client
    let client = TendermintWsClient::new(
        config.chain.websocket_endpoint(),
        config.chain.subscription_query(),
    )
    .with_timing(
        Duration::from_secs(config.settings.heartbeat_interval_seconds),
        Duration::from_secs(config.settings.pending_request_timeout_seconds),
        Duration::from_millis(config.settings.reconnect_delay_ms),
    );

    let (sender, mut receiver) = create_event_channel();
    let stream_task = tokio::spawn(client.run(sender));

    info!("Application initialized successfully");

    loop {
        tokio::select! {
            event = receiver.recv() => {
                match event {
                    Some(event) => trader.on_event(event),
                    None => {
                        warn!("Event stream closed");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal, cleaning up...");
                break;
            }
        }
    }

    stream_task.abort();
    Ok(())
}
