//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::AppConfig;
use crate::common::errors::{Result, TraderError};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with ZIGPOOL__)
/// 2. Configuration file (TOML format)
/// 3. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    // Add default config file if it exists
    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    // Add environment variables with ZIGPOOL prefix
    builder = builder.add_source(
        Environment::with_prefix("ZIGPOOL")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| TraderError::Configuration(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| TraderError::Configuration(e.to_string()))
}

/// Load configuration from environment variables only
pub fn load_from_env() -> Result<AppConfig> {
    // Try to load from .env file
    dotenvy::dotenv().ok();

    let mut chain = super::types::ChainConfig::default();
    if let Ok(v) = std::env::var("RPC_BASE") {
        chain.ws_url = v;
    }
    if let Ok(v) = std::env::var("HTTP_API") {
        chain.rest_url = v;
    }
    if let Ok(v) = std::env::var("POOL_CONTRACT") {
        chain.pool_contract = v;
    }
    if let Ok(v) = std::env::var("BASE_DENOM") {
        chain.base_denom = v;
    }
    if let Ok(v) = std::env::var("QUOTE_DENOM") {
        chain.quote_denom = v;
    }
    chain.wallet_address = std::env::var("WALLET_ADDRESS").ok();

    let mut trading = super::types::TradingConfig::default();
    if let Some(v) = parse_env_f64("PRICE_SMOOTHING_ALPHA") {
        trading.smoothing_alpha = v;
    }
    if let Some(v) = parse_env_u64("COOLDOWN_MS") {
        trading.cooldown_ms = v;
    }
    if let Some(v) = parse_env_f64("TRADE_UNIT") {
        if v > 0.0 {
            trading.trade_unit = v;
        }
    }
    if let Some(v) = parse_env_f64("LOWER_TARGET") {
        trading.lower_target = v;
    }
    if let Some(v) = parse_env_f64("UPPER_TARGET") {
        trading.upper_target = v;
    }
    if let Some(v) = parse_env_f64("WALLET_MAX_RATIO") {
        trading.wallet_max_ratio = v.max(0.0);
    }
    if let Some(v) = parse_env_f64("POOL_MAX_RATIO") {
        trading.pool_max_ratio = v.max(0.0);
    }
    if let Some(v) = parse_env_u64("MAX_POOL_IMPACT_BPS") {
        trading.max_impact_bps = v as u32;
    }
    if let Ok(v) = std::env::var("USE_SIM_SIZING") {
        trading.use_sim_sizing = v.to_lowercase() == "true";
    }
    if let Ok(v) = std::env::var("SIZE_TIERS") {
        let mut tiers: Vec<f64> = v
            .split(',')
            .filter_map(|s| s.trim().parse::<f64>().ok())
            .filter(|n| n.is_finite() && *n > 0.0)
            .collect();
        tiers.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        if !tiers.is_empty() {
            trading.size_tiers = tiers;
        }
    }

    let telegram = match (
        std::env::var("TELEGRAM_BOT_TOKEN").ok(),
        std::env::var("TELEGRAM_CHAT_ID").ok(),
    ) {
        (Some(bot_token), Some(chat_id)) => Some(super::types::TelegramConfig {
            bot_token,
            chat_id,
            explorer_tx_url: std::env::var("EXPLORER_TX_URL")
                .unwrap_or_else(|_| "https://www.zigscan.org/tx".to_string()),
        }),
        _ => None,
    };

    let mut settings = super::types::AppSettings::default();
    if let Ok(v) = std::env::var("STATE_FILE") {
        settings.state_file = v;
    }

    Ok(AppConfig {
        chain,
        trading,
        telegram,
        settings,
    })
}

fn parse_env_f64(key: &str) -> Option<f64> {
    std::env::var(key).ok()?.parse().ok()
}

fn parse_env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.parse().ok()
}
