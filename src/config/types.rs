//! Configuration types

use serde::{Deserialize, Serialize};

use crate::common::types::TradeZone;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Chain endpoints and pool identity
    pub chain: ChainConfig,
    /// Price filter, zone and sizing parameters
    #[serde(default)]
    pub trading: TradingConfig,
    /// Telegram notification settings (optional)
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

/// Chain endpoints and pool identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Tendermint RPC WebSocket URL
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// LCD REST API base URL (bank queries, contract smart queries)
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
    /// Liquidity pool contract address
    #[serde(default = "default_pool_contract")]
    pub pool_contract: String,
    /// Denom of the base asset (price is quote/base)
    #[serde(default = "default_base_denom")]
    pub base_denom: String,
    /// Denom of the quote asset
    #[serde(default = "default_quote_denom")]
    pub quote_denom: String,
    /// Decimal exponent of the base denom
    #[serde(default = "default_exponent")]
    pub base_exponent: u32,
    /// Decimal exponent of the quote denom
    #[serde(default = "default_exponent")]
    pub quote_exponent: u32,
    /// Wallet address used for balance lookups
    #[serde(default)]
    pub wallet_address: Option<String>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            rest_url: default_rest_url(),
            pool_contract: default_pool_contract(),
            base_denom: default_base_denom(),
            quote_denom: default_quote_denom(),
            base_exponent: default_exponent(),
            quote_exponent: default_exponent(),
            wallet_address: None,
        }
    }
}

impl ChainConfig {
    /// The Tendermint subscription query for swap events on the pool contract
    pub fn subscription_query(&self) -> String {
        format!(
            "tm.event='Tx' AND wasm._contract_address='{}' AND wasm.action='swap'",
            self.pool_contract
        )
    }

    /// WebSocket endpoint including the `/websocket` path segment
    pub fn websocket_endpoint(&self) -> String {
        if self.ws_url.ends_with("/websocket") {
            self.ws_url.clone()
        } else {
            format!("{}/websocket", self.ws_url.trim_end_matches('/'))
        }
    }
}

fn default_ws_url() -> String {
    "wss://zigchain-mainnet-rpc-sanatry-01.wickhub.cc".to_string()
}

fn default_rest_url() -> String {
    "https://zigchain-mainnet-api.wickhub.cc".to_string()
}

fn default_pool_contract() -> String {
    "zig1h72z8ptvcdqvuvy2lqanupwtextjmjmktj2ejgne2padxk0z8zds48shzq".to_string()
}

fn default_base_denom() -> String {
    "coin.zig109f7g2rzl2aqee7z6gffn8kfe9cpqx0mjkk7ethmx8m2hq4xpe9snmaam2.stzig".to_string()
}

fn default_quote_denom() -> String {
    "uzig".to_string()
}

fn default_exponent() -> u32 {
    6
}

/// Price filter, zone and sizing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// EMA smoothing coefficient, clamped to [0, 1]; <= 0 means passthrough
    #[serde(default = "default_smoothing_alpha")]
    pub smoothing_alpha: f64,
    /// Global minimum interval between any two triggers, in milliseconds
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    /// Multiplier applied to every zone's configured size
    #[serde(default = "default_trade_unit")]
    pub trade_unit: f64,
    /// Lower edge of the target band (buy target)
    #[serde(default = "default_lower_target")]
    pub lower_target: f64,
    /// Upper edge of the target band (sell target)
    #[serde(default = "default_upper_target")]
    pub upper_target: f64,
    /// Zones that acquire the base asset, in priority order
    #[serde(default = "default_buy_base_zones")]
    pub buy_base_zones: Vec<TradeZone>,
    /// Zones that acquire the quote asset, in priority order
    #[serde(default = "default_buy_quote_zones")]
    pub buy_quote_zones: Vec<TradeZone>,
    /// Offer cap as a fraction of the wallet balance of the offered asset
    #[serde(default = "default_wallet_max_ratio")]
    pub wallet_max_ratio: f64,
    /// Offer cap as a fraction of the pool balance of the offered asset
    #[serde(default = "default_pool_max_ratio")]
    pub pool_max_ratio: f64,
    /// Price-impact cap in basis points of the offered-side pool balance
    #[serde(default = "default_max_impact_bps")]
    pub max_impact_bps: u32,
    /// Whether to size offers via quote simulation
    #[serde(default = "default_use_sim_sizing")]
    pub use_sim_sizing: bool,
    /// Allowed trade sizes in whole units, ascending
    #[serde(default = "default_size_tiers")]
    pub size_tiers: Vec<f64>,
    /// Fixed fallback size in whole units when simulation is unavailable
    #[serde(default = "default_fixed_trade_size")]
    pub fixed_trade_size: f64,
    /// Maximum spread tolerated by the swap message, clamped to [0, 1]
    #[serde(default = "default_max_spread")]
    pub max_spread: f64,
    /// Base-asset balance assumed when the balance lookup fails, whole units
    #[serde(default)]
    pub wallet_fallback_base: f64,
    /// Quote-asset balance assumed when the balance lookup fails, whole units
    #[serde(default)]
    pub wallet_fallback_quote: f64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            smoothing_alpha: default_smoothing_alpha(),
            cooldown_ms: default_cooldown_ms(),
            trade_unit: default_trade_unit(),
            lower_target: default_lower_target(),
            upper_target: default_upper_target(),
            buy_base_zones: default_buy_base_zones(),
            buy_quote_zones: default_buy_quote_zones(),
            wallet_max_ratio: default_wallet_max_ratio(),
            pool_max_ratio: default_pool_max_ratio(),
            max_impact_bps: default_max_impact_bps(),
            use_sim_sizing: default_use_sim_sizing(),
            size_tiers: default_size_tiers(),
            fixed_trade_size: default_fixed_trade_size(),
            max_spread: default_max_spread(),
            wallet_fallback_base: 0.0,
            wallet_fallback_quote: 0.0,
        }
    }
}

impl TradingConfig {
    /// Smoothing coefficient clamped into [0, 1]
    pub fn effective_alpha(&self) -> f64 {
        if self.smoothing_alpha.is_finite() && self.smoothing_alpha >= 0.0 {
            self.smoothing_alpha.min(1.0)
        } else {
            default_smoothing_alpha()
        }
    }

    /// Max spread clamped into [0, 1]
    pub fn effective_max_spread(&self) -> f64 {
        self.max_spread.clamp(0.0, 1.0)
    }
}

fn default_smoothing_alpha() -> f64 {
    0.25
}

fn default_cooldown_ms() -> u64 {
    10_000
}

fn default_trade_unit() -> f64 {
    1.0
}

fn default_lower_target() -> f64 {
    0.991
}

fn default_upper_target() -> f64 {
    1.038
}

fn default_wallet_max_ratio() -> f64 {
    0.02
}

fn default_pool_max_ratio() -> f64 {
    0.015
}

fn default_max_impact_bps() -> u32 {
    500
}

fn default_use_sim_sizing() -> bool {
    true
}

fn default_size_tiers() -> Vec<f64> {
    vec![1.0, 2.0, 3.0]
}

fn default_fixed_trade_size() -> f64 {
    1.0
}

fn default_max_spread() -> f64 {
    0.002
}

fn zone(min: f64, max: f64, label: &str, order_id: &str) -> TradeZone {
    TradeZone {
        min,
        max,
        size: 1.0,
        label: label.to_string(),
        order_id: order_id.to_string(),
    }
}

fn default_buy_base_zones() -> Vec<TradeZone> {
    vec![
        zone(1.0041, 1.007, "BUY_BASE 1.0041-1.0070", "A"),
        zone(1.0011, 1.004, "BUY_BASE 1.0011-1.0040", "B"),
        zone(1.0001, 1.001, "BUY_BASE 1.0001-1.0010", "C"),
        zone(0.9901, 1.0, "BUY_BASE 0.9901-1.0000", "D"),
        zone(0.9951, 0.99, "BUY_BASE 0.9951-0.9900", "E"),
        zone(0.9941, 0.995, "BUY_BASE 0.9941-0.9950", "F"),
        zone(0.9921, 0.994, "BUY_BASE 0.9921-0.9940", "G"),
        zone(0.9911, 0.992, "BUY_BASE 0.9911-0.9920", "H"),
        zone(0.9905, 0.991, "BUY_BASE 0.9905-0.9910", "I"),
    ]
}

fn default_buy_quote_zones() -> Vec<TradeZone> {
    vec![
        zone(1.012, 1.015, "BUY_QUOTE 1.0140-1.0150", "J"),
        zone(1.0151, 1.018, "BUY_QUOTE 1.0151-1.0180", "K"),
        zone(1.0181, 1.02, "BUY_QUOTE 1.0181-1.0200", "L"),
        zone(1.0201, 1.022, "BUY_QUOTE 1.0201-1.0220", "M"),
        zone(1.0221, 1.024, "BUY_QUOTE 1.0221-1.0240", "N"),
        zone(1.0241, 1.026, "BUY_QUOTE 1.0241-1.0260", "O"),
        zone(1.0261, 1.028, "BUY_QUOTE 1.0261-1.0280", "P"),
        zone(1.0281, 1.03, "BUY_QUOTE 1.0281-1.0300", "Q"),
    ]
}

/// Telegram notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token
    pub bot_token: String,
    /// Destination chat id
    pub chat_id: String,
    /// Explorer base URL for transaction links
    #[serde(default = "default_explorer_tx_url")]
    pub explorer_tx_url: String,
}

fn default_explorer_tx_url() -> String {
    "https://www.zigscan.org/tx".to_string()
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Delay between reconnection attempts in milliseconds
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
    /// Heartbeat subscribe interval in seconds
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_seconds: u64,
    /// Age after which outstanding requests are swept, in seconds
    #[serde(default = "default_pending_timeout")]
    pub pending_request_timeout_seconds: u64,
    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Path of the persisted zone-execution state file
    #[serde(default = "default_state_file")]
    pub state_file: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            reconnect_delay_ms: default_reconnect_delay(),
            heartbeat_interval_seconds: default_heartbeat_interval(),
            pending_request_timeout_seconds: default_pending_timeout(),
            request_timeout_seconds: default_request_timeout(),
            state_file: default_state_file(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_reconnect_delay() -> u64 {
    2000
}

fn default_heartbeat_interval() -> u64 {
    15
}

fn default_pending_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    30
}

fn default_state_file() -> String {
    "zone_state.json".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_query_names_pool() {
        let chain = ChainConfig::default();
        let query = chain.subscription_query();
        assert!(query.contains(&chain.pool_contract));
        assert!(query.contains("wasm.action='swap'"));
    }

    #[test]
    fn test_websocket_endpoint_appends_path_once() {
        let mut chain = ChainConfig::default();
        chain.ws_url = "wss://rpc.example.com".to_string();
        assert_eq!(chain.websocket_endpoint(), "wss://rpc.example.com/websocket");

        chain.ws_url = "wss://rpc.example.com/websocket".to_string();
        assert_eq!(chain.websocket_endpoint(), "wss://rpc.example.com/websocket");
    }

    #[test]
    fn test_effective_alpha_clamping() {
        let mut trading = TradingConfig::default();
        trading.smoothing_alpha = 2.5;
        assert_eq!(trading.effective_alpha(), 1.0);

        trading.smoothing_alpha = f64::NAN;
        assert_eq!(trading.effective_alpha(), 0.25);
    }

    #[test]
    fn test_default_zone_tables_are_disjoint_by_intent() {
        let trading = TradingConfig::default();
        assert!(!trading.buy_base_zones.is_empty());
        assert!(!trading.buy_quote_zones.is_empty());
        // Buy-quote zones sit strictly above every buy-base zone.
        let base_max = trading
            .buy_base_zones
            .iter()
            .map(|z| z.max)
            .fold(f64::MIN, f64::max);
        let quote_min = trading
            .buy_quote_zones
            .iter()
            .map(|z| z.min)
            .fold(f64::MAX, f64::min);
        assert!(base_max < quote_min);
    }
}
