//! Unified types used across the trading pipeline

use serde::{Deserialize, Serialize};

/// Raw pool balances for the two traded assets at one observation instant
///
/// Recreated per stream event, never persisted. Amounts are in the smallest
/// on-chain unit, so `u128` covers reserves well past 10^18.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservePair {
    /// Balance of the base asset (the asset the price is quoted against)
    pub base: u128,
    /// Balance of the quote asset
    pub quote: u128,
}

impl ReservePair {
    pub fn new(base: u128, quote: u128) -> Self {
        Self { base, quote }
    }
}

/// Trading intent a zone belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeIntent {
    /// Acquire the base asset (offer quote)
    BuyBase,
    /// Acquire the quote asset (offer base)
    BuyQuote,
}

impl TradeIntent {
    /// The side of the swap as seen from the base asset
    pub fn side(&self) -> Side {
        match self {
            TradeIntent::BuyBase => Side::Buy,
            TradeIntent::BuyQuote => Side::Sell,
        }
    }
}

impl std::fmt::Display for TradeIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeIntent::BuyBase => write!(f, "buy_base"),
            TradeIntent::BuyQuote => write!(f, "buy_quote"),
        }
    }
}

/// Order side (buy or sell of the base asset)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// A configured price interval that signals a trading opportunity
///
/// Zones are immutable configuration, ordered by declaration within their
/// intent list. Containment uses an epsilon tolerance on both bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeZone {
    /// Lower price bound (inclusive, with epsilon)
    pub min: f64,
    /// Upper price bound (inclusive, with epsilon)
    pub max: f64,
    /// Desired notional size in whole trade units
    #[serde(default = "default_zone_size")]
    pub size: f64,
    /// Human-readable zone label, also the dedupe key for the execution gate
    pub label: String,
    /// Stable order identifier for operator-facing reporting
    pub order_id: String,
}

fn default_zone_size() -> f64 {
    1.0
}

/// Result of classifying one price sample against the zone lists
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneMatch {
    pub intent: TradeIntent,
    pub zone_index: usize,
    pub zone: TradeZone,
}

impl ZoneMatch {
    /// Identity of the match for transition detection
    pub fn key(&self) -> (TradeIntent, usize) {
        (self.intent, self.zone_index)
    }
}

/// Full decision payload handed to the sizing/execution stage
///
/// Constructed fresh per triggered zone transition, not retained.
#[derive(Debug, Clone)]
pub struct TradeContext {
    /// Exponentially smoothed price (quote/base)
    pub filtered_price: f64,
    /// Latest raw price computed from the reserves
    pub raw_price: f64,
    /// Lower edge of the target band (buy target)
    pub lower_target: f64,
    /// Upper edge of the target band (sell target)
    pub upper_target: f64,
    /// Pool reserves at the triggering observation
    pub reserves: ReservePair,
    /// Which asset the trigger wants to acquire
    pub intent: TradeIntent,
    /// Label of the triggering zone
    pub zone_label: String,
    /// Order identifier of the triggering zone
    pub order_id: String,
    /// Desired notional amount in whole trade units
    pub desired_size: f64,
    /// Wallet to trade from, if configured
    pub wallet_address: Option<String>,
}

/// Connection status for the stream client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// Successfully connected
    Connected,
    /// Disconnected (with optional reason)
    Disconnected(Option<String>),
    /// Waiting out the reconnect delay
    Reconnecting,
    /// Connection error
    Error(String),
}

/// Event emitted by the stream client into the decision pipeline
#[derive(Debug, Clone)]
pub enum PoolEvent {
    /// A decoded reserve attribute (`denom:amount,denom:amount`)
    ReserveUpdate { reserves: String },
    /// Connection status change
    ConnectionStatus(ConnectionStatus),
    /// Heartbeat subscribe acknowledged
    Heartbeat,
}
