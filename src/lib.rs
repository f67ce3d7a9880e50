//! ZigPool Trader Library
//!
//! A Rust library for trading a liquidity pool from its reserve stream:
//! Tendermint WebSocket subscription, price smoothing, zone classification
//! and simulation-based trade sizing.

pub mod chain;
pub mod common;
pub mod config;
pub mod strategy;
pub mod telegram;
pub mod tendermint;
pub mod trader;

// Re-export commonly used types
pub use common::errors::{Result, TraderError};
pub use common::types::{
    ConnectionStatus, PoolEvent, ReservePair, Side, TradeContext, TradeIntent, TradeZone,
    ZoneMatch,
};
pub use config::loader::{load_config, load_from_env};
pub use config::types::AppConfig;
pub use tendermint::TendermintWsClient;
pub use trader::{TraderDeps, ZoneTrader};

// Strategy types
pub use strategy::{
    compute_raw_price, normalize_band, FilteredPrice, PriceFilter, SizedOffer, TradeSizer,
    ZoneClassifier, ZoneExecutionGate,
};

// Chain collaborators
pub use chain::{
    BalanceProvider, ChainRestClient, DryRunExecutor, ExecutionOutcome, NoopNotifier, Notifier,
    QuoteSimulator, SwapExecutor, WalletBalances,
};
pub use telegram::TelegramNotifier;
