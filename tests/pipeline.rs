//! End-to-end decision pipeline tests
//!
//! Drives the trader from raw stream messages through envelope decoding,
//! price filtering, zone classification and sizing, against an in-process
//! constant-product pool. No network access required.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use zigpool_trader::chain::{
    BalanceProvider, ExecutionOutcome, Notifier, QuoteSimulator, SwapExecutor, WalletBalances,
};
use zigpool_trader::config::AppConfig;
use zigpool_trader::tendermint::messages::extract_reserves;
use zigpool_trader::trader::{TraderDeps, ZoneTrader};
use zigpool_trader::{PoolEvent, ReservePair};

const BASE_DENOM: &str = "stzig";
const QUOTE_DENOM: &str = "uzig";
const BASE_RESERVE: u128 = 1_000_000_000_000;
const QUOTE_RESERVE: u128 = 1_030_000_000_000;

/// Constant-product pool standing in for the chain
struct FakePool {
    reserves: ReservePair,
    execute_calls: AtomicUsize,
    executed: Mutex<Vec<(String, u128)>>,
    notifications: Mutex<Vec<String>>,
}

impl FakePool {
    fn new(base: u128, quote: u128) -> Arc<Self> {
        Arc::new(Self {
            reserves: ReservePair::new(base, quote),
            execute_calls: AtomicUsize::new(0),
            executed: Mutex::new(Vec::new()),
            notifications: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl QuoteSimulator for FakePool {
    async fn simulate(
        &self,
        offer_denom: &str,
        offer_amount: u128,
    ) -> zigpool_trader::Result<u128> {
        let (reserve_in, reserve_out) = if offer_denom == BASE_DENOM {
            (self.reserves.base, self.reserves.quote)
        } else {
            (self.reserves.quote, self.reserves.base)
        };
        Ok(reserve_out * offer_amount / (reserve_in + offer_amount))
    }
}

#[async_trait]
impl BalanceProvider for FakePool {
    async fn balances(&self, _address: &str) -> zigpool_trader::Result<WalletBalances> {
        Ok(WalletBalances {
            base: BASE_RESERVE,
            quote: QUOTE_RESERVE,
        })
    }
}

#[async_trait]
impl SwapExecutor for FakePool {
    async fn execute(
        &self,
        offer_denom: &str,
        offer_amount: u128,
        _max_spread: f64,
    ) -> zigpool_trader::Result<ExecutionOutcome> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        self.executed
            .lock()
            .unwrap()
            .push((offer_denom.to_string(), offer_amount));
        Ok(ExecutionOutcome::Submitted {
            tx_hash: "F00D".to_string(),
        })
    }
}

#[async_trait]
impl Notifier for FakePool {
    async fn notify(&self, text: &str, _tx_hash: Option<&str>) {
        self.notifications.lock().unwrap().push(text.to_string());
    }
}

fn test_config(state_dir: &std::path::Path) -> AppConfig {
    let mut config = AppConfig {
        chain: Default::default(),
        trading: Default::default(),
        telegram: None,
        settings: Default::default(),
    };
    config.chain.base_denom = BASE_DENOM.to_string();
    config.chain.quote_denom = QUOTE_DENOM.to_string();
    config.chain.wallet_address = Some("zig1wallet".to_string());
    config.trading.cooldown_ms = 0;
    config.trading.upper_target = 1.028;
    config.trading.trade_unit = 5_000.0;
    config.trading.wallet_max_ratio = 0.5;
    config.trading.pool_max_ratio = 0.5;
    config.trading.max_impact_bps = 5_000;
    config.trading.size_tiers = vec![0.000001, 5_000.0];
    config.settings.state_file = state_dir
        .join("zone_state.json")
        .to_string_lossy()
        .into_owned();
    config
}

fn trader_for(config: &AppConfig, pool: &Arc<FakePool>) -> ZoneTrader {
    ZoneTrader::new(
        config,
        TraderDeps {
            simulator: pool.clone(),
            balances: pool.clone(),
            executor: pool.clone(),
            notifier: pool.clone(),
        },
    )
}

async fn drain(trader: &ZoneTrader) {
    while !trader.idle() {
        tokio::task::yield_now().await;
    }
}

/// A flat-shape stream message carrying the given reserves
fn flat_message(base: u128, quote: u128) -> serde_json::Value {
    json!({
        "jsonrpc": "2.0",
        "id": "1",
        "result": {
            "events": {
                "wasm._contract_address": ["zig1pool"],
                "wasm.action": ["swap"],
                "wasm.reserves": [format!("{}:{},{}:{}", BASE_DENOM, base, QUOTE_DENOM, quote)]
            }
        }
    })
}

/// A nested-shape stream message with base64 attributes
fn nested_message(base: u128, quote: u128) -> serde_json::Value {
    let reserves = format!("{}:{},{}:{}", BASE_DENOM, base, QUOTE_DENOM, quote);
    json!({
        "jsonrpc": "2.0",
        "result": {
            "data": {
                "value": {
                    "TxResult": {
                        "result": {
                            "events": [{
                                "type": "wasm",
                                "attributes": [
                                    { "key": BASE64.encode("action"), "value": BASE64.encode("swap") },
                                    { "key": BASE64.encode("reserves"), "value": BASE64.encode(&reserves) }
                                ]
                            }]
                        }
                    }
                }
            }
        }
    })
}

fn event_from(msg: &serde_json::Value) -> Option<PoolEvent> {
    extract_reserves(msg).map(|reserves| PoolEvent::ReserveUpdate { reserves })
}

#[tokio::test]
async fn test_flat_message_triggers_sized_sell() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let pool = FakePool::new(BASE_RESERVE, QUOTE_RESERVE);
    let mut trader = trader_for(&config, &pool);

    // Price 1.03 lands in the topmost buy-quote zone.
    let event = event_from(&flat_message(BASE_RESERVE, QUOTE_RESERVE)).unwrap();
    trader.on_event(event);
    drain(&trader).await;

    assert_eq!(pool.execute_calls.load(Ordering::SeqCst), 1);
    let executed = pool.executed.lock().unwrap();
    // Buying quote offers the base asset.
    assert_eq!(executed[0].0, BASE_DENOM);
    let offer = executed[0].1;
    assert!(offer > 0);

    // The constant-product projection of the executed offer must land on
    // the upper target: proj = Q * B / (B + offer)^2.
    let proj = QUOTE_RESERVE as f64 * BASE_RESERVE as f64
        / ((BASE_RESERVE as f64 + offer as f64) * (BASE_RESERVE as f64 + offer as f64));
    assert!(
        (proj - 1.028).abs() <= 1e-5,
        "projected price {} not within 1e-5 of 1.028",
        proj
    );

    assert_eq!(pool.notifications.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_nested_message_decodes_and_triggers() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let pool = FakePool::new(BASE_RESERVE, QUOTE_RESERVE);
    let mut trader = trader_for(&config, &pool);

    let event = event_from(&nested_message(BASE_RESERVE, QUOTE_RESERVE)).unwrap();
    trader.on_event(event);
    drain(&trader).await;

    assert_eq!(pool.execute_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_message_without_reserves_produces_no_event() {
    let msg = json!({
        "jsonrpc": "2.0",
        "id": "2",
        "result": {
            "events": { "wasm.action": ["swap"] }
        }
    });
    assert!(event_from(&msg).is_none());
}

#[tokio::test]
async fn test_neutral_price_never_triggers() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let pool = FakePool::new(BASE_RESERVE, BASE_RESERVE * 101 / 100);
    let mut trader = trader_for(&config, &pool);

    // Price 1.01 sits between the buy-base and buy-quote zone tables.
    let event = event_from(&flat_message(BASE_RESERVE, BASE_RESERVE * 101 / 100)).unwrap();
    trader.on_event(event);
    drain(&trader).await;

    assert_eq!(pool.execute_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_smoothing_delays_zone_entry_across_samples() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.trading.smoothing_alpha = 0.1;
    let pool = FakePool::new(BASE_RESERVE, QUOTE_RESERVE);
    let mut trader = trader_for(&config, &pool);

    // Seed the filter in the gap between the two zone tables.
    let neutral = BASE_RESERVE * 1008 / 1000;
    trader.on_event(event_from(&flat_message(BASE_RESERVE, neutral)).unwrap());
    drain(&trader).await;

    // One spike to 1.03: the EMA moves to ~1.0102, still below every
    // buy-quote zone.
    trader.on_event(event_from(&flat_message(BASE_RESERVE, QUOTE_RESERVE)).unwrap());
    drain(&trader).await;
    assert_eq!(pool.execute_calls.load(Ordering::SeqCst), 0);

    // Repeated samples converge into a zone eventually.
    for _ in 0..20 {
        trader.on_event(event_from(&flat_message(BASE_RESERVE, QUOTE_RESERVE)).unwrap());
        drain(&trader).await;
    }
    assert!(pool.execute_calls.load(Ordering::SeqCst) >= 1);
}
