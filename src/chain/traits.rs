//! Contracts for the external chain collaborators
//!
//! The decision engine only ever talks to the chain through these narrow
//! seams: quote simulation for projections, balance lookups for sizing caps,
//! swap execution, and operator notification.

use async_trait::async_trait;

use crate::common::errors::Result;

/// Wallet balances of the two traded assets, in smallest units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalletBalances {
    pub base: u128,
    pub quote: u128,
}

/// Terminal outcome of one execution attempt
///
/// Both variants end the trigger; the core never retries internally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Swap submitted to the chain
    Submitted { tx_hash: String },
    /// Swap intentionally not submitted (e.g. dry run)
    Skipped { reason: String },
}

/// Simulates a swap quote; used only for projection, never mutates state
#[async_trait]
pub trait QuoteSimulator: Send + Sync {
    /// Returns the simulated return amount for offering `offer_amount` of
    /// `offer_denom` into the pool
    async fn simulate(&self, offer_denom: &str, offer_amount: u128) -> Result<u128>;
}

/// Looks up wallet balances for the trading account
#[async_trait]
pub trait BalanceProvider: Send + Sync {
    async fn balances(&self, address: &str) -> Result<WalletBalances>;
}

/// Submits the actual swap transaction
#[async_trait]
pub trait SwapExecutor: Send + Sync {
    async fn execute(
        &self,
        offer_denom: &str,
        offer_amount: u128,
        max_spread: f64,
    ) -> Result<ExecutionOutcome>;
}

/// Delivers free-form messages to operators; failures are swallowed
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str, tx_hash: Option<&str>);
}

/// Notifier that drops every message
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _text: &str, _tx_hash: Option<&str>) {}
}
