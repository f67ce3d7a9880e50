//! Swap execution implementations

use async_trait::async_trait;
use tracing::info;

use super::traits::{ExecutionOutcome, SwapExecutor};
use crate::common::errors::Result;

/// Executor that never submits a transaction
///
/// Signing and broadcasting are external concerns; without a configured
/// signer every trigger resolves to a logged skip, which keeps the rest of
/// the pipeline (sizing, gating, notification) fully exercised.
pub struct DryRunExecutor;

#[async_trait]
impl SwapExecutor for DryRunExecutor {
    async fn execute(
        &self,
        offer_denom: &str,
        offer_amount: u128,
        _max_spread: f64,
    ) -> Result<ExecutionOutcome> {
        info!(
            "Dry run: swap of {} {} skipped (no signing key configured)",
            offer_amount, offer_denom
        );
        Ok(ExecutionOutcome::Skipped {
            reason: "dry run: no signing key configured".to_string(),
        })
    }
}
