//! Trade sizing: safety caps and simulated-quote binary search

use tracing::{debug, warn};

use crate::chain::traits::{QuoteSimulator, WalletBalances};
use crate::common::types::{ReservePair, Side, TradeContext};
use crate::config::types::TradingConfig;

/// Fixed-point scale for ratio caps
pub const RATIO_SCALE: u128 = 1_000_000;

/// Maximum binary-search iterations per sizing attempt
const MAX_SEARCH_STEPS: usize = 14;

/// Acceptable distance between projected price and target
const TARGET_EPSILON: f64 = 1e-5;

/// Final integer offer picked by the sizing engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizedOffer {
    /// Offer amount in the smallest unit of the offered asset
    pub amount: u128,
    /// Projected post-trade price, when simulation produced one
    pub projected_price: Option<f64>,
}

/// Convert a whole-unit amount to smallest units for the given exponent
pub fn to_units(amount: f64, exponent: u32) -> u128 {
    if !amount.is_finite() || amount <= 0.0 {
        return 0;
    }
    (amount * 10f64.powi(exponent as i32)).round() as u128
}

fn clamp_amount(n: u128, lo: u128, hi: u128) -> u128 {
    if n < lo {
        lo
    } else if n > hi {
        hi
    } else {
        n
    }
}

fn min_positive(values: &[u128]) -> u128 {
    values
        .iter()
        .copied()
        .filter(|v| *v > 0)
        .min()
        .unwrap_or(0)
}

/// Computes bounded offer amounts for triggered zones
///
/// Every cap is evaluated in integer space with a 10^6 ratio scale before the
/// binary search runs; a zero configured cap disables trading entirely.
#[derive(Debug, Clone)]
pub struct TradeSizer {
    wallet_ratio_scaled: u128,
    pool_ratio_scaled: u128,
    max_impact_bps: u128,
    size_tiers: Vec<f64>,
    base_denom: String,
    quote_denom: String,
    base_exponent: u32,
    quote_exponent: u32,
}

impl TradeSizer {
    pub fn new(
        trading: &TradingConfig,
        base_denom: impl Into<String>,
        quote_denom: impl Into<String>,
        base_exponent: u32,
        quote_exponent: u32,
    ) -> Self {
        let scale = RATIO_SCALE as f64;
        let ratio_to_scaled = |ratio: f64| -> u128 {
            if ratio > 0.0 {
                ((ratio * scale).round() as u128).max(1)
            } else {
                0
            }
        };
        Self {
            wallet_ratio_scaled: ratio_to_scaled(trading.wallet_max_ratio),
            pool_ratio_scaled: ratio_to_scaled(trading.pool_max_ratio),
            max_impact_bps: trading.max_impact_bps as u128,
            size_tiers: trading.size_tiers.clone(),
            base_denom: base_denom.into(),
            quote_denom: quote_denom.into(),
            base_exponent,
            quote_exponent,
        }
    }

    /// Denom offered for the given side (selling offers the base asset)
    pub fn offered_denom(&self, side: Side) -> &str {
        match side {
            Side::Sell => &self.base_denom,
            Side::Buy => &self.quote_denom,
        }
    }

    /// Decimal exponent of the offered denom
    pub fn offered_exponent(&self, side: Side) -> u32 {
        match side {
            Side::Sell => self.base_exponent,
            Side::Buy => self.quote_exponent,
        }
    }

    fn offered_pool_balance(side: Side, reserves: &ReservePair) -> u128 {
        match side {
            Side::Sell => reserves.base,
            Side::Buy => reserves.quote,
        }
    }

    fn offered_wallet_balance(side: Side, balances: &WalletBalances) -> u128 {
        match side {
            Side::Sell => balances.base,
            Side::Buy => balances.quote,
        }
    }

    /// Combined wallet/pool ratio cap; zero when either ratio is disabled
    pub fn ratio_cap(
        &self,
        side: Side,
        reserves: &ReservePair,
        balances: &WalletBalances,
    ) -> u128 {
        if self.wallet_ratio_scaled == 0 || self.pool_ratio_scaled == 0 {
            return 0;
        }
        let pool_cap = Self::offered_pool_balance(side, reserves) * self.pool_ratio_scaled
            / RATIO_SCALE;
        let wallet_cap = Self::offered_wallet_balance(side, balances) * self.wallet_ratio_scaled
            / RATIO_SCALE;
        pool_cap.min(wallet_cap)
    }

    /// Price-impact cap in smallest units of the offered asset
    pub fn impact_cap(&self, side: Side, reserves: &ReservePair) -> u128 {
        if self.max_impact_bps == 0 {
            return 0;
        }
        Self::offered_pool_balance(side, reserves) * self.max_impact_bps / 10_000
    }

    /// Clamp a desired amount to the configured caps
    ///
    /// Returns zero — "no trade" — when the amount or any configured cap is
    /// zero.
    pub fn cap_offer(
        &self,
        side: Side,
        reserves: &ReservePair,
        balances: &WalletBalances,
        amount: u128,
    ) -> u128 {
        if amount == 0 {
            return 0;
        }
        let ratio_cap = self.ratio_cap(side, reserves, balances);
        let impact_cap = self.impact_cap(side, reserves);
        if ratio_cap == 0 || impact_cap == 0 {
            return 0;
        }
        amount.min(ratio_cap.min(impact_cap))
    }

    /// Projected post-trade price for one simulated step
    ///
    /// Selling removes quote and adds base; buying mirrors. The division runs
    /// in floating point: relative error at 10^18 magnitudes is far below the
    /// 1e-5 target tolerance.
    fn projected_price(side: Side, reserves: &ReservePair, offer: u128, returned: u128) -> f64 {
        match side {
            Side::Sell => {
                (reserves.quote as f64 - returned as f64) / (reserves.base as f64 + offer as f64)
            }
            Side::Buy => {
                (reserves.quote as f64 + offer as f64) / (reserves.base as f64 - returned as f64)
            }
        }
    }

    /// Binary-search an offer whose projected price lands on the band target
    ///
    /// Runs up to 14 quote simulations. Selling aims at the upper target,
    /// buying at the lower one. Any simulation error aborts the loop; the best
    /// candidate seen so far is used if at least one step succeeded, otherwise
    /// sizing reports `None` and the caller falls back to capped fixed sizing.
    pub async fn size_with_simulation(
        &self,
        simulator: &dyn QuoteSimulator,
        side: Side,
        ctx: &TradeContext,
        balances: &WalletBalances,
        desired: u128,
    ) -> Option<SizedOffer> {
        let target = match side {
            Side::Sell => ctx.upper_target,
            Side::Buy => ctx.lower_target,
        };
        if !target.is_finite() {
            return None;
        }

        let exponent = self.offered_exponent(side);
        let min_tier = self.size_tiers.first().copied().unwrap_or(50.0);
        let max_tier = self.size_tiers.last().copied().unwrap_or(min_tier);
        let min_amount = to_units(min_tier, exponent);
        let max_tier_amount = to_units(max_tier, exponent);

        let reserves = &ctx.reserves;
        let ratio_cap = self.ratio_cap(side, reserves, balances);
        let impact_cap = self.impact_cap(side, reserves);
        if ratio_cap == 0 || impact_cap == 0 {
            return None;
        }

        let ceiling = if desired > 0 {
            min_positive(&[max_tier_amount, ratio_cap, impact_cap, desired])
        } else {
            min_positive(&[max_tier_amount, ratio_cap, impact_cap])
        };
        if ceiling == 0 {
            return None;
        }

        let floor = if desired > 0 && desired < min_amount {
            desired
        } else {
            min_amount
        };
        let mut lo = floor.min(ceiling);
        let mut hi = ceiling;
        let mut best = lo;
        let mut best_proj = f64::INFINITY;
        let mut best_dist = f64::INFINITY;
        let mut saw_valid = false;

        let denom = self.offered_denom(side).to_string();
        for _ in 0..MAX_SEARCH_STEPS {
            if lo > hi {
                break;
            }
            let mid = (lo + hi) / 2;
            let offer = clamp_amount(mid.max(1), lo, hi);

            let returned = match simulator.simulate(&denom, offer).await {
                Ok(returned) => returned,
                Err(e) => {
                    debug!("Simulation step failed: {}", e);
                    break;
                }
            };
            let proj = Self::projected_price(side, reserves, offer, returned);
            if !proj.is_finite() {
                warn!("Non-finite projected price for offer {}", offer);
                break;
            }

            let too_small = match side {
                Side::Sell => proj > target,
                Side::Buy => proj < target,
            };
            if too_small {
                lo = offer + 1;
            } else {
                hi = offer.saturating_sub(1);
            }

            saw_valid = true;
            let dist = (proj - target).abs();
            if dist < best_dist {
                best_dist = dist;
                best_proj = proj;
                best = offer;
            }
            debug!(
                "sim step side={} offer={} proj={:.6} target={:.6}",
                side, offer, proj, target
            );
            if dist <= TARGET_EPSILON {
                best = offer;
                best_proj = proj;
                break;
            }
        }

        if !saw_valid || !best_proj.is_finite() {
            debug!("No valid projection; caller falls back to capped sizing");
            return None;
        }
        let clamped = clamp_amount(best, min_amount, ceiling);
        if clamped == 0 {
            return None;
        }
        Some(SizedOffer {
            amount: clamped,
            projected_price: Some(best_proj),
        })
    }
}
