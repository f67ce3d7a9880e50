//! Price computation and exponential smoothing

use crate::common::types::ReservePair;

/// Fixed-point scale used when dividing the raw reserve integers
///
/// Reserves can exceed 2^53, so the ratio is taken in integer space first and
/// only the scaled quotient is converted to floating point.
pub const PRICE_SCALE: u128 = 1_000_000;

/// Minimum filtered-price movement worth reporting
const REPORT_EPSILON: f64 = 1e-5;

/// One filtered price sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilteredPrice {
    /// Price computed fresh from the latest reserves
    pub raw: f64,
    /// Exponentially smoothed price
    pub filtered: f64,
    /// Whether the filtered value moved enough since the last report
    pub changed: bool,
}

/// Compute the raw quote/base price from a reserve pair
///
/// Returns `None` when the base reserve is zero (no price yet — the caller
/// must skip all trade logic for this sample).
pub fn compute_raw_price(reserves: &ReservePair) -> Option<f64> {
    if reserves.base == 0 {
        return None;
    }
    let scaled = reserves.quote.checked_mul(PRICE_SCALE)? / reserves.base;
    Some(scaled as f64 / PRICE_SCALE as f64)
}

/// Exponential moving-average filter over the raw price
///
/// The first observed value seeds the filter; an alpha of zero (or less)
/// degenerates to passthrough.
#[derive(Debug, Clone)]
pub struct PriceFilter {
    alpha: f64,
    smoothed: Option<f64>,
    last_reported: Option<f64>,
}

impl PriceFilter {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            smoothed: None,
            last_reported: None,
        }
    }

    /// The latest filtered price, if any raw value has been observed
    pub fn current(&self) -> Option<f64> {
        self.smoothed
    }

    /// Fold one raw price into the filter
    pub fn update(&mut self, raw: f64) -> FilteredPrice {
        let filtered = match self.smoothed {
            Some(prev) if self.alpha > 0.0 => prev + self.alpha * (raw - prev),
            _ => raw,
        };
        self.smoothed = Some(filtered);

        let changed = match self.last_reported {
            Some(last) => (filtered - last).abs() >= REPORT_EPSILON,
            None => true,
        };
        if changed {
            self.last_reported = Some(filtered);
        }

        FilteredPrice {
            raw,
            filtered,
            changed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_raw_price_zero_base() {
        assert_eq!(compute_raw_price(&ReservePair::new(0, 100)), None);
    }

    #[test]
    fn test_raw_price_simple_ratio() {
        let price = compute_raw_price(&ReservePair::new(1_000_000, 1_030_000)).unwrap();
        assert!((price - 1.03).abs() < 1e-9);
    }

    #[test]
    fn test_raw_price_precision_at_large_magnitudes() {
        // Reserves around 10^18 stay within 1e-6 relative error.
        let base = 1_000_000_000_000_000_000u128;
        let quote = 1_030_000_000_000_000_000u128;
        let price = compute_raw_price(&ReservePair::new(base, quote)).unwrap();
        assert!((price - 1.03).abs() / 1.03 < 1e-6);
    }

    #[test]
    fn test_first_update_seeds_filter() {
        let mut filter = PriceFilter::new(0.25);
        let sample = filter.update(1.02);
        assert_eq!(sample.filtered, 1.02);
        assert!(sample.changed);
    }

    #[test]
    fn test_zero_alpha_is_passthrough() {
        let mut filter = PriceFilter::new(0.0);
        filter.update(1.00);
        let sample = filter.update(1.05);
        assert_eq!(sample.filtered, 1.05);
        let sample = filter.update(0.97);
        assert_eq!(sample.filtered, 0.97);
    }

    #[test]
    fn test_smoothing_converges_on_constant_input() {
        let mut filter = PriceFilter::new(0.25);
        filter.update(1.00);
        let mut last = 0.0;
        for _ in 0..100 {
            last = filter.update(1.05).filtered;
        }
        assert!((last - 1.05).abs() < 1e-9);
    }

    #[test]
    fn test_smoothing_damps_single_spike() {
        let mut filter = PriceFilter::new(0.25);
        filter.update(1.00);
        let sample = filter.update(2.00);
        assert_eq!(sample.filtered, 1.25);
    }

    #[test]
    fn test_report_dedupe_below_epsilon() {
        let mut filter = PriceFilter::new(0.0);
        assert!(filter.update(1.0).changed);
        // Sub-epsilon movement is suppressed.
        assert!(!filter.update(1.0 + 1e-7).changed);
        // A full-epsilon move from the last *reported* value fires again.
        assert!(filter.update(1.0 + 2e-5).changed);
    }
}
