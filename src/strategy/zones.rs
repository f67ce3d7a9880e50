//! Zone classification state machine

use std::time::{Duration, Instant};

use crate::common::types::{TradeIntent, TradeZone, ZoneMatch};

/// Epsilon tolerance applied to both zone bounds
const ZONE_EPSILON: f64 = 1e-9;

/// Minimum width enforced on a normalized band
const BAND_EPSILON: f64 = 1e-4;

/// Normalize a target band into a usable `(lower, upper)` pair
///
/// Non-finite bounds fall back to 0.99/1.01. A degenerate band (upper not
/// above lower) is widened by 5e-4 around its midpoint; the lower bound is
/// floored at zero and the upper bound kept strictly above the lower one.
pub fn normalize_band(lower: f64, upper: f64) -> (f64, f64) {
    let mut hi = if upper.is_finite() { upper } else { 1.01 };
    let mut lo = if lower.is_finite() { lower } else { 0.99 };
    if hi <= lo {
        let mid = (hi + lo) / 2.0;
        hi = mid + 0.0005;
        lo = mid - 0.0005;
    }
    if lo < 0.0 {
        lo = 0.0;
    }
    if hi <= lo {
        hi = lo + BAND_EPSILON;
    }
    (lo, hi)
}

/// Whether a price falls inside a zone, with epsilon tolerance on both bounds
pub fn zone_contains(price: f64, zone: &TradeZone) -> bool {
    price + ZONE_EPSILON >= zone.min && price - ZONE_EPSILON <= zone.max
}

/// Classifies filtered prices into zones and reports entry transitions
///
/// Zone lists are scanned in declared order, buy-base first; the earliest
/// containing zone wins, which is the tie-break rule when zones overlap.
/// A trigger fires only on a new `(intent, index)` match; leaving all zones
/// resets the state so a later re-entry triggers again. A global cooldown
/// suppresses every trigger, legitimate transitions included.
#[derive(Debug, Clone)]
pub struct ZoneClassifier {
    buy_base_zones: Vec<TradeZone>,
    buy_quote_zones: Vec<TradeZone>,
    cooldown: Duration,
    last_zone: Option<(TradeIntent, usize)>,
    last_trigger_at: Option<Instant>,
}

impl ZoneClassifier {
    pub fn new(
        buy_base_zones: Vec<TradeZone>,
        buy_quote_zones: Vec<TradeZone>,
        cooldown: Duration,
    ) -> Self {
        Self {
            buy_base_zones,
            buy_quote_zones,
            cooldown,
            last_zone: None,
            last_trigger_at: None,
        }
    }

    /// Match a price against the zone lists without touching transition state
    pub fn classify(&self, price: f64) -> Option<ZoneMatch> {
        for (index, zone) in self.buy_base_zones.iter().enumerate() {
            if zone_contains(price, zone) {
                return Some(ZoneMatch {
                    intent: TradeIntent::BuyBase,
                    zone_index: index,
                    zone: zone.clone(),
                });
            }
        }
        for (index, zone) in self.buy_quote_zones.iter().enumerate() {
            if zone_contains(price, zone) {
                return Some(ZoneMatch {
                    intent: TradeIntent::BuyQuote,
                    zone_index: index,
                    zone: zone.clone(),
                });
            }
        }
        None
    }

    /// Feed one filtered price sample; returns a match only on a fresh trigger
    ///
    /// A trigger suppressed by the cooldown leaves the transition state
    /// untouched, so the same entry fires once the cooldown has elapsed.
    pub fn observe(&mut self, price: f64, now: Instant) -> Option<ZoneMatch> {
        let Some(matched) = self.classify(price) else {
            self.last_zone = None;
            return None;
        };

        if self.last_zone == Some(matched.key()) {
            return None;
        }

        if !self.cooldown.is_zero() {
            if let Some(last) = self.last_trigger_at {
                if now.duration_since(last) < self.cooldown {
                    return None;
                }
            }
        }

        self.last_trigger_at = Some(now);
        self.last_zone = Some(matched.key());
        Some(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(min: f64, max: f64, label: &str) -> TradeZone {
        TradeZone {
            min,
            max,
            size: 1.0,
            label: label.to_string(),
            order_id: label.to_string(),
        }
    }

    fn classifier(cooldown: Duration) -> ZoneClassifier {
        ZoneClassifier::new(
            vec![zone(0.99, 1.0, "base-low"), zone(1.0001, 1.001, "base-high")],
            vec![zone(1.012, 1.015, "quote-low"), zone(1.0151, 1.018, "quote-high")],
            cooldown,
        )
    }

    #[test]
    fn test_normalize_band_passthrough() {
        assert_eq!(normalize_band(0.991, 1.038), (0.991, 1.038));
    }

    #[test]
    fn test_normalize_band_degenerate() {
        let (lo, hi) = normalize_band(1.02, 1.0);
        assert!(hi > lo);
        assert!((hi - lo - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_band_non_finite_and_negative() {
        let (lo, hi) = normalize_band(f64::NAN, f64::INFINITY);
        assert_eq!((lo, hi), (0.99, 1.01));

        let (lo, hi) = normalize_band(-0.01, -0.005);
        assert_eq!(lo, 0.0);
        assert!(hi > lo);
    }

    #[test]
    fn test_zone_contains_epsilon_bounds() {
        let z = zone(1.0, 1.01, "z");
        assert!(zone_contains(1.0, &z));
        assert!(zone_contains(1.0 - 5e-10, &z));
        assert!(zone_contains(1.01 + 5e-10, &z));
        assert!(!zone_contains(1.0101, &z));
    }

    #[test]
    fn test_overlapping_zones_earliest_declared_wins() {
        let c = ZoneClassifier::new(
            vec![zone(1.0, 1.02, "first"), zone(1.01, 1.03, "second")],
            vec![],
            Duration::ZERO,
        );
        let m = c.classify(1.015).unwrap();
        assert_eq!(m.zone.label, "first");
        assert_eq!(m.zone_index, 0);
    }

    #[test]
    fn test_buy_base_list_scanned_before_buy_quote() {
        let c = ZoneClassifier::new(
            vec![zone(1.0, 1.02, "base")],
            vec![zone(1.0, 1.02, "quote")],
            Duration::ZERO,
        );
        assert_eq!(c.classify(1.01).unwrap().intent, TradeIntent::BuyBase);
    }

    #[test]
    fn test_transition_fires_once_per_entry() {
        let mut c = classifier(Duration::ZERO);
        let now = Instant::now();

        assert!(c.observe(0.995, now).is_some());
        for _ in 0..10 {
            assert!(c.observe(0.9951, now).is_none());
        }
        // Crossing into a second zone fires exactly once more.
        assert!(c.observe(1.013, now).is_some());
        assert!(c.observe(1.013, now).is_none());
    }

    #[test]
    fn test_reentry_after_leaving_triggers_again() {
        let mut c = classifier(Duration::ZERO);
        let now = Instant::now();

        assert!(c.observe(0.995, now).is_some());
        // Leaving all zones resets the state.
        assert!(c.observe(1.005, now).is_none());
        assert!(c.observe(0.995, now).is_some());
    }

    #[test]
    fn test_cooldown_suppresses_new_transition() {
        let mut c = classifier(Duration::from_secs(10));
        let start = Instant::now();

        assert!(c.observe(0.995, start).is_some());
        // A genuine new-zone transition inside the cooldown is suppressed...
        assert!(c
            .observe(1.013, start + Duration::from_secs(5))
            .is_none());
        // ...and fires once the cooldown has elapsed.
        assert!(c
            .observe(1.013, start + Duration::from_secs(11))
            .is_some());
    }
}
