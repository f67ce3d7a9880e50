//! Price filtering, zone classification, gating and trade sizing
//!
//! The decision pipeline runs these stages in order on every reserve update:
//!
//! ```text
//! reserves ──> PriceFilter ──> ZoneClassifier ──> ZoneExecutionGate ──> TradeSizer
//!              (EMA smooth)    (zone + cooldown)  (per-zone hourly)     (caps + sim
//!                                                                       binary search)
//! ```
//!
//! Each stage can veto the trigger; only a sample that clears all of them
//! reaches the execution collaborators.

pub mod filter;
pub mod gate;
pub mod sizing;
pub mod zones;

pub use filter::{compute_raw_price, FilteredPrice, PriceFilter};
pub use gate::ZoneExecutionGate;
pub use sizing::{to_units, SizedOffer, TradeSizer};
pub use zones::{normalize_band, zone_contains, ZoneClassifier};
