//! Reserve attribute parsing

use std::collections::HashMap;

use crate::common::errors::{Result, TraderError};
use crate::common::types::ReservePair;

/// Parse a `denom:amount,denom:amount` list into a balance map
///
/// Malformed parts (missing separator, non-integer amount) are skipped rather
/// than failing the whole attribute.
pub fn parse_reserves(raw: &str) -> HashMap<String, u128> {
    let mut out = HashMap::new();
    for part in raw.split(',') {
        let Some((denom, amount)) = part.split_once(':') else {
            continue;
        };
        let denom = denom.trim();
        if denom.is_empty() {
            continue;
        }
        if let Ok(amount) = amount.trim().parse::<u128>() {
            out.insert(denom.to_string(), amount);
        }
    }
    out
}

/// Resolve the configured base/quote denoms into a reserve pair
///
/// Lookup order per denom: exact match, then the bare suffix after the last
/// `.`, then any key ending in `.{suffix}` (factory denoms are sometimes
/// reported under shortened names).
pub fn resolve_pair(
    balances: &HashMap<String, u128>,
    base_denom: &str,
    quote_denom: &str,
) -> Result<ReservePair> {
    let base = lookup_denom(balances, base_denom);
    let quote = lookup_denom(balances, quote_denom);
    match (base, quote) {
        (Some(base), Some(quote)) => Ok(ReservePair::new(base, quote)),
        _ => Err(TraderError::ReserveParse(format!(
            "reserves missing {} or {}",
            base_denom, quote_denom
        ))),
    }
}

fn lookup_denom(balances: &HashMap<String, u128>, denom: &str) -> Option<u128> {
    if let Some(amount) = balances.get(denom) {
        return Some(*amount);
    }
    let suffix = denom.rsplit('.').next().unwrap_or(denom);
    if let Some(amount) = balances.get(suffix) {
        return Some(*amount);
    }
    let dotted = format!(".{}", suffix);
    balances
        .iter()
        .find(|(key, _)| key.ends_with(&dotted))
        .map(|(_, amount)| *amount)
}
