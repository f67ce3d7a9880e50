//! Per-zone hourly execution gate

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::common::errors::{Result, TraderError};

/// Deduplicates zone triggers per hour bucket using a persisted label map
///
/// State is loaded once at startup and rewritten wholesale after each trigger.
/// Buckets only move forward in practice; no ordering is enforced, so a clock
/// rollback can re-arm a zone (the system clock is trusted).
#[derive(Debug)]
pub struct ZoneExecutionGate {
    path: PathBuf,
    state: HashMap<String, String>,
}

impl ZoneExecutionGate {
    /// Load persisted state; a missing file yields empty state, not an error
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(state) => state,
                Err(e) => {
                    warn!("Ignoring unreadable zone state {}: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self { path, state }
    }

    /// The hour-granularity UTC bucket key for a timestamp
    pub fn bucket_for(now: DateTime<Utc>) -> String {
        now.format("%Y-%m-%dT%H").to_string()
    }

    /// Whether a trigger for this zone label is allowed at `now`
    ///
    /// Allowed iff no bucket is stored for the label, or the stored bucket
    /// differs from the current one.
    pub fn check_allowed(&self, zone_label: &str, now: DateTime<Utc>) -> bool {
        let bucket = Self::bucket_for(now);
        self.state.get(zone_label) != Some(&bucket)
    }

    /// Record a trigger and persist the full state map
    ///
    /// Persistence failures are logged and swallowed: the in-memory state
    /// stays authoritative for this process and the decision loop must never
    /// stall on a disk error.
    pub fn mark_executed(&mut self, zone_label: &str, bucket: String) {
        self.state.insert(zone_label.to_string(), bucket);
        if let Err(e) = self.persist() {
            warn!("Failed to persist zone state: {}", e);
        } else {
            debug!("Persisted zone state to {}", self.path.display());
        }
    }

    /// Path of the backing state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.state)?;
        std::fs::write(&self.path, json)
            .map_err(|e| TraderError::Persistence(format!("{}: {}", self.path.display(), e)))
    }
}
