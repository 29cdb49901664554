//! Saved histories: the on-disk container a harness hands the checker.
//!
//! A [`HistoryLog`] bundles the raw event records with everything a
//! check needs to interpret them: the client concurrency bound and the
//! seeded genesis write. Serialised as JSON.

use crate::events::RawEvent;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::path::Path;

/// The seeded root of the write chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenesisSeed<W, V> {
    /// Write id of the root record.
    pub write_id: W,
    /// Initial register value.
    pub value: V,
}

/// A recorded history: one harness run against the register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryLog<W, V> {
    /// Upper bound on concurrently active client threads.
    pub concurrency: usize,
    /// Root of the write chain (`lts = 0`).
    pub genesis: GenesisSeed<W, V>,
    /// Raw records in harness order.
    pub events: Vec<RawEvent<W, V>>,
}

impl<W, V> HistoryLog<W, V> {
    /// Create an empty log for a run with the given bounds and seed.
    pub fn new(concurrency: usize, genesis: GenesisSeed<W, V>) -> Self {
        Self {
            concurrency,
            genesis,
            events: Vec::new(),
        }
    }

    /// Number of raw records in the history.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the history holds no records.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Record counts keyed by `"<kind> <operation>"`.
    pub fn summary(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for event in &self.events {
            *counts
                .entry(format!("{} {}", event.kind, event.f))
                .or_insert(0) += 1;
        }
        counts
    }
}

impl<W, V> HistoryLog<W, V>
where
    W: Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    /// Save the history to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load a history from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(io::Error::other)
    }
}
