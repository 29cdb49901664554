//! The accepted write chain.
//!
//! Writes live in a flat id → record map; predecessor and successor
//! links are ids, never references, so the doubly linked chain carries
//! no ownership cycles. The chain is single: following `prev_write_id`
//! from the head reaches the genesis record, and `next_write_id` is the
//! inverse.

use std::collections::HashMap;
use std::hash::Hash;

/// A write accepted into the chain.
#[derive(Debug, Clone)]
pub struct WriteRecord<W, V> {
    /// Value proposed with the write.
    pub value: V,
    /// Predecessor id; `None` only for the genesis record.
    pub prev_write_id: Option<W>,
    /// Successor id, set once a successor is accepted.
    pub next_write_id: Option<W>,
    /// Logical acceptance timestamp, strictly increasing along the
    /// chain; the genesis record has `lts = 0`.
    pub lts: u64,
    /// Event time at which the write was accepted.
    pub observed_at: u64,
}

/// The single accepted chain, genesis through head.
#[derive(Debug, Clone)]
pub struct WriteChain<W, V> {
    records: HashMap<W, WriteRecord<W, V>>,
    latest: W,
}

impl<W, V> WriteChain<W, V>
where
    W: Clone + Eq + Hash,
{
    /// A chain holding only the seeded genesis write.
    pub fn new(genesis_write_id: W, genesis_value: V) -> Self {
        let mut records = HashMap::new();
        records.insert(
            genesis_write_id.clone(),
            WriteRecord {
                value: genesis_value,
                prev_write_id: None,
                next_write_id: None,
                lts: 0,
                observed_at: 0,
            },
        );
        Self {
            records,
            latest: genesis_write_id,
        }
    }

    /// Id of the chain head.
    pub fn latest(&self) -> &W {
        &self.latest
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &W) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &W) -> Option<&WriteRecord<W, V>> {
        self.records.get(id)
    }

    /// Successor of `id`, if one has been accepted.
    pub fn successor(&self, id: &W) -> Option<W> {
        self.records.get(id).and_then(|r| r.next_write_id.clone())
    }

    /// Append `write_id` to the head of the chain and return its `lts`.
    ///
    /// The caller must have established that the write's predecessor is
    /// the current head.
    pub fn accept(&mut self, write_id: W, value: V, observed_at: u64) -> u64 {
        let lts = self.records.get(&self.latest).map_or(0, |r| r.lts) + 1;
        if let Some(head) = self.records.get_mut(&self.latest) {
            head.next_write_id = Some(write_id.clone());
        }
        self.records.insert(
            write_id.clone(),
            WriteRecord {
                value,
                prev_write_id: Some(self.latest.clone()),
                next_write_id: None,
                lts,
                observed_at,
            },
        );
        self.latest = write_id;
        lts
    }

    /// All ids in the chain, genesis first.
    pub fn ids_from_genesis(&self) -> Vec<W> {
        let mut ids = Vec::with_capacity(self.records.len());
        let mut cursor = Some(self.latest.clone());
        while let Some(id) = cursor {
            cursor = self.records.get(&id).and_then(|r| r.prev_write_id.clone());
            ids.push(id);
        }
        ids.reverse();
        ids
    }

    /// The segment of the chain from `to` up to `from`, in causal
    /// (predecessor first) order. Walks `prev_write_id` from `from`;
    /// if `to` is not an ancestor the walk ends at the genesis record.
    pub fn path_back(&self, from: &W, to: &W) -> Vec<W> {
        let mut path = Vec::new();
        let mut cursor = Some(from.clone());
        while let Some(id) = cursor {
            cursor = if id == *to {
                None
            } else {
                self.records.get(&id).and_then(|r| r.prev_write_id.clone())
            };
            path.push(id);
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> WriteChain<&'static str, &'static str> {
        WriteChain::new("w0", "v0")
    }

    #[test]
    fn genesis_only() {
        let chain = chain();
        assert_eq!(chain.latest(), &"w0");
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.get(&"w0").unwrap().lts, 0);
        assert_eq!(chain.successor(&"w0"), None);
    }

    #[test]
    fn accept_links_and_numbers() {
        let mut chain = chain();
        assert_eq!(chain.accept("w1", "v1", 10), 1);
        assert_eq!(chain.accept("w2", "v2", 12), 2);

        assert_eq!(chain.latest(), &"w2");
        assert_eq!(chain.successor(&"w0"), Some("w1"));
        assert_eq!(chain.successor(&"w1"), Some("w2"));
        let w2 = chain.get(&"w2").unwrap();
        assert_eq!(w2.prev_write_id, Some("w1"));
        assert_eq!(w2.observed_at, 12);
    }

    #[test]
    fn ids_walk_from_genesis() {
        let mut chain = chain();
        chain.accept("w1", "v1", 1);
        chain.accept("w2", "v2", 2);
        assert_eq!(chain.ids_from_genesis(), vec!["w0", "w1", "w2"]);
    }

    #[test]
    fn path_back_stops_at_target() {
        let mut chain = chain();
        chain.accept("w1", "v1", 1);
        chain.accept("w2", "v2", 2);
        chain.accept("w3", "v3", 3);
        assert_eq!(chain.path_back(&"w2", &"w1"), vec!["w1", "w2"]);
        assert_eq!(chain.path_back(&"w3", &"w0"), vec!["w0", "w1", "w2", "w3"]);
    }
}
