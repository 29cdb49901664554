//! The incremental linearizability decision procedure.
//!
//! [`ChainChecker`] consumes a time-ordered event stream once, left to
//! right, and maintains three pieces of state: the accepted write
//! chain, the in-flight (pending) writes, and the in-flight reads, each
//! tagged with the chain head at its start. Every violation the
//! register model admits is detected the moment its evidence is
//! complete:
//!
//! - a read returning a write superseded before the read began,
//! - a read returning a value other than the one proposed,
//! - two confirmed writes descending from the same predecessor,
//! - a completion or read naming a write nobody proposed.
//!
//! Because writes form a CAS chain (each names its predecessor), no
//! search over interleavings is needed: a pending write is acceptable
//! exactly when its predecessor path reaches the current chain head.

use crate::chain::WriteChain;
use crate::report::{CheckReport, Violation};
use log::debug;
use regchain_history::{Event, InvalidHistory};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

/// A proposed write whose position in the chain is not yet determined.
#[derive(Debug, Clone)]
struct PendingWrite<W, V> {
    prev_write_id: W,
    value: V,
}

/// An in-flight read, tagged with the chain head at its start.
#[derive(Debug, Clone)]
struct PendingRead<W> {
    started_at: u64,
    snapshot: W,
}

// ═══════════════════════════════════════════════════════════════════════
//  Checker state
// ═══════════════════════════════════════════════════════════════════════

/// Single-pass linearizability checker for one register history.
///
/// Owned, mutable, and purely sequential; feed it events in
/// non-decreasing time order via [`apply`](Self::apply) and collect the
/// verdict with [`into_report`](Self::into_report). The first violation
/// latches: later events are ignored.
pub struct ChainChecker<W, V> {
    /// Every write id ever seen, accepted or pending.
    write_ids: HashSet<W>,
    chain: WriteChain<W, V>,
    pending_writes: HashMap<W, PendingWrite<W, V>>,
    /// At most one pending read per process.
    pending_reads: HashMap<u64, PendingRead<W>>,
    violation: Option<Violation<W, V>>,
    last_ts: u64,
    events_processed: usize,
    reads_checked: usize,
}

impl<W, V> ChainChecker<W, V>
where
    W: Clone + Eq + Hash + fmt::Debug + fmt::Display,
    V: Clone + PartialEq + fmt::Debug,
{
    /// A checker seeded with the genesis write (`lts = 0`).
    pub fn new(genesis_write_id: W, genesis_value: V) -> Self {
        let mut write_ids = HashSet::new();
        write_ids.insert(genesis_write_id.clone());
        Self {
            write_ids,
            chain: WriteChain::new(genesis_write_id, genesis_value),
            pending_writes: HashMap::new(),
            pending_reads: HashMap::new(),
            violation: None,
            last_ts: 0,
            events_processed: 0,
            reads_checked: 0,
        }
    }

    /// Consume one event.
    ///
    /// `Err` means the history itself is malformed; a linearizability
    /// violation is not an `Err` but a latched verdict, observable via
    /// [`violation`](Self::violation). Once a violation is latched,
    /// further events are ignored.
    pub fn apply(&mut self, event: Event<W, V>) -> Result<(), InvalidHistory<W>> {
        if self.violation.is_some() {
            return Ok(());
        }
        self.events_processed += 1;
        match event {
            Event::InvokeWrite {
                time,
                write_id,
                prev,
                value,
                ..
            } => self.start_write(time, prev, write_id, value),
            Event::OkWrite { time, write_id, .. } => self.end_write(time, write_id),
            Event::InvokeRead { time, process } => self.start_read(time, process),
            Event::OkRead {
                time,
                process,
                write_id,
                value,
            } => self.end_read(time, process, write_id, value),
        }
    }

    /// Whether a violation has been latched.
    pub fn has_violation(&self) -> bool {
        self.violation.is_some()
    }

    /// The latched violation, if any.
    pub fn violation(&self) -> Option<&Violation<W, V>> {
        self.violation.as_ref()
    }

    /// The accepted chain.
    pub fn chain(&self) -> &WriteChain<W, V> {
        &self.chain
    }

    /// Number of distinct write ids seen, accepted or pending.
    pub fn seen_write_count(&self) -> usize {
        self.write_ids.len()
    }

    /// Number of writes still pending.
    pub fn pending_write_count(&self) -> usize {
        self.pending_writes.len()
    }

    /// Produce the final verdict.
    pub fn into_report(self) -> CheckReport<W, V> {
        CheckReport {
            valid: self.violation.is_none(),
            events_processed: self.events_processed,
            accepted_writes: self.chain.len(),
            pending_writes: self.pending_writes.len(),
            reads_checked: self.reads_checked,
            violation: self.violation,
        }
    }

    // ── Event handlers ──────────────────────────────────────────────

    fn advance_clock(&mut self, ts: u64) -> Result<(), InvalidHistory<W>> {
        if ts < self.last_ts {
            return Err(InvalidHistory::NonMonotonicTime {
                last: self.last_ts,
                current: ts,
            });
        }
        self.last_ts = ts;
        Ok(())
    }

    /// `invoke write`: record the proposal. No chain mutation.
    fn start_write(
        &mut self,
        ts: u64,
        prev: W,
        write_id: W,
        value: V,
    ) -> Result<(), InvalidHistory<W>> {
        self.advance_clock(ts)?;
        if !self.write_ids.insert(write_id.clone()) {
            return Err(InvalidHistory::DuplicateWriteId { write_id });
        }
        self.pending_writes.insert(
            write_id,
            PendingWrite {
                prev_write_id: prev,
                value,
            },
        );
        Ok(())
    }

    /// `ok write`: the write is confirmed. If a read already observed
    /// it the chain position is settled and only the clock advances.
    fn end_write(&mut self, ts: u64, write_id: W) -> Result<(), InvalidHistory<W>> {
        self.advance_clock(ts)?;
        if !self.chain.contains(&write_id) {
            self.observe_write(ts, write_id);
        }
        Ok(())
    }

    /// Promote `write_id` (and transitively every unaccepted
    /// predecessor it depends on) into the accepted chain, or latch the
    /// conflict that prevents it.
    ///
    /// Walks `prev_write_id` back through the pending set until an
    /// accepted record anchors the walk. A pending write is acceptable
    /// exactly when that anchor is the chain head; an anchor with an
    /// occupied successor slot means two writes descend from the same
    /// record, which the CAS protocol forbids.
    fn observe_write(&mut self, ts: u64, write_id: W) {
        let mut tail = Vec::new();
        let mut cursor = write_id;
        while let Some(pending) = self.pending_writes.remove(&cursor) {
            let prev = pending.prev_write_id;
            tail.push((cursor, pending.value));
            cursor = prev;
        }
        tail.reverse();

        if !self.chain.contains(&cursor) {
            debug!("write linkage dangles at unknown id {}", cursor);
            self.violation = Some(Violation::UnknownWrite { write_id: cursor });
            return;
        }
        if let Some(opponent) = self.chain.successor(&cursor) {
            let chain: Vec<W> = tail.iter().map(|(id, _)| id.clone()).collect();
            debug!(
                "branch at {}: accepted successor {}, proposed {:?}",
                cursor, opponent, chain
            );
            self.violation = Some(Violation::BranchingChain {
                anchor: cursor,
                chain,
                opponent,
            });
            return;
        }
        for (id, value) in tail {
            let lts = self.chain.accept(id.clone(), value, ts);
            debug!("accepted write {} (lts {}, t {})", id, lts, ts);
        }
    }

    /// `invoke read`: snapshot the chain head. Whatever the read
    /// returns must be at least this fresh.
    fn start_read(&mut self, ts: u64, process: u64) -> Result<(), InvalidHistory<W>> {
        self.advance_clock(ts)?;
        if self.pending_reads.contains_key(&process) {
            return Err(InvalidHistory::DuplicatePendingRead { process });
        }
        self.pending_reads.insert(
            process,
            PendingRead {
                started_at: ts,
                snapshot: self.chain.latest().clone(),
            },
        );
        Ok(())
    }

    /// `ok read`: resolve the returned write, accepting it first if it
    /// was still pending, then check freshness and value.
    fn end_read(
        &mut self,
        ts: u64,
        process: u64,
        write_id: W,
        value: V,
    ) -> Result<(), InvalidHistory<W>> {
        self.advance_clock(ts)?;
        let Some(pending) = self.pending_reads.remove(&process) else {
            return Err(InvalidHistory::MissingInvoke { process });
        };
        if self.chain.contains(&write_id) {
            self.check_read(pending, write_id, value);
        } else if self.pending_writes.contains_key(&write_id) {
            self.observe_write(ts, write_id.clone());
            if self.violation.is_none() {
                debug_assert!(self.chain.latest() == &write_id);
                self.check_read(pending, write_id, value);
            }
        } else {
            self.violation = Some(Violation::UnknownWrite { write_id });
        }
        Ok(())
    }

    /// The read returned an accepted write; it must be at least as
    /// fresh as the head snapshotted at read start, and carry the value
    /// proposed with it.
    fn check_read(&mut self, pending: PendingRead<W>, write_id: W, value: V) {
        self.reads_checked += 1;
        let (known_lts, known_observed_at) = match self.chain.get(&pending.snapshot) {
            Some(record) => (record.lts, record.observed_at),
            None => return,
        };
        let (seen_lts, seen_value) = match self.chain.get(&write_id) {
            Some(record) => (record.lts, record.value.clone()),
            None => return,
        };
        if known_lts > seen_lts {
            let fresher_chain = self.chain.path_back(&pending.snapshot, &write_id);
            self.violation = Some(Violation::StaleRead {
                write_id,
                fresher_chain,
                superseded_at: known_observed_at,
                read_started_at: pending.started_at,
            });
        } else if seen_value != value {
            self.violation = Some(Violation::ValueMismatch {
                write_id,
                expected: seen_value,
                got: value,
            });
        }
    }
}
