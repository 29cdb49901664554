//! Check verdicts and their diagnostics.
//!
//! A [`Violation`] is the evidence a history is not linearizable; a
//! [`CheckReport`] is the overall outcome of one check. Both render
//! human-readable text naming the offending write ids, with conflicting
//! chains shown as `a -> b -> c`.

use std::fmt;

/// A linearizability violation, recorded the moment its evidence is
/// complete.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation<W, V> {
    /// A completion or read referenced a write nobody proposed.
    UnknownWrite { write_id: W },

    /// A write's predecessor is an interior chain node whose successor
    /// slot is already occupied: two confirmed writes descend from the
    /// same record.
    BranchingChain {
        /// The contested interior record.
        anchor: W,
        /// The rejected pending chain, predecessor first.
        chain: Vec<W>,
        /// The successor already accepted for `anchor`.
        opponent: W,
    },

    /// A read returned a write that had been superseded before the
    /// read began.
    StaleRead {
        /// The stale write the read returned.
        write_id: W,
        /// Chain from the stale write to the head the reader was
        /// guaranteed to see, predecessor first.
        fresher_chain: Vec<W>,
        /// Time at which that head was accepted.
        superseded_at: u64,
        /// Time at which the read began.
        read_started_at: u64,
    },

    /// A read's value disagrees with the value proposed for that write.
    ValueMismatch { write_id: W, expected: V, got: V },
}

fn render_chain<W: fmt::Display>(ids: &[W]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl<W, V> fmt::Display for Violation<W, V>
where
    W: fmt::Display,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::UnknownWrite { write_id } => {
                write!(f, "write id {} was never proposed by any invocation", write_id)
            }
            Violation::BranchingChain {
                anchor,
                chain,
                opponent,
            } => {
                write!(
                    f,
                    "{} already has successor {}, conflicting with proposed chain {}",
                    anchor,
                    opponent,
                    render_chain(chain)
                )
            }
            Violation::StaleRead {
                write_id,
                fresher_chain,
                superseded_at,
                read_started_at,
            } => {
                write!(
                    f,
                    "read started at t={} returned {}, already superseded at t={} by {}",
                    read_started_at,
                    write_id,
                    superseded_at,
                    render_chain(fresher_chain)
                )
            }
            Violation::ValueMismatch {
                write_id,
                expected,
                got,
            } => {
                write!(
                    f,
                    "read of {} returned {:?}, but {:?} was proposed",
                    write_id, got, expected
                )
            }
        }
    }
}

/// Outcome of checking one history.
#[derive(Debug, Clone)]
pub struct CheckReport<W, V> {
    /// Whether the history is linearizable.
    pub valid: bool,
    /// The violation that ended the check, when `valid` is false.
    pub violation: Option<Violation<W, V>>,
    /// Events consumed, including the violating one.
    pub events_processed: usize,
    /// Writes accepted into the chain, genesis included.
    pub accepted_writes: usize,
    /// Writes still pending when the check ended.
    pub pending_writes: usize,
    /// Reads completed and checked.
    pub reads_checked: usize,
}

impl<W, V> CheckReport<W, V>
where
    W: fmt::Display,
    V: fmt::Debug,
{
    /// Diagnostic text for the violation, if any.
    pub fn details(&self) -> Option<String> {
        self.violation.as_ref().map(ToString::to_string)
    }
}

impl<W, V> fmt::Display for CheckReport<W, V>
where
    W: fmt::Display,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            write!(
                f,
                "✅ LINEARIZABLE: {} events, {} accepted writes, {} reads checked",
                self.events_processed, self.accepted_writes, self.reads_checked
            )
        } else {
            writeln!(f, "❌ NOT LINEARIZABLE")?;
            if let Some(ref violation) = self.violation {
                writeln!(f, "   {}", violation)?;
            }
            write!(
                f,
                "   ({} events processed, {} writes accepted, {} still pending)",
                self.events_processed, self.accepted_writes, self.pending_writes
            )
        }
    }
}
