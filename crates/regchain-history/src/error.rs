//! Harness-side history errors.
//!
//! Everything here means the input history is malformed: a recording or
//! harness bug. These are kept strictly separate from linearizability
//! violations. An `InvalidHistory` means the question could not be
//! asked, not that the answer is "not linearizable".

use std::fmt;
use thiserror::Error;

/// A malformed input history.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidHistory<W>
where
    W: fmt::Debug + fmt::Display,
{
    /// The merged event stream stepped backwards in time. Per-thread
    /// subsequences are required to be time-sorted, so this can only
    /// happen when the harness recorded one out of order.
    #[error("time went backwards: saw {current} after {last}")]
    NonMonotonicTime { last: u64, current: u64 },

    /// The same write id was proposed by two invocations.
    #[error("write id {write_id} proposed twice")]
    DuplicateWriteId { write_id: W },

    /// A process invoked a read while its previous read was still
    /// in flight.
    #[error("process {process} started a read while one was still pending")]
    DuplicatePendingRead { process: u64 },

    /// A completion arrived on a process with no matching invocation.
    #[error("process {process} completed a read that was never invoked")]
    MissingInvoke { process: u64 },

    /// A record of a known kind was missing a required field.
    #[error("event at time {time} on process {process} is missing `{field}`")]
    MalformedEvent {
        time: u64,
        process: u64,
        field: &'static str,
    },
}
