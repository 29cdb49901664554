//! Harness event records and the typed event stream.
//!
//! The harness emits one flat record per protocol step: a monotonic
//! logical `time`, the originating client `process`, an event kind
//! (`invoke` or `ok`), the operation (`read` or `write`), and whatever
//! operation-specific fields apply. [`RawEvent`] is that wire shape,
//! with every operation-specific field optional. [`Event`] is the typed
//! view the rest of the pipeline consumes: four arms, one per
//! `(kind, operation)` pair, carrying exactly the fields that pair has.
//!
//! Records of any other kind or operation (`fail`, `info`, setup
//! traffic) are dropped during parsing, before the merge.
//!
//! Write ids and values are opaque type parameters. The pipeline only
//! ever compares and hashes them.

use crate::error::InvalidHistory;
use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════
//  Raw record (harness wire shape)
// ═══════════════════════════════════════════════════════════════════════

/// A raw history record as serialised by the harness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "W: Deserialize<'de>, V: Deserialize<'de>"))]
pub struct RawEvent<W, V> {
    /// Logical timestamp, monotonic per process.
    pub time: u64,
    /// Originating client id.
    pub process: u64,
    /// Event kind: `invoke`, `ok`, or anything else (dropped).
    #[serde(rename = "type")]
    pub kind: String,
    /// Operation name: `read`, `write`, or anything else (dropped).
    pub f: String,
    /// Write id named by the operation, where applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_id: Option<W>,
    /// CAS predecessor named by a write invocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_write_id: Option<W>,
    /// Proposed (write) or returned (read) value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<V>,
}

impl<W, V> RawEvent<W, V> {
    /// A read invocation on `process`.
    pub fn invoke_read(time: u64, process: u64) -> Self {
        Self {
            time,
            process,
            kind: "invoke".to_string(),
            f: "read".to_string(),
            write_id: None,
            prev_write_id: None,
            value: None,
        }
    }

    /// A read completion returning `value`, attributed to `write_id`.
    pub fn ok_read(time: u64, process: u64, write_id: W, value: V) -> Self {
        Self {
            time,
            process,
            kind: "ok".to_string(),
            f: "read".to_string(),
            write_id: Some(write_id),
            prev_write_id: None,
            value: Some(value),
        }
    }

    /// A write invocation proposing `value` under `write_id`, naming
    /// `prev` as its CAS predecessor.
    pub fn invoke_write(time: u64, process: u64, write_id: W, prev: W, value: V) -> Self {
        Self {
            time,
            process,
            kind: "invoke".to_string(),
            f: "write".to_string(),
            write_id: Some(write_id),
            prev_write_id: Some(prev),
            value: Some(value),
        }
    }

    /// A write completion confirming `write_id`.
    pub fn ok_write(time: u64, process: u64, write_id: W) -> Self {
        Self {
            time,
            process,
            kind: "ok".to_string(),
            f: "write".to_string(),
            write_id: Some(write_id),
            prev_write_id: None,
            value: None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Typed event (parsed from RawEvent)
// ═══════════════════════════════════════════════════════════════════════

/// A parsed history event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event<W, V> {
    /// `invoke read`: a read began on `process`.
    InvokeRead { time: u64, process: u64 },
    /// `ok read`: the read on `process` returned `value`, which the
    /// server attributed to `write_id`.
    OkRead {
        time: u64,
        process: u64,
        write_id: W,
        value: V,
    },
    /// `invoke write`: `process` proposed `value` under `write_id`,
    /// naming `prev` as the write it intends to supersede.
    InvokeWrite {
        time: u64,
        process: u64,
        write_id: W,
        prev: W,
        value: V,
    },
    /// `ok write`: the server confirmed `write_id`.
    OkWrite {
        time: u64,
        process: u64,
        write_id: W,
    },
}

impl<W, V> Event<W, V> {
    /// Logical timestamp of the event.
    pub fn time(&self) -> u64 {
        match self {
            Event::InvokeRead { time, .. }
            | Event::OkRead { time, .. }
            | Event::InvokeWrite { time, .. }
            | Event::OkWrite { time, .. } => *time,
        }
    }

    /// Originating client id.
    pub fn process(&self) -> u64 {
        match self {
            Event::InvokeRead { process, .. }
            | Event::OkRead { process, .. }
            | Event::InvokeWrite { process, .. }
            | Event::OkWrite { process, .. } => *process,
        }
    }
}

impl<W, V> Event<W, V>
where
    W: fmt::Debug + fmt::Display,
{
    /// Parse a raw record into a typed event.
    ///
    /// Returns `Ok(None)` for kinds and operations outside the
    /// checker's scope. A record of a known shape that is missing a
    /// required field is a harness bug, reported as
    /// [`InvalidHistory::MalformedEvent`].
    pub fn from_raw(raw: RawEvent<W, V>) -> Result<Option<Self>, InvalidHistory<W>> {
        let RawEvent {
            time,
            process,
            kind,
            f,
            write_id,
            prev_write_id,
            value,
        } = raw;
        let missing = |field: &'static str| InvalidHistory::MalformedEvent {
            time,
            process,
            field,
        };
        let event = match (kind.as_str(), f.as_str()) {
            ("invoke", "read") => Event::InvokeRead { time, process },
            ("ok", "read") => Event::OkRead {
                time,
                process,
                write_id: write_id.ok_or_else(|| missing("write_id"))?,
                value: value.ok_or_else(|| missing("value"))?,
            },
            ("invoke", "write") => Event::InvokeWrite {
                time,
                process,
                write_id: write_id.ok_or_else(|| missing("write_id"))?,
                prev: prev_write_id.ok_or_else(|| missing("prev_write_id"))?,
                value: value.ok_or_else(|| missing("value"))?,
            },
            ("ok", "write") => Event::OkWrite {
                time,
                process,
                write_id: write_id.ok_or_else(|| missing("write_id"))?,
            },
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

impl<W, V> fmt::Display for Event<W, V>
where
    W: fmt::Display,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::InvokeRead { time, process } => {
                write!(f, "[{:>6}] p{} invoke read", time, process)
            }
            Event::OkRead {
                time,
                process,
                write_id,
                value,
            } => {
                write!(
                    f,
                    "[{:>6}] p{} ok     read  {} = {:?}",
                    time, process, write_id, value
                )
            }
            Event::InvokeWrite {
                time,
                process,
                write_id,
                prev,
                value,
            } => {
                write!(
                    f,
                    "[{:>6}] p{} invoke write {} -> {} = {:?}",
                    time, process, prev, write_id, value
                )
            }
            Event::OkWrite {
                time,
                process,
                write_id,
            } => {
                write!(f, "[{:>6}] p{} ok     write {}", time, process, write_id)
            }
        }
    }
}
