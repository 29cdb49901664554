//! History normalisation: filtering, bucketing, and the bounded merge.
//!
//! Harnesses record one stream per client thread, each already sorted
//! by logical time. [`normalize`] turns those per-thread streams into a
//! single globally time-ordered stream:
//!
//! 1. parse, keeping only `invoke`/`ok` records of `read`/`write`,
//! 2. bucket by `process mod concurrency`,
//! 3. K-way merge the buckets, smallest `(time, thread)` first,
//! 4. verify the emitted stream never steps backwards in time.
//!
//! With `C` the configured concurrency bound the merge is O(n log C).
//! Ties on `time` go to the smaller thread id and order within a thread
//! is preserved, so the output is deterministic.

use crate::error::InvalidHistory;
use crate::events::{Event, RawEvent};
use log::debug;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::fmt;

/// Merge a raw harness history into one time-ordered event stream.
///
/// `concurrency` is the harness's client thread bound; it only affects
/// bucketing and must be at least 1.
///
/// Fails with [`InvalidHistory::NonMonotonicTime`] if the merged stream
/// would step backwards in time, which can only happen when some
/// per-thread subsequence was recorded out of order.
pub fn normalize<W, V>(
    events: Vec<RawEvent<W, V>>,
    concurrency: usize,
) -> Result<Vec<Event<W, V>>, InvalidHistory<W>>
where
    W: fmt::Debug + fmt::Display,
{
    assert!(concurrency > 0, "concurrency bound must be at least 1");

    let total = events.len();
    let mut buckets: Vec<VecDeque<Event<W, V>>> =
        (0..concurrency).map(|_| VecDeque::new()).collect();
    for raw in events {
        if let Some(event) = Event::from_raw(raw)? {
            let thread = (event.process() % concurrency as u64) as usize;
            buckets[thread].push_back(event);
        }
    }
    let kept: usize = buckets.iter().map(|b| b.len()).sum();
    debug!(
        "normalizing history: {} records, {} kept, {} threads",
        total, kept, concurrency
    );

    // One candidate per non-empty bucket. A bucket's next element is
    // only offered once its predecessor has been emitted, so order
    // within a thread survives, and the (time, thread) key sends equal
    // times to the smaller thread id.
    let mut heads = BinaryHeap::with_capacity(concurrency);
    for (thread, bucket) in buckets.iter().enumerate() {
        if let Some(event) = bucket.front() {
            heads.push(Reverse((event.time(), thread)));
        }
    }

    let mut merged = Vec::with_capacity(kept);
    let mut last_time: Option<u64> = None;
    while let Some(Reverse((_, thread))) = heads.pop() {
        let Some(event) = buckets[thread].pop_front() else {
            continue;
        };
        if let Some(last) = last_time {
            if event.time() < last {
                return Err(InvalidHistory::NonMonotonicTime {
                    last,
                    current: event.time(),
                });
            }
        }
        last_time = Some(event.time());
        if let Some(next) = buckets[thread].front() {
            heads.push(Reverse((next.time(), thread)));
        }
        merged.push(event);
    }
    Ok(merged)
}
