//! Fast linearizability checking for CAS-register histories.
//!
//! Given a history of concurrent reads, writes, and compare-and-set
//! writes against a single last-writer-wins register, this crate
//! decides whether the observed interleaving is linearizable. Writes
//! form a chain (each names its predecessor), which makes the decision
//! incremental: one pass over the time-ordered history, no search over
//! interleavings. With `n` events and client concurrency bounded by
//! `C`, a check runs in O(n log C).
//!
//! # Architecture
//!
//! ```text
//! per-thread histories (test harness)
//!        │
//!        ▼
//! regchain-history:  filter → bucket by thread → K-way merge
//!        │  time-ordered events
//!        ▼
//! ChainChecker:      accepted chain + pending writes + pending reads
//!        │
//!        ▼
//! CheckReport { valid, violation }
//! ```
//!
//! # Usage
//!
//! ```
//! use regchain_checker::{check_history, CheckConfig};
//! use regchain_history::RawEvent;
//!
//! let events = vec![
//!     RawEvent::invoke_write(1, 0, "w1", "w0", "v1"),
//!     RawEvent::ok_write(2, 0, "w1"),
//!     RawEvent::invoke_read(3, 1),
//!     RawEvent::ok_read(4, 1, "w1", "v1"),
//! ];
//! let report = check_history(events, CheckConfig::new(2, "w0", "v0")).unwrap();
//! assert!(report.valid);
//! ```

pub mod chain;
pub mod checker;
pub mod report;

pub use chain::{WriteChain, WriteRecord};
pub use checker::ChainChecker;
pub use report::{CheckReport, Violation};

use regchain_history::{normalize, InvalidHistory, RawEvent};
use std::fmt;
use std::hash::Hash;

/// Configuration for one check.
#[derive(Debug, Clone)]
pub struct CheckConfig<W, V> {
    /// Upper bound on concurrently active client threads. Affects only
    /// normaliser bucketing.
    pub concurrency: usize,
    /// Id of the seeded genesis write.
    pub genesis_write_id: W,
    /// Value of the seeded genesis write.
    pub genesis_value: V,
}

impl<W, V> CheckConfig<W, V> {
    pub fn new(concurrency: usize, genesis_write_id: W, genesis_value: V) -> Self {
        Self {
            concurrency,
            genesis_write_id,
            genesis_value,
        }
    }
}

/// Normalise a raw harness history and check it.
///
/// `Err` means the input history is malformed (see [`InvalidHistory`]).
/// A non-linearizable history is a *successful* check whose report has
/// `valid == false`.
pub fn check_history<W, V>(
    events: Vec<RawEvent<W, V>>,
    config: CheckConfig<W, V>,
) -> Result<CheckReport<W, V>, InvalidHistory<W>>
where
    W: Clone + Eq + Hash + fmt::Debug + fmt::Display,
    V: Clone + PartialEq + fmt::Debug,
{
    let events = normalize(events, config.concurrency)?;
    let mut checker = ChainChecker::new(config.genesis_write_id, config.genesis_value);
    for event in events {
        checker.apply(event)?;
        if checker.has_violation() {
            break;
        }
    }
    Ok(checker.into_report())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use regchain_history::Event;

    fn config() -> CheckConfig<&'static str, &'static str> {
        CheckConfig::new(4, "w0", "v0")
    }

    // ── End-to-end scenarios ────────────────────────────────────────

    #[test]
    fn happy_chain_is_linearizable() {
        let events = vec![
            RawEvent::invoke_write(1, 0, "w1", "w0", "v1"),
            RawEvent::ok_write(2, 0, "w1"),
            RawEvent::invoke_read(3, 1),
            RawEvent::ok_read(4, 1, "w1", "v1"),
        ];
        let report = check_history(events, config()).unwrap();
        assert!(report.valid);
        assert_eq!(report.accepted_writes, 2);
        assert_eq!(report.reads_checked, 1);
    }

    #[test]
    fn read_observing_before_ok_is_linearizable() {
        let events = vec![
            RawEvent::invoke_write(1, 0, "w1", "w0", "v1"),
            RawEvent::invoke_read(2, 1),
            RawEvent::ok_read(3, 1, "w1", "v1"),
            RawEvent::ok_write(4, 0, "w1"),
        ];
        let report = check_history(events, config()).unwrap();
        assert!(report.valid);
        assert_eq!(report.accepted_writes, 2);
    }

    #[test]
    fn stale_read_is_detected() {
        let events = vec![
            RawEvent::invoke_write(1, 0, "w1", "w0", "v1"),
            RawEvent::ok_write(2, 0, "w1"),
            RawEvent::invoke_read(3, 1),
            RawEvent::ok_read(4, 1, "w0", "v0"),
        ];
        let report = check_history(events, config()).unwrap();
        assert!(!report.valid);
        assert!(matches!(
            report.violation,
            Some(Violation::StaleRead { write_id: "w0", .. })
        ));
    }

    #[test]
    fn branching_chain_is_detected() {
        let events = vec![
            RawEvent::invoke_write(1, 0, "w1", "w0", "v1"),
            RawEvent::ok_write(2, 0, "w1"),
            RawEvent::invoke_write(3, 1, "w2", "w0", "v2"),
            RawEvent::ok_write(4, 1, "w2"),
        ];
        let report = check_history(events, config()).unwrap();
        assert_eq!(
            report.violation,
            Some(Violation::BranchingChain {
                anchor: "w0",
                chain: vec!["w2"],
                opponent: "w1",
            })
        );
    }

    #[test]
    fn value_mismatch_is_detected() {
        let events = vec![
            RawEvent::invoke_write(1, 0, "w1", "w0", "v1"),
            RawEvent::ok_write(2, 0, "w1"),
            RawEvent::invoke_read(3, 1),
            RawEvent::ok_read(4, 1, "w1", "v_other"),
        ];
        let report = check_history(events, config()).unwrap();
        assert_eq!(
            report.violation,
            Some(Violation::ValueMismatch {
                write_id: "w1",
                expected: "v1",
                got: "v_other",
            })
        );
    }

    #[test]
    fn transitive_acceptance_through_a_read() {
        let events = vec![
            RawEvent::invoke_write(1, 0, "w1", "w0", "v1"),
            RawEvent::invoke_write(2, 1, "w2", "w1", "v2"),
            RawEvent::invoke_read(3, 2),
            RawEvent::ok_read(4, 2, "w2", "v2"),
        ];
        let report = check_history(events, config()).unwrap();
        assert!(report.valid);
        assert_eq!(report.accepted_writes, 3);
        assert_eq!(report.pending_writes, 0);
    }

    // ── Randomised properties ───────────────────────────────────────

    const CONCURRENCY: usize = 4;

    /// Generate a valid history by simulating a well-behaved register:
    /// writes chain off the current head, reads return the head, and
    /// some writes are observed by a read before their own completion.
    fn gen_history(seed: u64, steps: usize) -> Vec<RawEvent<String, String>> {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut events = Vec::new();
        let mut t = 1u64;
        let mut latest = "w0".to_string();
        let mut latest_value = "v0".to_string();
        let mut next_id = 1u32;
        for _ in 0..steps {
            let p = rng.gen_range(0..CONCURRENCY as u64);
            match rng.gen_range(0..4) {
                0 | 1 => {
                    let wid = format!("w{}", next_id);
                    let value = format!("v{}", next_id);
                    next_id += 1;
                    events.push(RawEvent::invoke_write(
                        t,
                        p,
                        wid.clone(),
                        latest.clone(),
                        value.clone(),
                    ));
                    t += 1;
                    events.push(RawEvent::ok_write(t, p, wid.clone()));
                    t += 1;
                    latest = wid;
                    latest_value = value;
                }
                2 => {
                    events.push(RawEvent::invoke_read(t, p));
                    t += 1;
                    events.push(RawEvent::ok_read(t, p, latest.clone(), latest_value.clone()));
                    t += 1;
                }
                _ => {
                    let q = (p + 1) % CONCURRENCY as u64;
                    let wid = format!("w{}", next_id);
                    let value = format!("v{}", next_id);
                    next_id += 1;
                    events.push(RawEvent::invoke_write(
                        t,
                        p,
                        wid.clone(),
                        latest.clone(),
                        value.clone(),
                    ));
                    t += 1;
                    events.push(RawEvent::invoke_read(t, q));
                    t += 1;
                    events.push(RawEvent::ok_read(t, q, wid.clone(), value.clone()));
                    t += 1;
                    events.push(RawEvent::ok_write(t, p, wid.clone()));
                    t += 1;
                    latest = wid;
                    latest_value = value;
                }
            }
        }
        events
    }

    fn string_config() -> CheckConfig<String, String> {
        CheckConfig::new(CONCURRENCY, "w0".to_string(), "v0".to_string())
    }

    #[test]
    fn random_histories_are_valid() {
        for seed in 0..20 {
            let report = check_history(gen_history(seed, 25), string_config()).unwrap();
            assert!(report.valid, "seed {}: {:?}", seed, report.violation);
        }
    }

    #[test]
    fn checking_is_pure() {
        for seed in 0..10 {
            let events = gen_history(seed, 25);
            let a = check_history(events.clone(), string_config()).unwrap();
            let b = check_history(events, string_config()).unwrap();
            assert_eq!(a.valid, b.valid);
            assert_eq!(a.details(), b.details());
            assert_eq!(a.accepted_writes, b.accepted_writes);
        }
    }

    #[test]
    fn verdict_survives_process_relabelling() {
        for seed in 0..10 {
            let events = gen_history(seed, 25);
            let baseline = check_history(events.clone(), string_config()).unwrap();

            // Same thread buckets under mod-C folding.
            let mut shifted = events.clone();
            for event in &mut shifted {
                event.process += 3 * CONCURRENCY as u64;
            }
            let report = check_history(shifted, string_config()).unwrap();
            assert_eq!(report.valid, baseline.valid);

            // A rotation keeps the partitions distinct.
            let mut rotated = events;
            for event in &mut rotated {
                event.process = (event.process + 1) % CONCURRENCY as u64;
            }
            let report = check_history(rotated, string_config()).unwrap();
            assert_eq!(report.valid, baseline.valid);
        }
    }

    #[test]
    fn valid_checks_leave_an_intact_chain() {
        for seed in 0..10 {
            let events = normalize(gen_history(seed, 25), CONCURRENCY).unwrap();
            let mut checker: ChainChecker<String, String> =
                ChainChecker::new("w0".to_string(), "v0".to_string());
            for event in events {
                checker.apply(event).unwrap();
            }
            assert!(!checker.has_violation());

            // Walking back from the head visits every accepted write,
            // and lts runs 0..k along the way.
            let ids = checker.chain().ids_from_genesis();
            assert_eq!(ids.len(), checker.chain().len());
            for (i, id) in ids.iter().enumerate() {
                assert_eq!(checker.chain().get(id).unwrap().lts, i as u64);
            }

            // Every id seen is accounted for exactly once.
            assert_eq!(
                checker.seen_write_count(),
                checker.chain().len() + checker.pending_write_count()
            );
        }
    }

    #[test]
    fn normalize_feeds_the_checker_in_order() {
        let events = normalize(gen_history(7, 25), CONCURRENCY).unwrap();
        let mut last = 0;
        for event in &events {
            assert!(event.time() >= last);
            last = event.time();
        }
        assert!(matches!(events[0], Event::InvokeWrite { .. } | Event::InvokeRead { .. }));
    }
}
