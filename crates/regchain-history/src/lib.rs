//! History data model and normalisation for the regchain checker.
//!
//! A distributed-systems test harness records per-client operation
//! streams against a single CAS register. This crate defines the record
//! shapes ([`RawEvent`], [`Event`]), the saved-history container
//! ([`HistoryLog`]), and the normaliser ([`normalize`]) that filters
//! and merges per-thread streams into the one time-ordered sequence the
//! checker consumes.
//!
//! Malformed input is reported through [`InvalidHistory`], which is a
//! statement about the harness, never about the system under test.

pub mod error;
pub mod events;
pub mod merge;
pub mod store;

pub use error::InvalidHistory;
pub use events::{Event, RawEvent};
pub use merge::normalize;
pub use store::{GenesisSeed, HistoryLog};
