//! Core logic: counter reading, interface classification, daily accounting.
//!
//! - [`CounterSource`] / [`ByteCounterPair`] — cumulative kernel counters
//! - [`InterfaceClassifier`] / [`Classification`] — physical vs. virtual membership
//! - [`InterfaceState`] / [`AggregateState`] — per-day delta accumulation

pub mod classifier;
pub mod counters;
pub mod delta;

pub use classifier::{Classification, InterfaceCategory, InterfaceClassifier, SysfsClassifier};
pub use counters::{ByteCounterPair, CounterSnapshot, CounterSource};
pub use delta::{AggregateState, InterfaceState, UsageHistory};
