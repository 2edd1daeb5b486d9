//! Per-interface daily usage accounting.
//!
//! Turns successive cumulative counter readings into per-day increments. The
//! first reading after startup only sets the baseline; a reading lower than
//! the previous one is treated as a counter reset and counted in full.

use std::collections::btree_map::{self, BTreeMap};

use crate::core::classifier::InterfaceCategory;
use crate::core::counters::ByteCounterPair;

/// Daily totals keyed by `YYYY-MM-DD`, so key order is chronological.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageHistory {
    days: BTreeMap<String, ByteCounterPair>,
}

impl UsageHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, date: &str) -> Option<&ByteCounterPair> {
        self.days.get(date)
    }

    /// Add `delta` to the entry for `date`, creating it at zero first.
    pub fn add(&mut self, date: &str, delta: ByteCounterPair) {
        *self.days.entry(date.to_string()).or_default() += delta;
    }

    /// Replace the entry for `date`.
    pub fn set(&mut self, date: impl Into<String>, totals: ByteCounterPair) {
        self.days.insert(date.into(), totals);
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Entries in ascending date order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, ByteCounterPair> {
        self.days.iter()
    }
}

impl<'a> IntoIterator for &'a UsageHistory {
    type Item = (&'a String, &'a ByteCounterPair);
    type IntoIter = btree_map::Iter<'a, String, ByteCounterPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.days.iter()
    }
}

impl FromIterator<(String, ByteCounterPair)> for UsageHistory {
    fn from_iter<I: IntoIterator<Item = (String, ByteCounterPair)>>(iter: I) -> Self {
        Self {
            days: iter.into_iter().collect(),
        }
    }
}

/// Tracked state of a single interface.
#[derive(Debug, Clone)]
pub struct InterfaceState {
    is_first_measurement: bool,
    last: ByteCounterPair,
    pub history: UsageHistory,
}

impl Default for InterfaceState {
    fn default() -> Self {
        Self {
            is_first_measurement: true,
            last: ByteCounterPair::ZERO,
            history: UsageHistory::new(),
        }
    }
}

impl InterfaceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from history recovered from disk; the baseline is still unset.
    pub fn with_history(history: UsageHistory) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }

    pub fn is_first_measurement(&self) -> bool {
        self.is_first_measurement
    }

    pub fn last_observed(&self) -> ByteCounterPair {
        self.last
    }

    /// Feed one cumulative reading and return the increment credited to `today`.
    ///
    /// A zero result means nothing was recorded and nothing needs saving.
    pub fn observe(&mut self, current: ByteCounterPair, today: &str) -> ByteCounterPair {
        if self.is_first_measurement {
            self.last = current;
            self.is_first_measurement = false;
            return ByteCounterPair::ZERO;
        }

        let delta = ByteCounterPair {
            received_bytes: counter_delta(self.last.received_bytes, current.received_bytes),
            transmitted_bytes: counter_delta(
                self.last.transmitted_bytes,
                current.transmitted_bytes,
            ),
        };
        self.last = current;

        if !delta.is_zero() {
            self.history.add(today, delta);
        }
        delta
    }
}

/// Increment between two cumulative readings. A drop means the counter was
/// reset, so the whole current value is new traffic.
pub fn counter_delta(previous: u64, current: u64) -> u64 {
    if current < previous {
        current
    } else {
        current - previous
    }
}

/// Category-wide totals, fed with the summed deltas of one polling cycle.
#[derive(Debug, Clone)]
pub struct AggregateState {
    pub category: InterfaceCategory,
    pub history: UsageHistory,
}

impl AggregateState {
    pub fn new(category: InterfaceCategory, history: UsageHistory) -> Self {
        Self { category, history }
    }

    /// Merge a cycle total; returns false (and leaves history untouched) when it is zero.
    pub fn merge(&mut self, cycle_total: ByteCounterPair, today: &str) -> bool {
        if cycle_total.is_zero() {
            return false;
        }
        self.history.add(today, cycle_total);
        true
    }
}
