//! Background monitoring service.
//!
//! [`UsageMonitor`] owns every piece of accounting state: one
//! [`InterfaceState`] per interface plus one [`AggregateState`] per category.
//! [`BackgroundServices::start`] moves it onto a dedicated thread that polls
//! the counter source, persists whatever changed, and sleeps until the next
//! cycle. [`MonitorHandle`] stops that thread at the next cycle boundary.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::core::{
    AggregateState, ByteCounterPair, Classification, CounterSnapshot, CounterSource,
    InterfaceCategory, InterfaceClassifier, InterfaceState, UsageHistory,
};
use crate::store::{self, StorageLayout};

/// Outcome of one polling cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Interfaces whose history grew this cycle.
    pub changed: Vec<String>,
    /// Summed increments per category; categories with no traffic are absent.
    pub totals: BTreeMap<InterfaceCategory, ByteCounterPair>,
    /// Saves that failed and will be retried implicitly on the next change.
    pub save_failures: usize,
}

impl CycleReport {
    pub fn is_idle(&self) -> bool {
        self.changed.is_empty()
    }
}

/// Accounting state of the whole host.
pub struct UsageMonitor {
    layout: StorageLayout,
    classification: Classification,
    interfaces: BTreeMap<String, InterfaceState>,
    aggregates: BTreeMap<InterfaceCategory, AggregateState>,
}

impl UsageMonitor {
    /// Classify interfaces once and reload every known history file.
    pub fn initialize(layout: StorageLayout, classifier: &dyn InterfaceClassifier) -> Self {
        let classification = Classification::capture(classifier);

        let mut interfaces = BTreeMap::new();
        for category in InterfaceCategory::ALL {
            for name in classification.members(category) {
                let history = load_or_empty(&layout.interface_path(category, name));
                interfaces.insert(name.clone(), InterfaceState::with_history(history));
            }
        }

        let aggregates = InterfaceCategory::ALL
            .into_iter()
            .map(|category| {
                let history = load_or_empty(&layout.aggregate_path(category));
                (category, AggregateState::new(category, history))
            })
            .collect();

        tracing::info!(
            "Tracking {} physical and {} virtual interfaces under {}",
            classification.members(InterfaceCategory::Physical).len(),
            classification.members(InterfaceCategory::Virtual).len(),
            layout.root().display()
        );

        Self {
            layout,
            classification,
            interfaces,
            aggregates,
        }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn interface(&self, name: &str) -> Option<&InterfaceState> {
        self.interfaces.get(name)
    }

    pub fn aggregate(&self, category: InterfaceCategory) -> Option<&AggregateState> {
        self.aggregates.get(&category)
    }

    /// Process one counter snapshot taken on `today`.
    ///
    /// Each interface whose usage grew is saved at once; category totals are
    /// merged and saved after all interfaces have been seen.
    pub fn poll_cycle(&mut self, snapshot: &CounterSnapshot, today: &str) -> CycleReport {
        let mut report = CycleReport::default();

        for (name, current) in snapshot {
            let category = self.classification.category_of(name);

            if !self.interfaces.contains_key(name) {
                // Appeared after startup: adopt whatever its fallback file already holds.
                let path = self.layout.interface_path(category, name);
                tracing::info!("New interface {name}, tracking as {category}");
                self.interfaces
                    .insert(name.clone(), InterfaceState::with_history(load_or_empty(&path)));
            }
            let Some(state) = self.interfaces.get_mut(name) else {
                continue;
            };

            let delta = state.observe(*current, today);
            if delta.is_zero() {
                continue;
            }

            let path = self.layout.interface_path(category, name);
            if let Err(e) = store::save(&path, &state.history) {
                tracing::warn!(kind = e.kind(), "Failed to save history for {name}: {e}");
                report.save_failures += 1;
            }
            tracing::debug!(
                "{name}: +{} rx / +{} tx bytes",
                delta.received_bytes,
                delta.transmitted_bytes
            );

            *report.totals.entry(category).or_default() += delta;
            report.changed.push(name.clone());
        }

        let mut aggregate_failures = 0;
        for (category, total) in &report.totals {
            let Some(aggregate) = self.aggregates.get_mut(category) else {
                continue;
            };
            if !aggregate.merge(*total, today) {
                continue;
            }
            let path = self.layout.aggregate_path(*category);
            if let Err(e) = store::save(&path, &aggregate.history) {
                tracing::warn!(kind = e.kind(), "Failed to save {category} total: {e}");
                aggregate_failures += 1;
            }
        }
        report.save_failures += aggregate_failures;

        report
    }
}

fn load_or_empty(path: &std::path::Path) -> UsageHistory {
    store::load(path).unwrap_or_else(|e| {
        tracing::warn!(kind = e.kind(), "Could not load history, starting empty: {e}");
        UsageHistory::new()
    })
}

/// Local calendar date as `YYYY-MM-DD`.
pub fn local_date() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Starts the polling thread.
pub struct BackgroundServices;

impl BackgroundServices {
    /// Move `monitor` onto the `usage-monitor` thread and poll every `interval`.
    pub fn start(
        mut monitor: UsageMonitor,
        mut source: Box<dyn CounterSource + Send>,
        interval: Duration,
    ) -> anyhow::Result<MonitorHandle> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown);

        let thread = std::thread::Builder::new()
            .name("usage-monitor".into())
            .spawn(move || {
                while !shutdown_clone.load(Ordering::Relaxed) {
                    run_cycle(&mut monitor, source.as_mut());
                    sleep_unless_stopped(interval, &shutdown_clone);
                }
                tracing::info!("Usage monitor stopped");
            })?;

        tracing::info!("Usage monitor started ({}s interval)", interval.as_secs_f64());
        Ok(MonitorHandle {
            shutdown,
            thread: Some(thread),
        })
    }
}

fn run_cycle(monitor: &mut UsageMonitor, source: &mut dyn CounterSource) {
    let today = local_date();
    match source.fetch_current_counters() {
        Ok(snapshot) => {
            let report = monitor.poll_cycle(&snapshot, &today);
            if !report.is_idle() {
                tracing::debug!(
                    "Cycle {today}: {} interfaces changed, {} save failures",
                    report.changed.len(),
                    report.save_failures
                );
            }
        }
        Err(e) => tracing::warn!(kind = e.kind(), "Counter read failed, skipping cycle: {e}"),
    }
}

/// Park for `interval`, waking early once `shutdown` is set.
fn sleep_unless_stopped(interval: Duration, shutdown: &AtomicBool) {
    let deadline = Instant::now() + interval;
    loop {
        if shutdown.load(Ordering::Relaxed) {
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        std::thread::park_timeout(deadline - now);
    }
}

/// Handle to the polling thread.
/// Dropping it requests shutdown without waiting.
pub struct MonitorHandle {
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Request shutdown; the thread exits at the next cycle boundary.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(thread) = &self.thread {
            thread.thread().unpark();
        }
    }

    /// Stop and wait for the thread to finish its current cycle.
    pub fn join(mut self) {
        self.stop();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Usage monitor thread panicked");
            }
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
