use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing record activity.
#[derive(Default)]
pub struct RecordMetrics {
    records_created: AtomicU64,
    records_deleted: AtomicU64,
    names_generated: AtomicU64,
    naming_failures: AtomicU64,
}

impl RecordMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly created record.
    pub fn record_created(&self) {
        self.records_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a deleted record.
    pub fn record_deleted(&self) {
        self.records_deleted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a title written to a record.
    pub fn record_named(&self) {
        self.names_generated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a naming attempt that produced no title.
    pub fn record_naming_failure(&self) {
        self.naming_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_created: self.records_created.load(Ordering::Relaxed),
            records_deleted: self.records_deleted.load(Ordering::Relaxed),
            names_generated: self.names_generated.load(Ordering::Relaxed),
            naming_failures: self.naming_failures.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of record counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Records created since startup.
    pub records_created: u64,
    /// Records deleted since startup.
    pub records_deleted: u64,
    /// Titles written since startup.
    pub names_generated: u64,
    /// Naming attempts that produced no title.
    pub naming_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_lifecycle_counters() {
        let metrics = RecordMetrics::new();
        metrics.record_created();
        metrics.record_created();
        metrics.record_deleted();
        metrics.record_named();
        metrics.record_naming_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.records_created, 2);
        assert_eq!(snapshot.records_deleted, 1);
        assert_eq!(snapshot.names_generated, 1);
        assert_eq!(snapshot.naming_failures, 1);
    }

    #[test]
    fn snapshot_starts_empty() {
        let snapshot = RecordMetrics::new().snapshot();
        assert_eq!(snapshot.records_created, 0);
        assert_eq!(snapshot.naming_failures, 0);
    }
}
