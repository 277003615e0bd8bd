use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use time::OffsetDateTime;

/// Thread-safe counters describing collection cycle activity.
#[derive(Default)]
pub struct CycleMetrics {
    cycles_total: AtomicU64,
    cycles_failed: AtomicU64,
    indexes_zeroed: AtomicU64,
    last_success_unix: AtomicI64,
}

impl CycleMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cycle that ran to completion.
    pub fn record_success(&self, zeroed: usize) {
        self.cycles_total.fetch_add(1, Ordering::Relaxed);
        self.indexes_zeroed
            .fetch_add(zeroed as u64, Ordering::Relaxed);
        self.last_success_unix
            .store(OffsetDateTime::now_utc().unix_timestamp(), Ordering::Relaxed);
    }

    /// Record a cycle whose collection phase aborted on an error.
    pub fn record_failure(&self, zeroed: usize) {
        self.cycles_total.fetch_add(1, Ordering::Relaxed);
        self.cycles_failed.fetch_add(1, Ordering::Relaxed);
        self.indexes_zeroed
            .fetch_add(zeroed as u64, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> CycleSnapshot {
        let last = self.last_success_unix.load(Ordering::Relaxed);
        CycleSnapshot {
            cycles_total: self.cycles_total.load(Ordering::Relaxed),
            cycles_failed: self.cycles_failed.load(Ordering::Relaxed),
            indexes_zeroed: self.indexes_zeroed.load(Ordering::Relaxed),
            last_success: (last != 0).then(|| format_rfc3339(last)),
        }
    }
}

fn format_rfc3339(unix: i64) -> String {
    OffsetDateTime::from_unix_timestamp(unix)
        .ok()
        .and_then(|at| {
            at.format(&time::format_description::well_known::Rfc3339)
                .ok()
        })
        .unwrap_or_else(|| "1970-01-01T00:00:00Z".to_string())
}

/// Immutable view of cycle counters used for reporting.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CycleSnapshot {
    /// Number of cycles run since startup.
    pub cycles_total: u64,
    /// Number of cycles whose collection phase aborted.
    pub cycles_failed: u64,
    /// Stale indexes zeroed by reconciliation since startup.
    pub indexes_zeroed: u64,
    /// RFC 3339 time of the last cycle that completed without error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_success: Option<String>,
}
