use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters tracking orchestrator activity.
///
/// All counters use relaxed ordering. For a consistent point-in-time view,
/// call [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct OrchestratorMetrics {
    /// Read operations served (`find_all`, `find_by_id`).
    pub reads: AtomicU64,
    /// Committed mutations.
    pub writes: AtomicU64,
    /// Reads answered from the cache.
    pub cache_hits: AtomicU64,
    /// Reads that fell through to the entity store.
    pub cache_misses: AtomicU64,
    /// Cache operations that failed and were ignored.
    pub cache_errors: AtomicU64,
    /// Collection invalidations issued after writes.
    pub invalidations: AtomicU64,
    /// Audit records appended.
    pub audit_records: AtomicU64,
    /// Audit appends that failed after a committed mutation.
    pub audit_failures: AtomicU64,
}

impl OrchestratorMetrics {
    pub fn increment_reads(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_writes(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cache_misses(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cache_errors(&self) {
        self.cache_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_invalidations(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_audit_records(&self) {
        self.audit_records.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_audit_failures(&self) {
        self.audit_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            cache_errors: self.cache_errors.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            audit_records: self.audit_records.load(Ordering::Relaxed),
            audit_failures: self.audit_failures.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`OrchestratorMetrics`] at a point in time.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub reads: u64,
    pub writes: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_errors: u64,
    pub invalidations: u64,
    pub audit_records: u64,
    pub audit_failures: u64,
}
