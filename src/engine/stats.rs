use std::sync::atomic::{AtomicUsize, Ordering};

/// Per-item outcome counters for one engine lifetime.
///
/// Uses atomic counters so a shared engine can be observed while it runs.
#[derive(Debug, Default)]
pub struct EngineStats {
    downloaded: AtomicUsize,
    skipped: AtomicUsize,
    unavailable: AtomicUsize,
    failed: AtomicUsize,
}

impl EngineStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Items fetched and recorded.
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.downloaded.load(Ordering::SeqCst)
    }

    /// Items skipped by the archive or filesystem gate.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::SeqCst)
    }

    /// Items with missing metadata or not playable.
    #[must_use]
    pub fn unavailable(&self) -> usize {
        self.unavailable.load(Ordering::SeqCst)
    }

    /// Items whose fetch produced nothing.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Every item that reached the per-item step.
    #[must_use]
    pub fn total(&self) -> usize {
        self.downloaded() + self.skipped() + self.unavailable() + self.failed()
    }

    pub(super) fn increment_downloaded(&self) {
        self.downloaded.fetch_add(1, Ordering::SeqCst);
    }

    pub(super) fn increment_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
    }

    pub(super) fn increment_unavailable(&self) {
        self.unavailable.fetch_add(1, Ordering::SeqCst);
    }

    pub(super) fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_stats_counts_and_total() {
        let stats = EngineStats::new();
        stats.increment_downloaded();
        stats.increment_downloaded();
        stats.increment_skipped();
        stats.increment_unavailable();
        stats.increment_failed();

        assert_eq!(stats.downloaded(), 2);
        assert_eq!(stats.skipped(), 1);
        assert_eq!(stats.unavailable(), 1);
        assert_eq!(stats.failed(), 1);
        assert_eq!(stats.total(), 5);
    }
}
