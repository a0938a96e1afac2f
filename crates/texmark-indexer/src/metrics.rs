//! Cache counters.

use crate::types::RefreshStats;
use serde::Serialize;

/// Running totals over the lifetime of an indexer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheMetrics {
    /// Number of refresh calls
    pub refreshes: u64,
    /// Files handed to the scanner
    pub scans: u64,
    /// Files served from cache
    pub kept: u64,
    /// File tags removed by invalidation
    pub invalidations: u64,
    /// Full cache resets
    pub resets: u64,
}

impl CacheMetrics {
    pub fn record_refresh(&mut self, stats: &RefreshStats) {
        self.refreshes += 1;
        self.scans += stats.scanned as u64;
        self.kept += stats.kept as u64;
    }

    pub fn record_invalidations(&mut self, count: usize) {
        self.invalidations += count as u64;
    }

    pub fn record_reset(&mut self) {
        self.resets += 1;
    }

    /// Share of file lookups served from cache (0.0 - 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.scans + self.kept;
        if total == 0 {
            0.0
        } else {
            self.kept as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_refresh() {
        let mut metrics = CacheMetrics::default();
        metrics.record_refresh(&RefreshStats {
            files: 4,
            scanned: 1,
            kept: 3,
            ..Default::default()
        });

        assert_eq!(metrics.refreshes, 1);
        assert_eq!(metrics.scans, 1);
        assert_eq!(metrics.kept, 3);
        assert!((metrics.hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_rate_empty() {
        assert_eq!(CacheMetrics::default().hit_rate(), 0.0);
    }
}
