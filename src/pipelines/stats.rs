//! Execution statistics reported by scoring runs.

use std::time::{Duration, Instant};

/// Statistics for one scoring call.
#[derive(Debug, Clone)]
pub struct ScoringStats {
    /// Total execution time.
    pub total_time: Duration,
    /// Number of records scored.
    pub items_processed: usize,
    /// Number of batches submitted.
    pub batches: usize,
}

impl ScoringStats {
    /// Create a new stats tracker (call at start of operation).
    pub(crate) fn start() -> ScoringStatsBuilder {
        ScoringStatsBuilder {
            start_time: Instant::now(),
        }
    }

    /// Records scored per second over the whole call.
    pub fn items_per_second(&self) -> f64 {
        let secs = self.total_time.as_secs_f64();
        if secs > 0.0 {
            self.items_processed as f64 / secs
        } else {
            0.0
        }
    }
}

/// Builder for [`ScoringStats`] - tracks timing from creation to finalize.
pub(crate) struct ScoringStatsBuilder {
    start_time: Instant,
}

impl ScoringStatsBuilder {
    /// Finalize stats with the number of items and batches processed.
    pub fn finish(self, items_processed: usize, batches: usize) -> ScoringStats {
        ScoringStats {
            total_time: self.start_time.elapsed(),
            items_processed,
            batches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ScoringStats;

    #[test]
    fn rate_is_zero_without_elapsed_items() {
        let stats = ScoringStats::start().finish(0, 0);
        assert_eq!(stats.items_processed, 0);
        assert!(stats.items_per_second() >= 0.0);
    }
}
