//! Process-time telemetry for the playback callback.
//!
//! Durations are kept in a fixed ring so recording never allocates.

use std::time::Duration;

/// Number of buffer timings kept.
const WINDOW: usize = 256;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetrySummary {
    pub avg_us: u32,
    pub max_us: u32,
    pub p95_us: u32,
    /// Cumulative count of buffers that took longer than their budget.
    pub overruns: u64,
}

pub struct ProcessTelemetry {
    durations_us: [u32; WINDOW],
    next: usize,
    filled: usize,
    max_us: u32,
    overruns: u64,
}

impl Default for ProcessTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTelemetry {
    pub fn new() -> Self {
        Self {
            durations_us: [0; WINDOW],
            next: 0,
            filled: 0,
            max_us: 0,
            overruns: 0,
        }
    }

    /// Record how long one buffer took against the time it represents.
    #[inline]
    pub fn record(&mut self, elapsed: Duration, budget_us: u32) {
        let us = elapsed.as_micros().min(u32::MAX as u128) as u32;
        self.durations_us[self.next] = us;
        self.next = (self.next + 1) % WINDOW;
        if self.filled < WINDOW {
            self.filled += 1;
        }
        self.max_us = self.max_us.max(us);
        if us > budget_us {
            self.overruns += 1;
        }
    }

    /// Summarize the window and start a new max.
    pub fn take_summary(&mut self) -> TelemetrySummary {
        if self.filled == 0 {
            return TelemetrySummary::default();
        }
        let samples = &self.durations_us[..self.filled];
        let sum: u64 = samples.iter().map(|&us| us as u64).sum();

        // copy lives on the stack
        let mut sorted = self.durations_us;
        sorted[..self.filled].sort_unstable();
        let p95 = sorted[(self.filled * 95 / 100).max(1) - 1];

        let summary = TelemetrySummary {
            avg_us: (sum / self.filled as u64) as u32,
            max_us: self.max_us,
            p95_us: p95,
            overruns: self.overruns,
        };
        self.max_us = 0;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_averages_window() {
        let mut t = ProcessTelemetry::new();
        t.record(Duration::from_micros(100), 1000);
        t.record(Duration::from_micros(200), 1000);
        t.record(Duration::from_micros(300), 1000);
        let s = t.take_summary();
        assert_eq!(s.avg_us, 200);
        assert_eq!(s.max_us, 300);
        assert_eq!(s.overruns, 0);
    }

    #[test]
    fn overruns_accumulate_across_summaries() {
        let mut t = ProcessTelemetry::new();
        t.record(Duration::from_micros(1500), 1000);
        assert_eq!(t.take_summary().overruns, 1);
        t.record(Duration::from_micros(900), 1000);
        t.record(Duration::from_micros(2000), 1000);
        let s = t.take_summary();
        assert_eq!(s.overruns, 2);
        assert_eq!(s.max_us, 2000);
    }

    #[test]
    fn empty_window_is_zero() {
        assert_eq!(ProcessTelemetry::new().take_summary(), TelemetrySummary::default());
    }
}
