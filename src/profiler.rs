//! Frame timing and speedup measurement.
//!
//! [`FrameProfiler`] records how long each frame took and reports the total
//! run time against a reference duration. Record the duration of a full run
//! on one machine, pass it as the reference next time, and the speedup
//! shows what an optimization bought.
//!
//! ```no_run
//! use tank_sim::{BattleConfig, BattleWorld, FrameProfiler};
//!
//! let mut battle = BattleWorld::with_default_battle(BattleConfig::default()).unwrap();
//! let mut profiler = FrameProfiler::new();
//! while !battle.is_finished() {
//!     profiler.time_frame(|| battle.run_frame());
//! }
//! println!("{}", profiler.report(None));
//! ```

use std::time::{Duration, Instant};
use tracing::info;

/// Aggregated frame timings.
#[derive(Debug, Default, Clone)]
pub struct FrameProfiler {
    total_time: Duration,
    frame_count: u64,
    min_time: Option<Duration>,
    max_time: Option<Duration>,
}

impl FrameProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame's duration.
    pub fn record(&mut self, elapsed: Duration) {
        self.total_time += elapsed;
        self.frame_count += 1;
        self.min_time = Some(self.min_time.map_or(elapsed, |m| m.min(elapsed)));
        self.max_time = Some(self.max_time.map_or(elapsed, |m| m.max(elapsed)));
    }

    /// Time a frame using a closure.
    pub fn time_frame<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        self.record(start.elapsed());
        result
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn total(&self) -> Duration {
        self.total_time
    }

    pub fn average(&self) -> Duration {
        if self.frame_count == 0 {
            Duration::ZERO
        } else {
            self.total_time.div_f64(self.frame_count as f64)
        }
    }

    pub fn min(&self) -> Option<Duration> {
        self.min_time
    }

    pub fn max(&self) -> Option<Duration> {
        self.max_time
    }

    /// How many times faster this run was than `reference`.
    pub fn speedup(&self, reference: Duration) -> Option<f64> {
        let total = self.total_time.as_secs_f64();
        (total > 0.0).then(|| reference.as_secs_f64() / total)
    }

    /// Human-readable summary: `mm:ss:mmm`, per-frame stats and, when a
    /// reference is given, the speedup against it.
    pub fn report(&self, reference: Option<Duration>) -> String {
        let ms = self.total_time.as_millis();
        let mut out = format!(
            "{:02}:{:02}:{:03} over {} frames (avg {:.2?}, min {:.2?}, max {:.2?})",
            ms / 60_000,
            (ms / 1000) % 60,
            ms % 1000,
            self.frame_count,
            self.average(),
            self.min_time.unwrap_or_default(),
            self.max_time.unwrap_or_default(),
        );
        if let Some(speedup) = reference.and_then(|r| self.speedup(r)) {
            out.push_str(&format!("\nSPEEDUP: {speedup:4.1}"));
        }
        out
    }

    /// Emit the summary through `tracing`.
    pub fn log_summary(&self, reference: Option<Duration>) {
        info!(
            frames = self.frame_count,
            total_ms = self.total_time.as_secs_f64() * 1000.0,
            avg_ms = self.average().as_secs_f64() * 1000.0,
            speedup = reference.and_then(|r| self.speedup(r)),
            "run complete"
        );
    }

    /// Reset all profiling data.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_profiler_basic() {
        let mut profiler = FrameProfiler::new();

        let value = profiler.time_frame(|| {
            sleep(Duration::from_millis(10));
            7
        });

        assert_eq!(value, 7);
        assert_eq!(profiler.frame_count(), 1);
        assert!(profiler.total() >= Duration::from_millis(10));
    }

    #[test]
    fn test_stats_and_speedup() {
        let mut profiler = FrameProfiler::new();
        assert_eq!(profiler.average(), Duration::ZERO);
        assert_eq!(profiler.speedup(Duration::from_secs(1)), None);

        for ms in [10, 30, 20] {
            profiler.record(Duration::from_millis(ms));
        }

        assert_eq!(profiler.total(), Duration::from_millis(60));
        assert_eq!(profiler.average(), Duration::from_millis(20));
        assert_eq!(profiler.min(), Some(Duration::from_millis(10)));
        assert_eq!(profiler.max(), Some(Duration::from_millis(30)));
        let speedup = profiler.speedup(Duration::from_millis(120)).unwrap();
        assert!((speedup - 2.0).abs() < 1e-9);

        let report = profiler.report(Some(Duration::from_millis(120)));
        assert!(report.starts_with("00:00:060 over 3 frames"));
        assert!(report.contains("SPEEDUP:  2.0"));

        profiler.reset();
        assert_eq!(profiler.frame_count(), 0);
    }
}
