//! Unit progress reporting with ETA estimation

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counts finished units across worker threads and logs progress
#[derive(Debug)]
pub struct ProgressTracker {
    total: u64,
    finished: AtomicU64,
    failed: AtomicU64,
    start_time: Instant,
    label: String,
}

impl ProgressTracker {
    /// Creates a tracker for `total` units
    pub fn new(total: u64, label: &str) -> Self {
        Self {
            total,
            finished: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            start_time: Instant::now(),
            label: label.to_string(),
        }
    }

    /// Units finished so far, successful or not
    pub fn finished(&self) -> u64 {
        self.finished.load(Ordering::Relaxed)
    }

    /// Units that failed so far
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Records one finished unit; logs every `report_interval` units and at the end
    pub fn finish_unit(&self, succeeded: bool, report_interval: u64) -> u64 {
        if !succeeded {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        let current = self.finished.fetch_add(1, Ordering::Relaxed) + 1;
        if current % report_interval.max(1) == 0 || current == self.total {
            self.report(current);
        }
        current
    }

    fn report(&self, current: u64) {
        let elapsed_secs = self.start_time.elapsed().as_secs_f64();
        let failed = self.failed();

        if current < self.total {
            let rate = current as f64 / elapsed_secs.max(f64::EPSILON);
            let remaining = (self.total - current) as f64 / rate;
            tracing::info!(
                units = current,
                total = self.total,
                failed,
                elapsed = %format_duration(elapsed_secs),
                eta = %format_duration(remaining),
                "{}: {:.1}% of units done",
                self.label,
                percent(current, self.total),
            );
        } else {
            tracing::info!(
                units = current,
                failed,
                elapsed = %format_duration(elapsed_secs),
                "{}: all units done",
                self.label,
            );
        }
    }
}

fn percent(current: u64, total: u64) -> f64 {
    if total > 0 {
        (current as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Formats seconds into a human-readable duration string
pub fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else if secs < 3600.0 {
        let mins = (secs / 60.0).floor() as u64;
        let remaining = secs - (mins as f64 * 60.0);
        format!("{}m {:.0}s", mins, remaining)
    } else {
        let hours = (secs / 3600.0).floor() as u64;
        let remaining = secs - (hours as f64 * 3600.0);
        let mins = (remaining / 60.0).floor() as u64;
        let remaining_secs = remaining - (mins as f64 * 60.0);
        format!("{}h {}m {:.0}s", hours, mins, remaining_secs)
    }
}
