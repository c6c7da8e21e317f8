//! Byte-proportional batch progress
//!
//! Owned by the scheduler's completion loop; workers never touch it.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::Serialize;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {binary_bytes_per_sec} {eta} {msg}";

/// Progress at one point of a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub done_bytes: u64,
    pub total_bytes: u64,
    pub succeeded: usize,
    pub failed: usize,
}

impl ProgressSnapshot {
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Share of bytes accounted for, 0.0..=100.0
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 100.0;
        }
        self.done_bytes as f64 * 100.0 / self.total_bytes as f64
    }
}

/// Monotonic byte counter over completed items
#[derive(Debug)]
pub struct ProgressState {
    snapshot: ProgressSnapshot,
}

impl ProgressState {
    pub fn new(total_bytes: u64) -> Self {
        Self {
            snapshot: ProgressSnapshot {
                done_bytes: 0,
                total_bytes,
                succeeded: 0,
                failed: 0,
            },
        }
    }

    /// Account for one completed item, successful or not
    pub fn advance(&mut self, size: u64, succeeded: bool) -> ProgressSnapshot {
        let snapshot = &mut self.snapshot;
        snapshot.done_bytes = snapshot
            .done_bytes
            .saturating_add(size)
            .min(snapshot.total_bytes);
        if succeeded {
            snapshot.succeeded += 1;
        } else {
            snapshot.failed += 1;
        }
        *snapshot
    }
}

/// Byte-sized bar for a batch of `total_bytes`
pub fn progress_bar(total_bytes: u64, target: ProgressDrawTarget) -> ProgressBar {
    let bar = ProgressBar::with_draw_target(Some(total_bytes), target);
    let style = ProgressStyle::with_template(BAR_TEMPLATE)
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

/// Move the bar to a snapshot
pub fn render(bar: &ProgressBar, snapshot: &ProgressSnapshot) {
    bar.set_position(snapshot.done_bytes);
    bar.set_message(format!("{} ok, {} failed", snapshot.succeeded, snapshot.failed));
}
