use std::fmt;

use tracing::{info, warn};

/// Checkpoint an export run has reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    Preparing,
    /// Batch `index` (0-based) of `count` is about to be processed.
    Batch { index: usize, count: usize },
    Finalizing,
    Done,
    Failed,
}

impl fmt::Display for ProgressStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressStage::Preparing => f.write_str("preparing"),
            ProgressStage::Batch { index, count } => write!(f, "batch {}/{}", index + 1, count),
            ProgressStage::Finalizing => f.write_str("finalizing"),
            ProgressStage::Done => f.write_str("done"),
            ProgressStage::Failed => f.write_str("failed"),
        }
    }
}

/// One progress report.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub percent: u8,
    pub stage: ProgressStage,
    pub message: String,
}

/// Receives progress while an export runs.
pub trait ProgressReporter {
    fn report(&mut self, progress: &Progress);
}

impl<F> ProgressReporter for F
where
    F: FnMut(&Progress),
{
    fn report(&mut self, progress: &Progress) {
        self(progress)
    }
}

/// Logs every progress report through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn report(&mut self, progress: &Progress) {
        match progress.stage {
            ProgressStage::Failed => warn!(
                percent = progress.percent,
                stage = %progress.stage,
                "{}",
                progress.message
            ),
            _ => info!(
                percent = progress.percent,
                stage = %progress.stage,
                "{}",
                progress.message
            ),
        }
    }
}

/// Keeps reported percentages non-decreasing and capped at 100.
pub(crate) struct MonotonicProgress<'a> {
    inner: &'a mut dyn ProgressReporter,
    last: u8,
}

impl<'a> MonotonicProgress<'a> {
    pub(crate) fn new(inner: &'a mut dyn ProgressReporter) -> Self {
        Self { inner, last: 0 }
    }

    pub(crate) fn emit(&mut self, percent: f32, stage: ProgressStage, message: String) {
        let percent = (percent.round().clamp(0.0, 100.0) as u8).max(self.last);
        self.last = percent;
        self.inner.report(&Progress {
            percent,
            stage,
            message,
        });
    }

    pub(crate) fn last(&self) -> u8 {
        self.last
    }
}
