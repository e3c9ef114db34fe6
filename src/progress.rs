#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

//===========================================================================//

/// A snapshot of a batch's progress.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct BatchProgress {
    /// The number of input files in the batch.
    pub total_files: usize,
    /// The number of files finished so far, successfully or not.
    pub completed_files: usize,
    /// The file name a worker just started on, or `None` for the initial and
    /// completion reports.
    pub current_file: Option<String>,
}

impl BatchProgress {
    /// Returns true once every file has been accounted for.
    pub fn is_complete(&self) -> bool {
        self.completed_files >= self.total_files
    }
}

//===========================================================================//

/// Receives progress reports from a running batch.
///
/// Reports arrive from worker threads, but never concurrently: the batch
/// serializes them, so `completed_files` never decreases from one call to
/// the next.  Implementations should return quickly.
pub trait ProgressSink: Sync {
    /// Called once at the start of the batch, when each file starts, and
    /// after each file finishes.
    fn report(&self, progress: BatchProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(BatchProgress) + Sync,
{
    fn report(&self, progress: BatchProgress) {
        self(progress)
    }
}

/// A `ProgressSink` that ignores every report.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _progress: BatchProgress) {}
}

//===========================================================================//
