/// Answer to "this copy is taking too long".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StuckDecision {
    /// Resume the copy with no time limit.
    Continue,
    /// Give up on this file; it is recorded as skipped.
    Abandon,
}

/// Answer to "this converter is stuck or timed out".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStuckDecision {
    /// Copy the original file, unconverted, into the corrected tree.
    CopyOriginal,
    /// Skip the file; it is recorded as skipped.
    Skip,
}

/// Trait for reporting run progress and resolving stuck-file decisions.
///
/// CLI implements with indicatif bars and terminal prompts. All progress
/// methods have default no-op implementations; the decision methods default
/// to giving up, so a non-interactive run never hangs.
pub trait ProgressReporter: Send + Sync {
    fn on_count_start(&self) {}
    fn on_count_complete(&self, _total_files: usize, _duration_secs: f64) {}
    fn on_pass_start(&self, _total_files: usize) {}
    fn on_global_progress(&self, _done: usize, _total: usize, _current_rel_path: &str) {}
    fn on_file_progress(&self, _bytes_done: u64, _bytes_total: u64, _file_name: &str) {}
    fn on_pass_complete(&self, _processed: usize, _duration_secs: f64) {}
    fn on_prune_complete(&self, _removed_dirs: usize) {}

    fn on_copy_stuck(&self, _rel_path: &str) -> StuckDecision {
        StuckDecision::Abandon
    }

    fn on_conversion_stuck(&self, _rel_path: &str) -> ConversionStuckDecision {
        ConversionStuckDecision::Skip
    }
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
