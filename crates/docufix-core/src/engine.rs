use crate::cleanup::{self, IntegrityReport};
use crate::config::AppConfig;
use crate::convert::Converters;
use crate::error::Error;
use crate::mapper::TreeMapper;
use crate::progress::ProgressReporter;
use crate::report::{MappingRow, StatusBreakdown};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub struct FixEngine {
    config: AppConfig,
    converters: Converters,
}

#[derive(Debug)]
pub struct FixResult {
    pub corrected_root: PathBuf,
    pub overflow_root: PathBuf,
    pub mapping: Vec<MappingRow>,
    pub breakdown: StatusBreakdown,
    pub total_files: usize,
    pub pruned_dirs: usize,
    pub integrity: IntegrityReport,
    pub count_duration: Duration,
    pub pass_duration: Duration,
    pub cleanup_duration: Duration,
}

impl FixEngine {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            converters: Converters::discover(),
        }
    }

    /// Replace the discovered converter set; tests use `Converters::none()`
    /// to make external-tool outcomes deterministic.
    pub fn with_converters(mut self, converters: Converters) -> Self {
        self.converters = converters;
        self
    }

    /// Run the full correction pipeline:
    /// 1. Count source files (for global progress and conservation)
    /// 2. Single mapping/conversion pass over the source tree
    /// 3. Prune empty directories in both output trees
    /// 4. File-count conservation check
    pub fn run(
        &self,
        source_root: &Path,
        out_parent: &Path,
        reporter: &dyn ProgressReporter,
    ) -> Result<FixResult, Error> {
        self.config.validate()?;
        if !source_root.is_dir() {
            return Err(Error::InvalidSource(source_root.to_path_buf()));
        }
        std::fs::create_dir_all(out_parent)?;
        info!("Fixing {} into {}", source_root.display(), out_parent.display());

        reporter.on_count_start();
        let count_start = Instant::now();
        let total_files = cleanup::count_files(source_root);
        let count_duration = count_start.elapsed();
        reporter.on_count_complete(total_files, count_duration.as_secs_f64());
        debug!(
            "Counted {} files in {:.2}s",
            total_files,
            count_duration.as_secs_f64()
        );

        reporter.on_pass_start(total_files);
        let pass_start = Instant::now();
        let outcome = TreeMapper::run(
            &self.config,
            &self.converters,
            reporter,
            source_root,
            out_parent,
            total_files,
        )?;
        let pass_duration = pass_start.elapsed();
        reporter.on_pass_complete(outcome.processed_files, pass_duration.as_secs_f64());
        debug!(
            "Pass completed in {:.2}s, {} files processed",
            pass_duration.as_secs_f64(),
            outcome.processed_files
        );

        let cleanup_start = Instant::now();
        let pruned = cleanup::prune_empty_dirs(&outcome.corrected_root)
            + cleanup::prune_empty_dirs(&outcome.overflow_root);
        reporter.on_prune_complete(pruned);

        let integrity =
            IntegrityReport::check(source_root, &outcome.corrected_root, &outcome.overflow_root);
        let cleanup_duration = cleanup_start.elapsed();

        let breakdown = StatusBreakdown::from_mapping(&outcome.mapping);
        if integrity.is_balanced() {
            info!(
                "File counts conserved: {} source = {} corrected + {} overflow",
                integrity.source_files, integrity.corrected_files, integrity.overflow_files
            );
        } else {
            warn!(
                "File count mismatch: {} source vs {} corrected + {} overflow \
                 ({} skipped stuck, {} errors)",
                integrity.source_files,
                integrity.corrected_files,
                integrity.overflow_files,
                breakdown.skipped_stuck,
                breakdown.errors
            );
        }

        Ok(FixResult {
            corrected_root: outcome.corrected_root,
            overflow_root: outcome.overflow_root,
            mapping: outcome.mapping,
            breakdown,
            total_files,
            pruned_dirs: pruned,
            integrity,
            count_duration,
            pass_duration,
            cleanup_duration,
        })
    }
}
