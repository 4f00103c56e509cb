use docufix_core::{ConversionStuckDecision, ProgressReporter, StuckDecision};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::sync::Mutex;

/// CLI progress reporter using indicatif progress bars.
///
/// - Count phase: spinner (total unknown upfront)
/// - Fix pass: global bar (files) plus a transient per-file byte bar
/// - Stuck decisions: bars suspended, y/N prompt on the terminal
pub struct CliReporter {
    multi: MultiProgress,
    global: Mutex<Option<ProgressBar>>,
    file: Mutex<Option<ProgressBar>>,
    non_interactive: bool,
}

impl CliReporter {
    pub fn new(non_interactive: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            global: Mutex::new(None),
            file: Mutex::new(None),
            non_interactive,
        }
    }

    fn replace(&self, slot: &Mutex<Option<ProgressBar>>, pb: ProgressBar) {
        let mut guard = slot.lock().unwrap();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(self.multi.add(pb));
    }

    fn finish(&self, slot: &Mutex<Option<ProgressBar>>) {
        let mut guard = slot.lock().unwrap();
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }

    fn prompt_confirm(&self, prompt: &str) -> bool {
        self.multi.suspend(|| {
            let mut input = String::new();
            loop {
                input.clear();
                print!("{} (y/N): ", prompt);
                if io::stdout().flush().is_err() {
                    return false;
                }
                if io::stdin().read_line(&mut input).is_err() {
                    return false;
                }
                match input.trim().to_uppercase().as_str() {
                    "Y" => return true,
                    "N" | "" => return false,
                    _ => continue,
                }
            }
        })
    }
}

impl ProgressReporter for CliReporter {
    fn on_count_start(&self) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message("Counting files...");
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        self.replace(&self.global, pb);
    }

    fn on_count_complete(&self, total_files: usize, duration_secs: f64) {
        self.finish(&self.global);
        eprintln!(
            "  \x1b[32m✓\x1b[0m Count complete: {} files in {:.2}s",
            total_files, duration_secs
        );
    }

    fn on_pass_start(&self, total_files: usize) {
        let pb = ProgressBar::new(total_files as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "  {spinner:.cyan} Fixing [{bar:30.cyan/dim}] {pos}/{len} {wide_msg}",
            )
            .unwrap()
            .progress_chars("━╸─")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        self.replace(&self.global, pb);
    }

    fn on_global_progress(&self, done: usize, _total: usize, current_rel_path: &str) {
        let guard = self.global.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            pb.set_position(done as u64);
            pb.set_message(current_rel_path.to_string());
        }
    }

    fn on_file_progress(&self, bytes_done: u64, bytes_total: u64, file_name: &str) {
        let mut guard = self.file.lock().unwrap();
        let pb = guard.get_or_insert_with(|| {
            let pb = ProgressBar::new(bytes_total);
            pb.set_style(
                ProgressStyle::with_template(
                    "    {bytes}/{total_bytes} [{bar:20.dim}] {wide_msg}",
                )
                .unwrap()
                .progress_chars("━╸─"),
            );
            self.multi.add(pb)
        });
        if pb.length() != Some(bytes_total) {
            pb.set_length(bytes_total);
        }
        pb.set_position(bytes_done);
        pb.set_message(file_name.to_string());
        if bytes_done >= bytes_total {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }

    fn on_pass_complete(&self, processed: usize, duration_secs: f64) {
        self.finish(&self.file);
        self.finish(&self.global);
        eprintln!(
            "  \x1b[32m✓\x1b[0m Fix pass complete: {} files in {:.2}s",
            processed, duration_secs
        );
    }

    fn on_prune_complete(&self, removed_dirs: usize) {
        eprintln!(
            "  \x1b[32m✓\x1b[0m Cleanup complete: {} empty directories removed",
            removed_dirs
        );
    }

    fn on_copy_stuck(&self, rel_path: &str) -> StuckDecision {
        if self.non_interactive {
            return StuckDecision::Abandon;
        }
        let prompt = format!(
            "Copying is taking too long:\n\n  {}\n\nContinue with no time limit?",
            rel_path
        );
        if self.prompt_confirm(&prompt) {
            StuckDecision::Continue
        } else {
            StuckDecision::Abandon
        }
    }

    fn on_conversion_stuck(&self, rel_path: &str) -> ConversionStuckDecision {
        if self.non_interactive {
            return ConversionStuckDecision::Skip;
        }
        let prompt = format!(
            "The converter is stuck or timed out:\n\n  {}\n\nCopy the original file unconverted?",
            rel_path
        );
        if self.prompt_confirm(&prompt) {
            ConversionStuckDecision::CopyOriginal
        } else {
            ConversionStuckDecision::Skip
        }
    }
}
