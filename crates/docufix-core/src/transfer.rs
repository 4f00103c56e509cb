use crate::config::AppConfig;
use crate::platform;
use crate::progress::{ProgressReporter, StuckDecision};
use crate::report::FileStatus;
use filetime::FileTime;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Completed,
    /// Deadline hit between chunks; no further reads were issued.
    TimedOut,
}

/// Chunked copy with a cooperative deadline. Progress is reported after every
/// chunk; the deadline is checked between chunks, so an in-flight chunk is
/// never cut short. Timestamps are preserved best-effort on completion.
pub fn copy_chunked(
    src: &Path,
    dst: &Path,
    chunk_size: usize,
    timeout: Option<Duration>,
    file_name: &str,
    reporter: &dyn ProgressReporter,
) -> std::io::Result<CopyOutcome> {
    let src_io = platform::extended_length(src);
    let dst_io = platform::extended_length(dst);

    let total = std::fs::metadata(&src_io)?.len();
    let mut reader = File::open(&src_io)?;
    let mut writer = File::create(&dst_io)?;
    let mut buf = vec![0u8; chunk_size];
    let mut copied: u64 = 0;
    let start = Instant::now();

    loop {
        let read = reader.read(&mut buf)?;
        if read == 0 {
            break;
        }
        writer.write_all(&buf[..read])?;
        copied += read as u64;
        reporter.on_file_progress(copied, total, file_name);

        if let Some(limit) = timeout {
            if start.elapsed() > limit {
                return Ok(CopyOutcome::TimedOut);
            }
        }
    }
    writer.flush()?;
    drop(writer);

    preserve_times(&src_io, &dst_io);
    reporter.on_file_progress(total, total, file_name);
    Ok(CopyOutcome::Completed)
}

/// Failure to carry timestamps over is logged, never an error.
fn preserve_times(src: &Path, dst: &Path) {
    match std::fs::metadata(src) {
        Ok(meta) => {
            let mtime = FileTime::from_last_modification_time(&meta);
            let atime = FileTime::from_last_access_time(&meta);
            if let Err(err) = filetime::set_file_times(dst, atime, mtime) {
                debug!("Could not preserve timestamps on {}: {}", dst.display(), err);
            }
        }
        Err(err) => debug!("Could not read metadata of {}: {}", src.display(), err),
    }
}

/// Copy with the timeout escalation: a copy that exceeds its deadline asks
/// the reporter whether to resume without a limit or abandon the file. There
/// is no silent cancellation; the answer is obeyed and logged.
pub fn copy_with_stuck_prompt(
    src: &Path,
    dst: &Path,
    rel_path: &str,
    config: &AppConfig,
    reporter: &dyn ProgressReporter,
) -> FileStatus {
    let file_name = src
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match copy_chunked(
        src,
        dst,
        config.chunk_size,
        Some(config.copy_timeout()),
        &file_name,
        reporter,
    ) {
        Ok(CopyOutcome::Completed) => FileStatus::Copied,
        Ok(CopyOutcome::TimedOut) => match reporter.on_copy_stuck(rel_path) {
            StuckDecision::Continue => {
                match copy_chunked(src, dst, config.chunk_size, None, &file_name, reporter) {
                    Ok(CopyOutcome::Completed) => FileStatus::CopiedSlow,
                    Ok(CopyOutcome::TimedOut) => unreachable!("unbounded copy cannot time out"),
                    Err(err) => {
                        warn!("Copy of {} failed: {}", src.display(), err);
                        FileStatus::Error
                    }
                }
            }
            StuckDecision::Abandon => {
                // Leave no partial file behind.
                let _ = std::fs::remove_file(platform::extended_length(dst));
                FileStatus::SkippedStuck
            }
        },
        Err(err) => {
            warn!("Copy of {} failed: {}", src.display(), err);
            FileStatus::Error
        }
    }
}
