use crate::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    File,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Dir => write!(f, "DIR"),
            EntryKind::File => write!(f, "FILE"),
        }
    }
}

/// Terminal status of one source node. Every file obtains exactly one of
/// these; nothing leaves the run without a mapping row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// Directory placed (directories have no conversion outcome).
    Ok,
    /// Converted to PDF at the destination.
    Converted,
    /// Already a PDF, copied directly.
    Copied,
    /// Copy exceeded its timeout and was completed after user approval.
    CopiedSlow,
    /// Converter stuck; the original was copied unconverted on request.
    CopiedAfterStuck,
    /// Unconvertible; moved under the overflow root.
    ExtractedNonPdf,
    /// Hidden or temp basename, deliberately untouched.
    SkippedHidden,
    /// Abandoned after a stuck copy or stuck converter.
    SkippedStuck,
    /// I/O failure; the run continued.
    Error,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileStatus::Ok => "OK",
            FileStatus::Converted => "CONVERTED",
            FileStatus::Copied => "COPIED",
            FileStatus::CopiedSlow => "COPIED_SLOW",
            FileStatus::CopiedAfterStuck => "COPIED_AFTER_STUCK",
            FileStatus::ExtractedNonPdf => "EXTRACTED_NON_PDF",
            FileStatus::SkippedHidden => "SKIPPED_HIDDEN",
            FileStatus::SkippedStuck => "SKIPPED_STUCK",
            FileStatus::Error => "ERROR",
        };
        write!(f, "{s}")
    }
}

/// One append-only audit record: where a source node went and how.
#[derive(Debug, Clone)]
pub struct MappingRow {
    pub kind: EntryKind,
    pub original: PathBuf,
    pub corrected: Option<PathBuf>,
    pub status: FileStatus,
}

impl MappingRow {
    pub fn new(
        kind: EntryKind,
        original: PathBuf,
        corrected: Option<PathBuf>,
        status: FileStatus,
    ) -> Self {
        Self {
            kind,
            original,
            corrected,
            status,
        }
    }
}

/// Per-status totals over the file rows of a mapping.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatusBreakdown {
    pub converted: usize,
    pub copied: usize,
    pub copied_slow: usize,
    pub copied_after_stuck: usize,
    pub extracted_non_pdf: usize,
    pub skipped_hidden: usize,
    pub skipped_stuck: usize,
    pub errors: usize,
}

impl StatusBreakdown {
    pub fn from_mapping(rows: &[MappingRow]) -> Self {
        let mut b = Self::default();
        for row in rows.iter().filter(|r| r.kind == EntryKind::File) {
            match row.status {
                FileStatus::Converted => b.converted += 1,
                FileStatus::Copied => b.copied += 1,
                FileStatus::CopiedSlow => b.copied_slow += 1,
                FileStatus::CopiedAfterStuck => b.copied_after_stuck += 1,
                FileStatus::ExtractedNonPdf => b.extracted_non_pdf += 1,
                FileStatus::SkippedHidden => b.skipped_hidden += 1,
                FileStatus::SkippedStuck => b.skipped_stuck += 1,
                FileStatus::Error => b.errors += 1,
                FileStatus::Ok => {}
            }
        }
        b
    }

    pub fn total_skipped(&self) -> usize {
        self.skipped_hidden + self.skipped_stuck
    }
}

/// Write the mapping log as CSV: `Type,Original,Corrected,Status`.
pub fn write_mapping_csv(rows: &[MappingRow], path: &Path) -> Result<(), Error> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Type", "Original", "Corrected", "Status"])?;
    for row in rows {
        writer.write_record([
            row.kind.to_string(),
            row.original.to_string_lossy().into_owned(),
            row.corrected
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            row.status.to_string(),
        ])?;
    }
    writer.flush().map_err(std::io::Error::from)?;
    Ok(())
}
