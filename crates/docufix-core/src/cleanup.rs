use crate::platform;
use crate::walk::is_hidden_or_temp;
use std::path::Path;
use tracing::{debug, error};
use walkdir::WalkDir;

/// Remove directories with zero entries, bottom-up. The root itself is never
/// removed. Returns how many were pruned.
pub fn prune_empty_dirs(root: &Path) -> usize {
    let mut removed = 0;
    for entry in WalkDir::new(platform::extended_length(root))
        .contents_first(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_dir() || entry.depth() == 0 {
            continue;
        }
        let path = entry.path();
        let is_empty = match std::fs::read_dir(path) {
            Ok(mut entries) => entries.next().is_none(),
            Err(err) => {
                error!("Cannot inspect {}: {}", path.display(), err);
                continue;
            }
        };
        if is_empty {
            match std::fs::remove_dir(path) {
                Ok(()) => {
                    debug!("Pruned empty directory {}", path.display());
                    removed += 1;
                }
                Err(err) => error!("Cannot prune {}: {}", path.display(), err),
            }
        }
    }
    removed
}

/// Count regular files under `root`, ignoring hidden/temp basenames, so the
/// count matches the population the mapper processes.
pub fn count_files(root: &Path) -> usize {
    WalkDir::new(platform::extended_length(root))
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| !is_hidden_or_temp(&e.file_name().to_string_lossy()))
        .count()
}

/// File-count conservation between source and the two output trees. A
/// mismatch is reported, never auto-corrected: it signals files skipped by
/// stuck/timeout decisions and must reach the operator.
#[derive(Debug, Clone, Copy)]
pub struct IntegrityReport {
    pub source_files: usize,
    pub corrected_files: usize,
    pub overflow_files: usize,
}

impl IntegrityReport {
    pub fn check(source: &Path, corrected: &Path, overflow: &Path) -> Self {
        Self {
            source_files: count_files(source),
            corrected_files: count_files(corrected),
            overflow_files: count_files(overflow),
        }
    }

    pub fn is_balanced(&self) -> bool {
        self.source_files == self.corrected_files + self.overflow_files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn prunes_nested_empty_chains_but_not_root() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("out");
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::create_dir_all(root.join("kept")).unwrap();
        fs::write(root.join("kept/file.pdf"), "x").unwrap();

        let removed = prune_empty_dirs(&root);
        assert_eq!(removed, 3);
        assert!(root.exists());
        assert!(root.join("kept/file.pdf").exists());
        assert!(!root.join("a").exists());
    }

    #[test]
    fn count_ignores_hidden_and_temp() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("one.txt"), "x").unwrap();
        fs::write(tmp.path().join("Thumbs.db"), "x").unwrap();
        fs::write(tmp.path().join("~$lock.docx"), "x").unwrap();
        assert_eq!(count_files(tmp.path()), 1);
    }

    #[test]
    fn balanced_integrity() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        let corr = tmp.path().join("corr");
        let over = tmp.path().join("over");
        for d in [&src, &corr, &over] {
            fs::create_dir_all(d).unwrap();
        }
        fs::write(src.join("a.txt"), "x").unwrap();
        fs::write(src.join("b.dat"), "x").unwrap();
        fs::write(corr.join("aC.pdf"), "x").unwrap();
        fs::write(over.join("b.dat"), "x").unwrap();

        let report = IntegrityReport::check(&src, &corr, &over);
        assert!(report.is_balanced());
    }
}
