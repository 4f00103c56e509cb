use crate::platform;
use std::path::{Path, PathBuf};
use tracing::error;
use walkdir::WalkDir;

/// OS metadata and editor lock files that are never copied or converted.
const HIDDEN_BASENAMES: [&str; 4] = ["Thumbs.db", ".DS_Store", ".ds_store", "desktop.ini"];

/// Office-style temp/lock prefix.
const TEMP_PREFIX: &str = "~$";

pub fn is_hidden_or_temp(name: &str) -> bool {
    HIDDEN_BASENAMES.contains(&name) || name.starts_with(TEMP_PREFIX)
}

/// One visited filesystem node, parent always yielded before its children.
#[derive(Debug)]
pub struct Entry {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Top-down traversal tolerant of unreadable entries: a directory we cannot
/// read is logged and skipped, never fatal. Paths are handed to the OS in
/// extended-length form and yielded back stripped.
pub fn walk_tree(root: &Path) -> impl Iterator<Item = Entry> {
    WalkDir::new(platform::extended_length(root))
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(Entry {
                path: platform::strip_extended_prefix(entry.path()),
                is_dir: entry.file_type().is_dir(),
            }),
            Err(err) => {
                error!("Skipping unreadable entry: {}", err);
                None
            }
        })
}
