#[cfg(target_os = "windows")]
pub mod windows;

use std::path::{Path, PathBuf};

/// Extended-length form of a path for I/O calls that may exceed the classic
/// Windows MAX_PATH limit. Identity everywhere else.
#[cfg(target_os = "windows")]
pub fn extended_length(path: &Path) -> PathBuf {
    windows::extended_length(path)
}

#[cfg(not(target_os = "windows"))]
pub fn extended_length(path: &Path) -> PathBuf {
    path.to_path_buf()
}

/// Undo `extended_length` for display and bookkeeping.
#[cfg(target_os = "windows")]
pub fn strip_extended_prefix(path: &Path) -> PathBuf {
    windows::strip_extended_prefix(path)
}

#[cfg(not(target_os = "windows"))]
pub fn strip_extended_prefix(path: &Path) -> PathBuf {
    path.to_path_buf()
}
