use std::path::{Path, PathBuf};

pub fn extended_length(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if s.starts_with(r"\\?\") || s.starts_with(r"\\.\") {
        return path.to_path_buf();
    }
    if s.starts_with(r"\\") {
        // UNC share: \\server\share -> \\?\UNC\server\share
        return PathBuf::from(format!(r"\\?\UNC\{}", &s[2..]));
    }
    PathBuf::from(format!(r"\\?\{}", s))
}

pub fn strip_extended_prefix(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix(r"\\?\UNC\") {
        return PathBuf::from(format!(r"\\{}", rest));
    }
    if let Some(rest) = s.strip_prefix(r"\\?\") {
        return PathBuf::from(rest);
    }
    path.to_path_buf()
}
