use crate::config::AppConfig;
use crate::report::EntryKind;
use crate::sanitize::has_diacritics;
use crate::walk::{is_hidden_or_temp, walk_tree};
use std::fmt;
use std::path::{Path, PathBuf};

/// Characters that must not appear in destination names.
const FORBIDDEN_CHARS: &str = "\\/:*?\"<>|%&#+{}[];,=";

/// Why an entry would be rewritten by a fix run, in report priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Issue {
    ForbiddenChars,
    Diacritics,
    PathTooLong,
    NameTooLong,
    TooDeep,
    HiddenTemp,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Issue::ForbiddenChars => "ForbiddenChars",
            Issue::Diacritics => "Diacritics",
            Issue::PathTooLong => "PathTooLong",
            Issue::NameTooLong => "NameTooLong",
            Issue::TooDeep => "TooDeep",
            Issue::HiddenTemp => "HiddenTemp",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone)]
pub struct ValidationRow {
    pub kind: EntryKind,
    pub path: PathBuf,
    pub name: String,
    pub path_len: usize,
    pub name_len: usize,
    pub depth: usize,
    pub issues: Vec<Issue>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ValidationCounts {
    pub forbidden_chars: usize,
    pub diacritics: usize,
    pub too_long_path: usize,
    pub too_long_name: usize,
    pub too_deep: usize,
    pub hidden_temp: usize,
}

#[derive(Debug)]
pub struct ValidationReport {
    pub rows: Vec<ValidationRow>,
    pub counts: ValidationCounts,
}

impl ValidationReport {
    pub fn total(&self) -> usize {
        self.rows.len()
    }

    pub fn problematic(&self) -> usize {
        self.rows.iter().filter(|r| !r.issues.is_empty()).count()
    }
}

fn inspect(
    name: &str,
    path: &Path,
    kind: EntryKind,
    root: &Path,
    config: &AppConfig,
    counts: &mut ValidationCounts,
) -> ValidationRow {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let path_len = rel.to_string_lossy().chars().count();
    let name_len = name.chars().count();
    let depth = rel.components().count();

    let mut issues = Vec::new();
    if name.chars().any(|c| FORBIDDEN_CHARS.contains(c)) {
        issues.push(Issue::ForbiddenChars);
        counts.forbidden_chars += 1;
    }
    if has_diacritics(name) {
        issues.push(Issue::Diacritics);
        counts.diacritics += 1;
    }
    if path_len > config.max_path {
        issues.push(Issue::PathTooLong);
        counts.too_long_path += 1;
    }
    if name_len > config.max_file_name {
        issues.push(Issue::NameTooLong);
        counts.too_long_name += 1;
    }
    if depth > config.max_depth {
        issues.push(Issue::TooDeep);
        counts.too_deep += 1;
    }
    if is_hidden_or_temp(name) {
        issues.push(Issue::HiddenTemp);
        counts.hidden_temp += 1;
    }
    issues.sort();

    ValidationRow {
        kind,
        path: path.to_path_buf(),
        name: name.to_string(),
        path_len,
        name_len,
        depth,
        issues,
    }
}

/// Read-only scan listing every entry with its constraint violations, sorted
/// by issue priority then by longest path first. Mutates nothing.
pub fn validate_tree(root: &Path, config: &AppConfig) -> ValidationReport {
    let mut counts = ValidationCounts::default();
    let mut rows = Vec::new();

    for entry in walk_tree(root) {
        if entry.path == root {
            continue;
        }
        let name = entry
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let kind = if entry.is_dir {
            EntryKind::Dir
        } else {
            EntryKind::File
        };
        rows.push(inspect(&name, &entry.path, kind, root, config, &mut counts));
    }

    rows.sort_by(|a, b| {
        let pa = a.issues.first().copied();
        let pb = b.issues.first().copied();
        match (pa, pb) {
            (Some(ia), Some(ib)) => ia.cmp(&ib).then(b.path_len.cmp(&a.path_len)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => b.path_len.cmp(&a.path_len),
        }
    });

    ValidationReport { rows, counts }
}

/// CSV export of the validation scan.
pub fn write_validation_csv(report: &ValidationReport, path: &Path) -> Result<(), crate::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Type", "Path", "Name", "PathLen", "NameLen", "Depth", "Issues"])?;
    for row in &report.rows {
        let issues: Vec<String> = row.issues.iter().map(|i| i.to_string()).collect();
        writer.write_record([
            row.kind.to_string(),
            row.path.to_string_lossy().into_owned(),
            row.name.clone(),
            row.path_len.to_string(),
            row.name_len.to_string(),
            row.depth.to_string(),
            issues.join(","),
        ])?;
    }
    writer.flush().map_err(std::io::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn flags_diacritics_depth_and_hidden() {
        let tmp = tempdir().unwrap();
        let cfg = AppConfig {
            max_depth: 1,
            ..AppConfig::default()
        };
        let deep = tmp.path().join("nivel1").join("nivel2");
        fs::create_dir_all(&deep).unwrap();
        fs::write(deep.join("Técnico.txt"), "x").unwrap();
        fs::write(tmp.path().join("Thumbs.db"), "x").unwrap();

        let report = validate_tree(tmp.path(), &cfg);
        assert_eq!(report.counts.diacritics, 1);
        assert_eq!(report.counts.hidden_temp, 1);
        assert!(report.counts.too_deep >= 1);
        assert!(report.problematic() >= 3);
    }

    #[test]
    fn clean_tree_has_no_issues() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("clean.txt"), "x").unwrap();
        let report = validate_tree(tmp.path(), &AppConfig::default());
        assert_eq!(report.problematic(), 0);
        assert_eq!(report.total(), 1);
    }
}
