use crate::config::AppConfig;
use crate::platform;
use std::path::{Path, PathBuf};

/// Splits a name into stem and extension (extension keeps its dot).
/// Dotfiles and extensionless names have an empty extension.
pub fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn take_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// Places candidate (directory, name) pairs so that the three path
/// invariants hold simultaneously: depth violations bubble the entry toward
/// the floor, length violations bubble then truncate, and every landing spot
/// is re-checked for sibling uniqueness.
pub struct ConstraintFitter<'a> {
    config: &'a AppConfig,
}

impl<'a> ConstraintFitter<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }

    /// Character length of `path` relative to `floor` (0 for the floor itself).
    pub fn rel_len(&self, path: &Path, floor: &Path) -> usize {
        match path.strip_prefix(floor) {
            Ok(rel) => char_len(&rel.to_string_lossy()),
            Err(_) => char_len(&path.to_string_lossy()),
        }
    }

    /// Nesting depth of `path` relative to `floor` (0 for the floor itself).
    pub fn rel_depth(&self, path: &Path, floor: &Path) -> usize {
        match path.strip_prefix(floor) {
            Ok(rel) => rel.components().count(),
            Err(_) => path.components().count(),
        }
    }

    /// Length of `dir/name` relative to `floor`, counting one separator when
    /// `dir` is below the floor.
    pub fn rel_join_len(&self, dir: &Path, name: &str, floor: &Path) -> usize {
        let dir_len = self.rel_len(dir, floor);
        if dir_len == 0 {
            char_len(name)
        } else {
            dir_len + 1 + char_len(name)
        }
    }

    /// Bubble a directory upward until its own depth fits.
    pub fn bubble_dir_for_depth(&self, mut dir: PathBuf, floor: &Path) -> PathBuf {
        while self.rel_depth(&dir, floor) > self.config.max_depth && dir != floor {
            match dir.parent() {
                Some(parent) => dir = parent.to_path_buf(),
                None => break,
            }
        }
        dir
    }

    /// Bubble the directory an entry will be placed into, so the entry itself
    /// (one level deeper) fits.
    pub fn bubble_entry_for_depth(&self, mut dir: PathBuf, floor: &Path) -> PathBuf {
        while self.rel_depth(&dir, floor) + 1 > self.config.max_depth && dir != floor {
            match dir.parent() {
                Some(parent) => dir = parent.to_path_buf(),
                None => break,
            }
        }
        dir
    }

    /// Truncate the stem so the whole name fits in `max_len` characters,
    /// keeping the extension. A stem emptied by truncation becomes "a".
    pub fn limit_filename(&self, name: &str, max_len: usize) -> String {
        if char_len(name) <= max_len {
            return name.to_string();
        }
        let (stem, ext) = split_name(name);
        let ext_len = char_len(ext);
        if max_len <= ext_len {
            return take_chars(name, max_len);
        }
        let kept = take_chars(stem, max_len - ext_len);
        let kept = if kept.is_empty() { "a".to_string() } else { kept };
        format!("{kept}{ext}")
    }

    /// Assemble `core` + disambiguator + suffix + extension within the
    /// `max_file_name` budget: only the core is ever truncated, so the
    /// marker and extension always survive.
    fn compose(&self, core: &str, number: &str, suffix: &str, ext: &str) -> String {
        let fixed = char_len(number) + char_len(suffix) + char_len(ext);
        let keep = self.config.max_file_name.saturating_sub(fixed).max(1);
        let kept = take_chars(core, keep);
        let kept = if kept.is_empty() { "a".to_string() } else { kept };
        format!("{kept}{number}{suffix}{ext}")
    }

    /// Marker-suffixed destination name for a corrected-tree entry, clamped
    /// to `max_file_name` without losing the marker or extension.
    pub fn compose_marked(&self, stem: &str, ext: &str) -> String {
        self.compose(stem, "", &self.config.marker_suffix, ext)
    }

    /// Disambiguate `name` against what already exists in `dir`, inserting an
    /// incrementing number immediately before the marker (when preserved) and
    /// the extension.
    pub fn ensure_unique(&self, dir: &Path, name: &str, preserve_marker: bool) -> String {
        let (stem, ext) = split_name(name);
        let marker = self.config.marker_suffix.as_str();
        let (core, suffix) = if preserve_marker && stem.ends_with(marker) {
            (&stem[..stem.len() - marker.len()], marker)
        } else {
            (stem, "")
        };

        let mut candidate = self.compose(core, "", suffix, ext);
        let mut counter = 2u32;
        while platform::extended_length(&dir.join(&candidate)).exists() {
            candidate = self.compose(core, &counter.to_string(), suffix, ext);
            counter += 1;
        }
        candidate
    }

    /// Fit `name` under `target_dir` without ever exceeding `max_path`
    /// relative to `floor`: bubble toward the floor first (re-uniquing at each
    /// landing spot, since promotion can collide with existing siblings),
    /// then truncate into the exact remaining character budget. The marker
    /// suffix, when preserved, is re-appended after truncation so it can
    /// never be cut away.
    pub fn fit(
        &self,
        target_dir: &Path,
        floor: &Path,
        name: &str,
        preserve_marker: bool,
    ) -> (PathBuf, String) {
        let mut cur_dir = target_dir.to_path_buf();
        let mut cur_name = name.to_string();

        while self.rel_join_len(&cur_dir, &cur_name, floor) > self.config.max_path
            && cur_dir != floor
        {
            match cur_dir.parent() {
                Some(parent) => cur_dir = parent.to_path_buf(),
                None => break,
            }
            cur_name = self.ensure_unique(&cur_dir, &cur_name, preserve_marker);
        }

        if self.rel_join_len(&cur_dir, &cur_name, floor) > self.config.max_path {
            let dir_len = self.rel_len(&cur_dir, floor);
            let sep = if dir_len == 0 { 0 } else { 1 };
            let allowed = self.config.max_path.saturating_sub(dir_len + sep).max(1);

            let (stem, ext) = split_name(&cur_name);
            let marker = self.config.marker_suffix.as_str();
            cur_name = if preserve_marker {
                let core = stem.strip_suffix(marker).unwrap_or(stem);
                let keep = allowed
                    .saturating_sub(char_len(ext) + char_len(marker))
                    .max(1);
                let kept = take_chars(core, keep);
                let kept = if kept.is_empty() { "a".to_string() } else { kept };
                format!("{kept}{marker}{ext}")
            } else {
                let keep = allowed.saturating_sub(char_len(ext)).max(1);
                let kept = take_chars(stem, keep);
                let kept = if kept.is_empty() { "a".to_string() } else { kept };
                format!("{kept}{ext}")
            };
            cur_name = self.ensure_unique(&cur_dir, &cur_name, preserve_marker);
        }

        (cur_dir, cur_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn config() -> AppConfig {
        AppConfig::default()
    }

    #[test]
    fn split_name_cases() {
        assert_eq!(split_name("report.pdf"), ("report", ".pdf"));
        assert_eq!(split_name("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_name(".DS_Store"), (".DS_Store", ""));
        assert_eq!(split_name("noext"), ("noext", ""));
    }

    #[test]
    fn limit_filename_keeps_extension() {
        let cfg = config();
        let fitter = ConstraintFitter::new(&cfg);
        let long = format!("{}.pdf", "x".repeat(100));
        let limited = fitter.limit_filename(&long, 20);
        assert_eq!(limited.chars().count(), 20);
        assert!(limited.ends_with(".pdf"));
    }

    #[test]
    fn limit_filename_extension_longer_than_budget() {
        let cfg = config();
        let fitter = ConstraintFitter::new(&cfg);
        let limited = fitter.limit_filename("x.extension", 3);
        assert_eq!(limited.chars().count(), 3);
    }

    #[test]
    fn depth_bubbling_promotes_to_floor() {
        let cfg = AppConfig {
            max_depth: 2,
            ..config()
        };
        let fitter = ConstraintFitter::new(&cfg);
        let floor = PathBuf::from("/out/root");
        let deep = floor.join("a").join("b").join("c").join("d");
        let placed = fitter.bubble_entry_for_depth(deep, &floor);
        assert_eq!(fitter.rel_depth(&placed, &floor), 1);
    }

    #[test]
    fn fit_bubbles_then_truncates() {
        let tmp = tempdir().unwrap();
        let cfg = AppConfig {
            max_path: 30,
            ..config()
        };
        let fitter = ConstraintFitter::new(&cfg);
        let floor = tmp.path().to_path_buf();
        let deep = floor.join("subdirone").join("subdirtwo");
        fs::create_dir_all(&deep).unwrap();

        let name = format!("{}C.pdf", "n".repeat(60));
        let (dir, fitted) = fitter.fit(&deep, &floor, &name, true);
        assert!(fitter.rel_join_len(&dir, &fitted, &floor) <= cfg.max_path);
        assert!(fitted.ends_with("C.pdf"), "marker survives truncation: {fitted}");
    }

    #[test]
    fn fit_handles_name_longer_than_max_path_alone() {
        let tmp = tempdir().unwrap();
        let cfg = AppConfig {
            max_path: 12,
            max_file_name: 12,
            ..config()
        };
        let fitter = ConstraintFitter::new(&cfg);
        let floor = tmp.path().to_path_buf();

        let name = format!("{}C.pdf", "z".repeat(500));
        let (dir, fitted) = fitter.fit(&floor, &floor, &name, true);
        assert_eq!(dir, floor);
        assert_eq!(fitted.chars().count(), 12);
        assert!(fitted.ends_with("C.pdf"));
    }

    #[test]
    fn compose_marked_truncates_stem_not_marker() {
        let cfg = AppConfig {
            max_file_name: 18,
            ..config()
        };
        let fitter = ConstraintFitter::new(&cfg);
        let name = fitter.compose_marked("informetecnicofinal", ".pdf");
        assert_eq!(name, "informetecnicC.pdf");
        assert_eq!(name.chars().count(), 18);
    }

    #[test]
    fn unique_counter_goes_before_marker_and_extension() {
        let tmp = tempdir().unwrap();
        let cfg = config();
        let fitter = ConstraintFitter::new(&cfg);

        fs::write(tmp.path().join("reportC.pdf"), "x").unwrap();
        fs::write(tmp.path().join("report2C.pdf"), "x").unwrap();
        let unique = fitter.ensure_unique(tmp.path(), "reportC.pdf", true);
        assert_eq!(unique, "report3C.pdf");
    }

    #[test]
    fn unique_without_marker() {
        let tmp = tempdir().unwrap();
        let cfg = config();
        let fitter = ConstraintFitter::new(&cfg);

        fs::write(tmp.path().join("data.dat"), "x").unwrap();
        let unique = fitter.ensure_unique(tmp.path(), "data.dat", false);
        assert_eq!(unique, "data2.dat");
    }
}
