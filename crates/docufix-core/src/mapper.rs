use crate::config::AppConfig;
use crate::convert::{classify, convert_to_pdf, ConvertOutcome, Converters, ExtClass};
use crate::error::Error;
use crate::fitter::{split_name, ConstraintFitter};
use crate::platform;
use crate::progress::{ConversionStuckDecision, ProgressReporter};
use crate::report::{EntryKind, FileStatus, MappingRow};
use crate::sanitize::sanitize_component;
use crate::transfer::copy_with_stuck_prompt;
use crate::walk::{is_hidden_or_temp, walk_tree};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Folder-consolidation key: sibling source directories whose sanitized names
/// share the configured prefix, under the same destination parent, map to one
/// destination directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MergeKey {
    pub parent: PathBuf,
    pub prefix: String,
}

/// Result of one mapping pass over the source tree.
#[derive(Debug)]
pub struct MapOutcome {
    pub mapping: Vec<MappingRow>,
    pub corrected_root: PathBuf,
    pub overflow_root: PathBuf,
    pub processed_files: usize,
}

/// Walks the source tree top-down and builds the two destination trees.
/// Parent directories are always resolved before their children; the
/// directory index and merge map are plain single-writer state.
pub struct TreeMapper<'a> {
    config: &'a AppConfig,
    fitter: ConstraintFitter<'a>,
    converters: &'a Converters,
    reporter: &'a dyn ProgressReporter,
    dir_index: HashMap<PathBuf, PathBuf>,
    merge_index: HashMap<MergeKey, PathBuf>,
    mapping: Vec<MappingRow>,
    corrected_root: PathBuf,
    overflow_root: PathBuf,
    processed: usize,
    total: usize,
}

impl<'a> TreeMapper<'a> {
    pub fn run(
        config: &'a AppConfig,
        converters: &'a Converters,
        reporter: &'a dyn ProgressReporter,
        source_root: &Path,
        out_parent: &Path,
        total_files: usize,
    ) -> Result<MapOutcome, Error> {
        let fitter = ConstraintFitter::new(config);

        let source_name = source_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let root_candidate = format!(
            "{}{}{}",
            sanitize_component(&source_name),
            config.corrected_suffix,
            config.marker_suffix
        );
        let root_name = fitter.ensure_unique(out_parent, &root_candidate, true);
        let corrected_root = out_parent.join(root_name);
        std::fs::create_dir_all(platform::extended_length(&corrected_root))?;

        let overflow_root = out_parent.join(&config.overflow_dir_name);
        std::fs::create_dir_all(platform::extended_length(&overflow_root))?;

        let mut mapper = Self {
            config,
            fitter,
            converters,
            reporter,
            dir_index: HashMap::new(),
            merge_index: HashMap::new(),
            mapping: Vec::new(),
            corrected_root,
            overflow_root,
            processed: 0,
            total: total_files,
        };
        mapper
            .dir_index
            .insert(source_root.to_path_buf(), mapper.corrected_root.clone());

        for entry in walk_tree(source_root) {
            if entry.is_dir {
                mapper.place_directory(source_root, &entry.path)?;
            } else {
                mapper.process_file(source_root, &entry.path);
            }
        }

        Ok(MapOutcome {
            mapping: mapper.mapping,
            corrected_root: mapper.corrected_root,
            overflow_root: mapper.overflow_root,
            processed_files: mapper.processed,
        })
    }

    fn place_directory(&mut self, source_root: &Path, dir: &Path) -> Result<(), Error> {
        if dir == source_root {
            self.mapping.push(MappingRow::new(
                EntryKind::Dir,
                dir.to_path_buf(),
                Some(self.corrected_root.clone()),
                FileStatus::Ok,
            ));
            return Ok(());
        }

        let Some(src_parent) = dir.parent() else {
            return Ok(());
        };
        // Parent placed before child by traversal order.
        let Some(dest_parent) = self.dir_index.get(src_parent).cloned() else {
            warn!("No destination resolved for parent of {}", dir.display());
            return Ok(());
        };
        let dest_parent = self
            .fitter
            .bubble_entry_for_depth(dest_parent, &self.corrected_root);

        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let clean = sanitize_component(&name);
        let prefix: String = clean.chars().take(self.config.merge_prefix_len).collect();
        let candidate = self.fitter.compose_marked(&prefix, "");
        let candidate = self.fitter.ensure_unique(&dest_parent, &candidate, true);
        let (parent_final, candidate_final) =
            self.fitter
                .fit(&dest_parent, &self.corrected_root, &candidate, true);

        let key = MergeKey {
            parent: parent_final.clone(),
            prefix,
        };
        let dest_dir = match self.merge_index.get(&key) {
            Some(existing) => {
                debug!(
                    "Merging {} into existing destination {}",
                    dir.display(),
                    existing.display()
                );
                existing.clone()
            }
            None => {
                let dest = self.fitter.bubble_dir_for_depth(
                    parent_final.join(candidate_final),
                    &self.corrected_root,
                );
                std::fs::create_dir_all(platform::extended_length(&dest))?;
                self.merge_index.insert(key, dest.clone());
                dest
            }
        };

        self.dir_index.insert(dir.to_path_buf(), dest_dir.clone());
        self.mapping.push(MappingRow::new(
            EntryKind::Dir,
            dir.to_path_buf(),
            Some(dest_dir),
            FileStatus::Ok,
        ));
        Ok(())
    }

    fn rel_display(&self, source_root: &Path, file: &Path) -> String {
        file.strip_prefix(source_root)
            .map(|rel| rel.to_string_lossy().replace('\\', "/"))
            .unwrap_or_else(|_| {
                file.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
    }

    fn process_file(&mut self, source_root: &Path, file: &Path) {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if is_hidden_or_temp(&name) {
            self.mapping.push(MappingRow::new(
                EntryKind::File,
                file.to_path_buf(),
                None,
                FileStatus::SkippedHidden,
            ));
            return;
        }

        let rel = self.rel_display(source_root, file);
        self.processed += 1;
        self.reporter
            .on_global_progress(self.processed, self.total, &rel);

        let Some(dest_dir) = file
            .parent()
            .and_then(|p| self.dir_index.get(p))
            .cloned()
        else {
            warn!("No destination directory for {}", file.display());
            self.mapping.push(MappingRow::new(
                EntryKind::File,
                file.to_path_buf(),
                None,
                FileStatus::Error,
            ));
            return;
        };

        let (stem, ext) = split_name(&name);
        let stem_clean = sanitize_component(stem);
        let ext_lower = ext.to_ascii_lowercase();
        let class = classify(&ext_lower);

        if class == ExtClass::Pdf {
            self.copy_pdf(file, &rel, &dest_dir, &stem_clean, &ext_lower);
        } else {
            self.convert_file(source_root, file, &rel, &dest_dir, &stem_clean, &ext_lower, class);
        }
    }

    /// Fit a marker-suffixed name under the corrected tree and create its
    /// parent directories.
    fn fit_corrected(&self, dest_dir: &Path, stem_clean: &str, ext: &str) -> std::io::Result<PathBuf> {
        let candidate = self.fitter.compose_marked(stem_clean, ext);
        let candidate = self.fitter.ensure_unique(dest_dir, &candidate, true);
        let depth_dir = self
            .fitter
            .bubble_entry_for_depth(dest_dir.to_path_buf(), &self.corrected_root);
        let (final_dir, final_name) =
            self.fitter
                .fit(&depth_dir, &self.corrected_root, &candidate, true);
        std::fs::create_dir_all(platform::extended_length(&final_dir))?;
        Ok(final_dir.join(final_name))
    }

    fn copy_pdf(
        &mut self,
        file: &Path,
        rel: &str,
        dest_dir: &Path,
        stem_clean: &str,
        ext_lower: &str,
    ) -> FileStatus {
        let target = match self.fit_corrected(dest_dir, stem_clean, ext_lower) {
            Ok(target) => target,
            Err(err) => {
                warn!("Cannot prepare destination for {}: {}", file.display(), err);
                self.mapping.push(MappingRow::new(
                    EntryKind::File,
                    file.to_path_buf(),
                    None,
                    FileStatus::Error,
                ));
                return FileStatus::Error;
            }
        };

        let status = copy_with_stuck_prompt(file, &target, rel, self.config, self.reporter);
        let corrected = matches!(status, FileStatus::Copied | FileStatus::CopiedSlow)
            .then(|| target.clone());
        self.mapping.push(MappingRow::new(
            EntryKind::File,
            file.to_path_buf(),
            corrected,
            status,
        ));
        status
    }

    #[allow(clippy::too_many_arguments)]
    fn convert_file(
        &mut self,
        source_root: &Path,
        file: &Path,
        rel: &str,
        dest_dir: &Path,
        stem_clean: &str,
        ext_lower: &str,
        class: ExtClass,
    ) -> FileStatus {
        let pdf_target = match self.fit_corrected(dest_dir, stem_clean, ".pdf") {
            Ok(target) => target,
            Err(err) => {
                warn!("Cannot prepare destination for {}: {}", file.display(), err);
                self.mapping.push(MappingRow::new(
                    EntryKind::File,
                    file.to_path_buf(),
                    None,
                    FileStatus::Error,
                ));
                return FileStatus::Error;
            }
        };

        match convert_to_pdf(file, &pdf_target, class, self.converters, self.config) {
            ConvertOutcome::Success => {
                self.mapping.push(MappingRow::new(
                    EntryKind::File,
                    file.to_path_buf(),
                    Some(pdf_target),
                    FileStatus::Converted,
                ));
                FileStatus::Converted
            }
            ConvertOutcome::TimedOut => {
                // A killed converter may leave a partial file behind.
                let _ = std::fs::remove_file(platform::extended_length(&pdf_target));
                self.copy_original_or_skip(file, rel, dest_dir, stem_clean, ext_lower)
            }
            ConvertOutcome::Failed => {
                let _ = std::fs::remove_file(platform::extended_length(&pdf_target));
                self.extract_to_overflow(source_root, file, rel, stem_clean, ext_lower)
            }
        }
    }

    /// Stuck-converter escalation: the decision-maker chooses between copying
    /// the original unconverted into the corrected tree or skipping it.
    fn copy_original_or_skip(
        &mut self,
        file: &Path,
        rel: &str,
        dest_dir: &Path,
        stem_clean: &str,
        ext_lower: &str,
    ) -> FileStatus {
        match self.reporter.on_conversion_stuck(rel) {
            ConversionStuckDecision::CopyOriginal => {
                match self.fit_corrected(dest_dir, stem_clean, ext_lower) {
                    Ok(target) => {
                        let status = copy_with_stuck_prompt(
                            file,
                            &target,
                            rel,
                            self.config,
                            self.reporter,
                        );
                        let status = match status {
                            FileStatus::Copied | FileStatus::CopiedSlow => {
                                FileStatus::CopiedAfterStuck
                            }
                            other => other,
                        };
                        let corrected = (status == FileStatus::CopiedAfterStuck)
                            .then(|| target.clone());
                        self.mapping.push(MappingRow::new(
                            EntryKind::File,
                            file.to_path_buf(),
                            corrected,
                            status,
                        ));
                        status
                    }
                    Err(err) => {
                        warn!(
                            "Cannot prepare destination for {}: {}",
                            file.display(),
                            err
                        );
                        self.mapping.push(MappingRow::new(
                            EntryKind::File,
                            file.to_path_buf(),
                            None,
                            FileStatus::Error,
                        ));
                        FileStatus::Error
                    }
                }
            }
            ConversionStuckDecision::Skip => {
                self.mapping.push(MappingRow::new(
                    EntryKind::File,
                    file.to_path_buf(),
                    None,
                    FileStatus::SkippedStuck,
                ));
                FileStatus::SkippedStuck
            }
        }
    }

    /// Route an unconvertible file under the overflow root, mirroring the
    /// sanitized relative structure, with no marker suffix.
    fn extract_to_overflow(
        &mut self,
        source_root: &Path,
        file: &Path,
        rel: &str,
        stem_clean: &str,
        ext_lower: &str,
    ) -> FileStatus {
        let mut subdir = self.overflow_root.clone();
        if let Ok(rel_path) = file.strip_prefix(source_root) {
            if let Some(parent) = rel_path.parent() {
                for component in parent.components() {
                    subdir.push(sanitize_component(&component.as_os_str().to_string_lossy()));
                }
            }
        }

        let prep = std::fs::create_dir_all(platform::extended_length(&subdir)).and_then(|_| {
            let subdir = self
                .fitter
                .bubble_entry_for_depth(subdir.clone(), &self.overflow_root);
            let name = self
                .fitter
                .limit_filename(&format!("{stem_clean}{ext_lower}"), self.config.max_file_name);
            let name = self.fitter.ensure_unique(&subdir, &name, false);
            let (final_dir, final_name) =
                self.fitter.fit(&subdir, &self.overflow_root, &name, false);
            std::fs::create_dir_all(platform::extended_length(&final_dir))?;
            Ok(final_dir.join(final_name))
        });

        let target = match prep {
            Ok(target) => target,
            Err(err) => {
                warn!("Cannot prepare overflow path for {}: {}", file.display(), err);
                self.mapping.push(MappingRow::new(
                    EntryKind::File,
                    file.to_path_buf(),
                    None,
                    FileStatus::Error,
                ));
                return FileStatus::Error;
            }
        };

        let status = copy_with_stuck_prompt(file, &target, rel, self.config, self.reporter);
        let status = match status {
            FileStatus::Copied | FileStatus::CopiedSlow => FileStatus::ExtractedNonPdf,
            other => other,
        };
        let corrected = (status == FileStatus::ExtractedNonPdf).then(|| target.clone());
        self.mapping.push(MappingRow::new(
            EntryKind::File,
            file.to_path_buf(),
            corrected,
            status,
        ));
        status
    }
}
