use std::fs;
use std::path::Path;
use tempfile::tempdir;

use docufix_core::cleanup::count_files;
use docufix_core::convert::Converters;
use docufix_core::fitter::ConstraintFitter;
use docufix_core::report::{EntryKind, FileStatus};
use docufix_core::{AppConfig, FixEngine, SilentReporter};

/// Build a source tree exercising every terminal path without external
/// converters. Layout:
///   root/
///     Informe Técnico Final.txt     (diacritics, converts in-process)
///     contrato.pdf                  (direct copy)
///     datos raros.dat               (unconvertible → overflow)
///     Thumbs.db                     (hidden, untouched)
///     ~$draft.docx                  (temp, untouched)
///     Proyecto Alpha 2023/anexo.txt
///     Proyecto Alpha 2024/anexo.txt (merges with 2023 by prefix)
fn create_source_tree(root: &Path) {
    fs::create_dir_all(root).unwrap();
    fs::write(root.join("Informe Técnico Final.txt"), "informe\ncuerpo\n").unwrap();
    fs::write(root.join("contrato.pdf"), b"%PDF-1.4 fake body").unwrap();
    fs::write(root.join("datos raros.dat"), b"\x00\x01binary").unwrap();
    fs::write(root.join("Thumbs.db"), b"junk").unwrap();
    fs::write(root.join("~$draft.docx"), b"lock").unwrap();

    let a = root.join("Proyecto Alpha 2023");
    let b = root.join("Proyecto Alpha 2024");
    fs::create_dir_all(&a).unwrap();
    fs::create_dir_all(&b).unwrap();
    fs::write(a.join("anexo.txt"), "anexo 2023").unwrap();
    fs::write(b.join("anexo.txt"), "anexo 2024").unwrap();
}

fn run_fix(source: &Path, out: &Path, config: AppConfig) -> docufix_core::FixResult {
    FixEngine::new(config)
        .with_converters(Converters::none())
        .run(source, out, &SilentReporter)
        .unwrap()
}

#[test]
fn full_pipeline_statuses_and_conservation() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("Expediente 2024");
    let out = tmp.path().join("out");
    create_source_tree(&source);

    let result = run_fix(&source, &out, AppConfig::default());

    assert_eq!(result.breakdown.converted, 3); // three .txt files
    assert_eq!(result.breakdown.copied, 1); // the pdf
    assert_eq!(result.breakdown.extracted_non_pdf, 1); // the .dat
    assert_eq!(result.breakdown.skipped_hidden, 2); // Thumbs.db + ~$draft
    assert_eq!(result.breakdown.errors, 0);
    assert_eq!(result.breakdown.skipped_stuck, 0);

    // Conservation: hidden files are outside the counted population.
    assert!(result.integrity.is_balanced());
    assert_eq!(
        count_files(&source),
        count_files(&result.corrected_root) + count_files(&result.overflow_root)
    );
}

#[test]
fn corrected_names_are_sanitized_and_marked() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("Expediente 2024");
    let out = tmp.path().join("out");
    create_source_tree(&source);

    let config = AppConfig::default();
    let result = run_fix(&source, &out, config.clone());

    // Diacritics stripped, marker before extension, limits hold.
    let informe = result
        .mapping
        .iter()
        .find(|r| r.original.ends_with("Informe Técnico Final.txt"))
        .unwrap();
    assert_eq!(informe.status, FileStatus::Converted);
    let corrected = informe.corrected.as_ref().unwrap();
    assert_eq!(
        corrected.file_name().unwrap().to_string_lossy(),
        "informetecnicofinalC.pdf"
    );
    assert!(corrected.exists());

    let contrato = result
        .mapping
        .iter()
        .find(|r| r.original.ends_with("contrato.pdf"))
        .unwrap();
    assert_eq!(contrato.status, FileStatus::Copied);
    assert_eq!(
        contrato
            .corrected
            .as_ref()
            .unwrap()
            .file_name()
            .unwrap()
            .to_string_lossy(),
        "contratoC.pdf"
    );

    // Corrected root carries sanitized source name + suffix + marker.
    let root_name = result.corrected_root.file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(root_name, "expediente2024correctedC");
}

#[test]
fn sibling_directories_merge_by_sanitized_prefix() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("src");
    let out = tmp.path().join("out");
    create_source_tree(&source);

    let result = run_fix(&source, &out, AppConfig::default());

    // Both "Proyecto Alpha ..." directories land in one
    // destination directory named from the 10-char sanitized prefix.
    let dir_rows: Vec<_> = result
        .mapping
        .iter()
        .filter(|r| {
            r.kind == EntryKind::Dir
                && r.original
                    .file_name()
                    .map(|n| n.to_string_lossy().starts_with("Proyecto Alpha"))
                    .unwrap_or(false)
        })
        .collect();
    assert_eq!(dir_rows.len(), 2);
    assert_eq!(dir_rows[0].corrected, dir_rows[1].corrected);

    let merged = dir_rows[0].corrected.as_ref().unwrap();
    assert_eq!(merged.file_name().unwrap().to_string_lossy(), "proyectoalC");

    // Both anexo files survived in the shared directory, disambiguated.
    let names: Vec<String> = fs::read_dir(merged)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"anexoC.pdf".to_string()));
    assert!(names.contains(&"anexo2C.pdf".to_string()));
}

#[test]
fn overflow_mirrors_structure_without_marker() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("src");
    let out = tmp.path().join("out");
    fs::create_dir_all(source.join("Carpeta Número Uno")).unwrap();
    fs::write(
        source.join("Carpeta Número Uno").join("Datos Viejos.dat"),
        b"\x00",
    )
    .unwrap();

    let config = AppConfig::default();
    let result = run_fix(&source, &out, config.clone());

    // Unconvertible file lands under the overflow root, sanitized
    // relative structure, no marker suffix.
    assert_eq!(
        result.overflow_root.file_name().unwrap().to_string_lossy(),
        config.overflow_dir_name
    );
    let extracted = result
        .mapping
        .iter()
        .find(|r| r.status == FileStatus::ExtractedNonPdf)
        .unwrap();
    let dest = extracted.corrected.as_ref().unwrap();
    assert!(dest.starts_with(&result.overflow_root));
    assert_eq!(dest.file_name().unwrap().to_string_lossy(), "datosviejos.dat");
    assert_eq!(
        dest.parent().unwrap().file_name().unwrap().to_string_lossy(),
        "carpetanumerouno"
    );
    assert!(dest.exists());
}

#[test]
fn hidden_files_never_reach_either_tree() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("src");
    let out = tmp.path().join("out");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("Thumbs.db"), b"junk").unwrap();
    fs::write(source.join("real.txt"), "content").unwrap();

    let result = run_fix(&source, &out, AppConfig::default());

    // Recorded as skipped, present in neither output count.
    let hidden = result
        .mapping
        .iter()
        .find(|r| r.original.ends_with("Thumbs.db"))
        .unwrap();
    assert_eq!(hidden.status, FileStatus::SkippedHidden);
    assert!(hidden.corrected.is_none());
    assert_eq!(count_files(&result.corrected_root), 1);
    assert_eq!(count_files(&result.overflow_root), 0);
}

#[test]
fn deep_trees_respect_all_three_limits() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("src");
    let out = tmp.path().join("out");

    // Ten nested levels with verbose names, a file at every level.
    let mut dir = source.clone();
    for level in 0..10 {
        dir = dir.join(format!("Subdirectorio Número {level} Con Nombre Largo"));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(format!("Documento De Prueba Nivel {level}.txt")),
            format!("nivel {level}"),
        )
        .unwrap();
    }

    let config = AppConfig {
        max_path: 80,
        max_depth: 3,
        ..AppConfig::default()
    };
    let result = run_fix(&source, &out, config.clone());
    assert!(result.integrity.is_balanced());

    // Every emitted destination satisfies the invariants relative to its root.
    let fitter = ConstraintFitter::new(&config);
    for row in result.mapping.iter().filter(|r| r.corrected.is_some()) {
        let dest = row.corrected.as_ref().unwrap();
        let floor = if dest.starts_with(&result.overflow_root) {
            &result.overflow_root
        } else {
            &result.corrected_root
        };
        if dest == floor {
            continue;
        }
        let rel_len = fitter.rel_len(dest, floor);
        let depth = fitter.rel_depth(dest, floor);
        let name_len = dest.file_name().unwrap().to_string_lossy().chars().count();
        assert!(rel_len <= config.max_path, "path too long: {}", dest.display());
        assert!(depth <= config.max_depth, "too deep: {}", dest.display());
        assert!(name_len <= config.max_file_name, "name too long: {}", dest.display());
    }
}

#[test]
fn pathological_name_is_truncated_not_lost() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("src");
    let out = tmp.path().join("out");
    fs::create_dir_all(&source).unwrap();
    // The name alone dwarfs max_path.
    // 35 repeats (249 chars with extension) stays under the OS's 255-byte
    // filename limit so the fixture itself is creatable.
    fs::write(source.join(format!("{}.txt", "palabra".repeat(35))), "x").unwrap();

    let config = AppConfig {
        max_path: 30,
        max_file_name: 30,
        ..AppConfig::default()
    };
    let result = run_fix(&source, &out, config.clone());

    let row = result
        .mapping
        .iter()
        .find(|r| r.status == FileStatus::Converted)
        .unwrap();
    let dest = row.corrected.as_ref().unwrap();
    let name = dest.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.chars().count() <= config.max_path);
    assert!(name.ends_with("C.pdf"), "marker survives truncation: {name}");
    assert!(result.integrity.is_balanced());
}

#[test]
fn empty_directories_are_pruned_roots_kept() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("src");
    let out = tmp.path().join("out");
    fs::create_dir_all(source.join("vacía uno/vacía dos")).unwrap();
    fs::write(source.join("algo.txt"), "x").unwrap();

    let result = run_fix(&source, &out, AppConfig::default());
    assert!(result.pruned_dirs >= 2);
    assert!(result.corrected_root.exists());
    assert!(result.overflow_root.exists());

    // Only the converted file remains under the corrected root.
    let leftover_dirs: Vec<_> = fs::read_dir(&result.corrected_root)
        .unwrap()
        .map(|e| e.unwrap())
        .filter(|e| e.path().is_dir())
        .collect();
    assert!(leftover_dirs.is_empty());
}

#[test]
fn invalid_configuration_aborts_before_mutation() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("src");
    let out = tmp.path().join("out");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("algo.txt"), "x").unwrap();

    let config = AppConfig {
        max_path: 3,
        ..AppConfig::default()
    };
    let err = FixEngine::new(config)
        .with_converters(Converters::none())
        .run(&source, &out, &SilentReporter)
        .unwrap_err();
    assert!(matches!(err, docufix_core::Error::InvalidConfig(_)));
    assert!(!out.exists());
}
