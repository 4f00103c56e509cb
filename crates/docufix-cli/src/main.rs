mod commands;
mod logging;
mod progress;

use std::path::{Path, PathBuf};
use std::process;

use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use docufix_core::report::write_mapping_csv;
use docufix_core::validate::{validate_tree, write_validation_csv};
use docufix_core::FixEngine;
use dotenv::dotenv;
use progress::CliReporter;
use tracing::{error, info, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match docufix_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    match args.command {
        Some(Commands::Fix {
            source,
            output,
            report,
            non_interactive,
        }) => {
            if let Err(err) = run_fix(&config, &source, output, report, non_interactive) {
                error!("Error: {}", err);
                process::exit(1);
            }
        }
        Some(Commands::Validate { source, csv }) => {
            if let Err(err) = run_validate(&config, &source, csv) {
                error!("Error: {}", err);
                process::exit(1);
            }
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn run_fix(
    config: &docufix_core::AppConfig,
    source: &Path,
    output: Option<PathBuf>,
    report: Option<PathBuf>,
    non_interactive: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let out_parent = match output {
        Some(dir) => dir,
        None => source
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let engine = FixEngine::new(config.clone());
    let reporter = CliReporter::new(non_interactive);
    let result = engine.run(source, &out_parent, &reporter)?;

    println!();
    info!(
        "Count: {}, Pass: {}, Cleanup: {}",
        format!("{:.2}s", result.count_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.pass_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.cleanup_duration.as_secs_f64()).green(),
    );
    info!(
        "{} converted, {} copied, {} copied slow, {} copied after stuck",
        format!("{}", result.breakdown.converted).green(),
        format!("{}", result.breakdown.copied).green(),
        format!("{}", result.breakdown.copied_slow).yellow(),
        format!("{}", result.breakdown.copied_after_stuck).yellow(),
    );
    info!(
        "{} extracted to overflow, {} skipped hidden, {} skipped stuck, {} errors",
        format!("{}", result.breakdown.extracted_non_pdf).yellow(),
        format!("{}", result.breakdown.skipped_hidden).cyan(),
        format!("{}", result.breakdown.skipped_stuck).red(),
        format!("{}", result.breakdown.errors).red(),
    );
    info!("Corrected tree: {}", result.corrected_root.display());
    info!("Overflow tree:  {}", result.overflow_root.display());

    if result.integrity.is_balanced() {
        info!(
            "Integrity: {} ({} source files accounted for)",
            "OK".green(),
            result.integrity.source_files
        );
    } else {
        warn!(
            "Integrity: {}: {} source files vs {} corrected + {} overflow",
            "MISMATCH".red(),
            result.integrity.source_files,
            result.integrity.corrected_files,
            result.integrity.overflow_files,
        );
    }

    let report_path = report.unwrap_or_else(|| {
        out_parent.join(format!(
            "docufix-mapping-{}.csv",
            chrono::Local::now().format("%Y%m%d-%H%M%S")
        ))
    });
    write_mapping_csv(&result.mapping, &report_path)?;
    info!("Mapping report: {}", report_path.display());

    Ok(())
}

fn run_validate(
    config: &docufix_core::AppConfig,
    source: &Path,
    csv: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = validate_tree(source, config);

    println!();
    info!(
        "Scanned {} entries: {} clean, {} with issues",
        report.total(),
        format!("{}", report.total() - report.problematic()).green(),
        format!("{}", report.problematic()).red(),
    );
    info!(
        "{} forbidden chars, {} diacritics, {} paths too long, {} names too long, {} too deep, {} hidden/temp",
        report.counts.forbidden_chars,
        report.counts.diacritics,
        report.counts.too_long_path,
        report.counts.too_long_name,
        report.counts.too_deep,
        report.counts.hidden_temp,
    );

    if let Some(path) = csv {
        write_validation_csv(&report, &path)?;
        info!("Validation report: {}", path.display());
    }

    Ok(())
}
