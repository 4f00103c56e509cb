use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "docufix")]
#[command(about = "Reorganize a directory tree under path constraints, converting files to PDF", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the corrected and overflow trees from a source directory
    Fix {
        /// Source directory to reorganize
        source: PathBuf,
        /// Where the corrected and overflow roots are created (defaults to
        /// the source's parent directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Where to write the mapping CSV (defaults to a timestamped file
        /// next to the output trees)
        #[arg(long)]
        report: Option<PathBuf>,
        /// Never prompt; stuck copies and stuck converters are skipped
        #[arg(long)]
        non_interactive: bool,
    },
    /// Scan a directory and report constraint violations without touching it
    Validate {
        /// Directory to scan
        source: PathBuf,
        /// Optional CSV export of the findings
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Print configuration values
    PrintConfig,
}
