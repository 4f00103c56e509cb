use crate::error::Error;
use config::{Config, ConfigError, File as ConfigFile};
use serde::Deserialize;
use std::time::Duration;

/// Constraint and timeout knobs for a whole run. Loaded once, validated once,
/// then passed by reference through every component.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Maximum length of any destination path relative to its tree root.
    pub max_path: usize,
    /// Maximum length of a single destination name.
    pub max_file_name: usize,
    /// Maximum nesting depth relative to a tree root.
    pub max_depth: usize,
    /// Sanitized-prefix length used to consolidate sibling directories.
    pub merge_prefix_len: usize,
    /// Single character appended to every corrected-tree name.
    pub marker_suffix: String,
    /// Appended (before the marker) to the corrected root directory name.
    pub corrected_suffix: String,
    /// Name of the overflow root receiving unconvertible files.
    pub overflow_dir_name: String,
    /// Chunk size for cooperative copies, in bytes.
    pub chunk_size: usize,
    pub copy_timeout_secs: u64,
    pub office_timeout_secs: u64,
    pub browser_timeout_secs: u64,
    pub wkhtmltopdf_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_path: 240,
            max_file_name: 40,
            max_depth: 5,
            merge_prefix_len: 10,
            marker_suffix: "C".to_string(),
            corrected_suffix: "corrected".to_string(),
            overflow_dir_name: "NON-PDF FORMAT".to_string(),
            chunk_size: 1024 * 1024,
            copy_timeout_secs: 120,
            office_timeout_secs: 180,
            browser_timeout_secs: 120,
            wkhtmltopdf_timeout_secs: 90,
        }
    }
}

impl AppConfig {
    /// Shortest name the fitter can ever emit: one stem character plus the
    /// marker plus ".pdf".
    pub fn min_viable_name(&self) -> usize {
        1 + self.marker_suffix.len() + ".pdf".len()
    }

    /// Reject settings under which the fitter's guarantee cannot hold.
    /// These abort the whole run before any filesystem mutation.
    pub fn validate(&self) -> Result<(), Error> {
        if self.marker_suffix.chars().count() != 1 {
            return Err(Error::InvalidConfig(format!(
                "marker_suffix must be a single character, got {:?}",
                self.marker_suffix
            )));
        }
        if self.max_path < self.min_viable_name() {
            return Err(Error::InvalidConfig(format!(
                "max_path {} cannot hold the minimum viable name ({} chars)",
                self.max_path,
                self.min_viable_name()
            )));
        }
        if self.max_file_name < self.min_viable_name() {
            return Err(Error::InvalidConfig(format!(
                "max_file_name {} cannot hold the minimum viable name ({} chars)",
                self.max_file_name,
                self.min_viable_name()
            )));
        }
        if self.max_depth == 0 {
            return Err(Error::InvalidConfig("max_depth must be at least 1".into()));
        }
        if self.merge_prefix_len == 0 {
            return Err(Error::InvalidConfig(
                "merge_prefix_len must be at least 1".into(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be non-zero".into()));
        }
        Ok(())
    }

    pub fn copy_timeout(&self) -> Duration {
        Duration::from_secs(self.copy_timeout_secs)
    }

    pub fn office_timeout(&self) -> Duration {
        Duration::from_secs(self.office_timeout_secs)
    }

    pub fn browser_timeout(&self) -> Duration {
        Duration::from_secs(self.browser_timeout_secs)
    }

    pub fn wkhtmltopdf_timeout(&self) -> Duration {
        Duration::from_secs(self.wkhtmltopdf_timeout_secs)
    }
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Docufix").required(false))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
