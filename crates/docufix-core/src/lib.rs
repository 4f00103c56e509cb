pub mod cleanup;
pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod fitter;
pub mod mapper;
pub mod platform;
pub mod progress;
pub mod render;
pub mod report;
pub mod sanitize;
pub mod transfer;
pub mod validate;
pub mod walk;

pub use config::AppConfig;
pub use engine::{FixEngine, FixResult};
pub use error::Error;
pub use progress::{ConversionStuckDecision, ProgressReporter, SilentReporter, StuckDecision};
pub use report::{EntryKind, FileStatus, MappingRow};
