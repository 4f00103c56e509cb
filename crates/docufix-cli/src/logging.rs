use std::env;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_DIR: &str = "logs";
const LOG_FILE_NAME: &str = "docufix.log";

/// Dual-output tracing: pretty stdout plus a plain-text file under `logs/`.
/// `DOCUFIX_LOG` sets the filter; `DOCUFIX_LOG_DIR` relocates the file. The
/// returned guard must be held for the life of the process or buffered file
/// output is lost.
pub fn init_logger() -> impl Drop {
    let filter = EnvFilter::new(env::var("DOCUFIX_LOG").unwrap_or_else(|_| "info".to_string()));
    let log_dir = env::var("DOCUFIX_LOG_DIR").unwrap_or_else(|_| DEFAULT_LOG_DIR.to_string());

    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .pretty()
                .with_file(false)
                .without_time()
                .with_ansi(true),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(filter)
        .init();

    info!("Logging to stdout and {}/{}", log_dir, LOG_FILE_NAME);

    guard
}
