//! Logging infrastructure.
//!
//! Structured logging with dual output:
//! - Writes to a log file (cleared on session start)
//! - Also prints to stdout for tailing
//! - Configurable via the RUST_LOG environment variable

use std::fs;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard flushes and closes the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the logging system.
///
/// Creates the log directory if needed, clears the previous log file, and
/// sets up dual output to both file and stdout. The returned guard must be
/// kept alive for file logging to work.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or the log file
/// cannot be cleared.
pub fn init_logging(log_dir: &str, log_file: &str) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(log_dir)?;

    // Clear the previous log file; handles both existing and missing files.
    let log_path = Path::new(log_dir).join(log_file);
    fs::write(&log_path, "")?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true);

    // Defaults to INFO when RUST_LOG is not set.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Get the default log directory path.
pub fn default_log_dir() -> &'static str {
    "logs"
}

/// Get the default log file name.
pub fn default_log_file() -> &'static str {
    "geopyramid.log"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_paths() {
        assert_eq!(default_log_dir(), "logs");
        assert_eq!(default_log_file(), "geopyramid.log");
    }

    #[test]
    fn test_creates_directory_and_file() {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let log_dir = tmp.path().join("logs");
        let log_dir_str = log_dir.to_str().unwrap();

        assert!(!log_dir.exists(), "Test directory should not exist yet");

        // Can't call init_logging here because the global subscriber can
        // only be set once per process; exercise the file operations.
        fs::create_dir_all(log_dir_str).expect("Failed to create directory");
        let log_path = log_dir.join("test.log");
        fs::write(&log_path, "").expect("Failed to create log file");

        assert!(log_dir.exists(), "Log directory should be created");
        assert!(log_path.exists(), "Log file should be created");
        assert_eq!(
            fs::read_to_string(&log_path).unwrap(),
            "",
            "Log file should be empty"
        );
    }

    #[test]
    fn test_clears_existing_file() {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let log_file = tmp.path().join("test.log");
        fs::write(&log_file, "old log data").expect("Failed to write test data");

        fs::write(&log_file, "").expect("Failed to clear log file");

        let contents = fs::read_to_string(&log_file).expect("Failed to read log file");
        assert_eq!(contents, "", "File should be cleared");
    }

    #[test]
    fn test_guard_structure() {
        use tracing_appender::non_blocking::NonBlocking;

        let (non_blocking, guard) = NonBlocking::new(std::io::sink());
        drop(non_blocking);

        let _logging_guard = LoggingGuard { _file_guard: guard };
    }

    // Note: testing actual log output requires integration tests because
    // tracing uses a global subscriber that can only be set once per
    // process. The unit tests above verify the file operations.
}
