//! Logger setup.
//!
//! Everything goes to stderr: stdout is reserved for protocol replies.

use flexi_logger::{FlexiLoggerError, Logger, LoggerHandle};

/// Start the global logger with `spec` (e.g. `info`, `bitboard_mcts=trace`).
/// `RUST_LOG` takes precedence when set.
///
/// Keep the returned handle alive for as long as logging is needed.
pub fn setup_logging(spec: &str) -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_env_or_str(spec)?
        .log_to_stderr()
        .format(flexi_logger::default_format)
        .start()
}
