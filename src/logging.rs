use flexi_logger::{FlexiLoggerError, Logger, LoggerHandle};

/// Starts the logger for a binary: the `RUST_LOG`-style env spec wins,
/// `level` is the fallback.
pub fn init(level: &str) -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_env_or_str(level)?
        .format(flexi_logger::colored_default_format)
        .start()
}
