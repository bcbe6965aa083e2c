//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - Pretty or JSON stdout output
//! - JSON rolling log files via tracing-appender

pub mod logger;

pub use logger::{parse_log_level, LoggerImpl, LOG_FILE_NAME};
