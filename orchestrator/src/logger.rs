//! Leveled console logger for pipeline progress and child process output
//!
//! Child processes emit plenty of blank or single-character lines (progress
//! dots, stray newlines). Those are dropped before they reach the sink.

use std::sync::{Arc, Mutex};

use shared::{process_error, process_info, ProcessId};

/// Minimum visible length for info and success lines
pub const MIN_INFO_LEN: usize = 2;

/// Minimum visible length for error lines
pub const MIN_ERROR_LEN: usize = 1;

/// Channel a line is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Error,
    /// Verbatim passthrough to stdout, no filtering
    Raw,
}

/// Destination for pipeline log lines
pub trait LogSink: Send + Sync {
    fn write(&self, level: LogLevel, line: &str);
}

/// Trim surrounding whitespace (newlines included); `None` when what remains is shorter than `min_len`
pub fn normalize_message(message: &str, min_len: usize) -> Option<&str> {
    let trimmed = message.trim();
    if trimmed.chars().count() < min_len {
        None
    } else {
        Some(trimmed)
    }
}

/// Cheaply clonable logger handle shared by stages and output forwarders
#[derive(Clone)]
pub struct PipelineLogger {
    sink: Arc<dyn LogSink>,
}

impl PipelineLogger {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// Logger backed by the process tracing subscriber
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingSink))
    }

    pub fn info(&self, message: impl AsRef<str>) {
        if let Some(line) = normalize_message(message.as_ref(), MIN_INFO_LEN) {
            self.sink.write(LogLevel::Info, line);
        }
    }

    pub fn success(&self, message: impl AsRef<str>) {
        if let Some(line) = normalize_message(message.as_ref(), MIN_INFO_LEN) {
            self.sink.write(LogLevel::Success, line);
        }
    }

    pub fn error(&self, message: impl AsRef<str>) {
        if let Some(line) = normalize_message(message.as_ref(), MIN_ERROR_LEN) {
            self.sink.write(LogLevel::Error, line);
        }
    }

    pub fn raw(&self, message: impl AsRef<str>) {
        self.sink.write(LogLevel::Raw, message.as_ref());
    }
}

/// Routes lines through the process-aware tracing macros
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, level: LogLevel, line: &str) {
        match level {
            LogLevel::Info => {
                process_info!(ProcessId::current(), "{}", line);
            }
            LogLevel::Success => {
                process_info!(ProcessId::current(), "✅ {}", line);
            }
            LogLevel::Error => {
                process_error!(ProcessId::current(), "{}", line);
            }
            LogLevel::Raw => println!("{line}"),
        }
    }
}

/// Keeps every line in memory; used to assert on pipeline output
#[derive(Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Lines written at `level`, in order
    pub fn lines(&self, level: LogLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(entry_level, _)| *entry_level == level)
            .map(|(_, line)| line)
            .collect()
    }
}

impl LogSink for RecordingSink {
    fn write(&self, level: LogLevel, line: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((level, line.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_logger() -> (PipelineLogger, Arc<RecordingSink>) {
        let sink = RecordingSink::new();
        (PipelineLogger::new(sink.clone()), sink)
    }

    #[test]
    fn test_normalize_strips_newlines() {
        assert_eq!(normalize_message("\n\r  done \r\n", 2), Some("done"));
        assert_eq!(normalize_message("\n\n", 1), None);
        assert_eq!(normalize_message(".", 2), None);
        assert_eq!(normalize_message(".", 1), Some("."));
    }

    #[test]
    fn test_info_and_success_need_two_chars() {
        let (logger, sink) = recording_logger();

        logger.info("x");
        logger.success("\nk\n");
        logger.info("ok");
        logger.success("built");

        assert_eq!(
            sink.entries(),
            vec![
                (LogLevel::Info, "ok".to_string()),
                (LogLevel::Success, "built".to_string()),
            ]
        );
    }

    #[test]
    fn test_error_needs_one_char() {
        let (logger, sink) = recording_logger();

        logger.error("\r\n");
        logger.error("!");

        assert_eq!(sink.lines(LogLevel::Error), vec!["!".to_string()]);
    }

    #[test]
    fn test_raw_is_verbatim() {
        let (logger, sink) = recording_logger();

        logger.raw("  ✓ passes  ");
        logger.raw("");

        assert_eq!(sink.lines(LogLevel::Raw), vec!["  ✓ passes  ".to_string(), String::new()]);
    }

    #[test]
    fn test_multibyte_counts_characters() {
        assert_eq!(normalize_message("✓", 2), None);
        assert_eq!(normalize_message("✓✓", 2), Some("✓✓"));
    }
}
