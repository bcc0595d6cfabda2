//! Custom error types for the gauge application.
//!
//! Wraps underlying failures with clear, actionable messages. Engine-side
//! failures arrive pre-classified through the event channel, so the only
//! categories here are the ones this process can cause itself.

use std::error::Error;
use std::fmt;

/// Exit codes for the application.
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// The measurement engine reported a failure.
    pub const ENGINE_ERROR: i32 = 1;
    /// Invalid configuration or arguments.
    pub const CONFIG_ERROR: i32 = 2;
    /// Terminal setup or rendering failure.
    pub const TERMINAL_ERROR: i32 = 3;
    /// A replay trace could not be loaded.
    pub const REPLAY_ERROR: i32 = 4;
    /// Unknown/unexpected error.
    pub const UNKNOWN_ERROR: i32 = 99;
}

/// Categories of errors that can occur while driving a test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The measurement engine failed mid-run.
    Engine,
    /// Terminal initialization, rendering, or restore failed.
    Terminal,
    /// Invalid configuration or arguments.
    Config,
    /// A recorded event trace was missing or malformed.
    Replay,
    /// Unknown or unexpected errors.
    Unknown,
}

impl ErrorKind {
    /// Get the exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::Engine => exit_codes::ENGINE_ERROR,
            ErrorKind::Terminal => exit_codes::TERMINAL_ERROR,
            ErrorKind::Config => exit_codes::CONFIG_ERROR,
            ErrorKind::Replay => exit_codes::REPLAY_ERROR,
            ErrorKind::Unknown => exit_codes::UNKNOWN_ERROR,
        }
    }

    /// Get a user-friendly description of this error kind.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::Engine => "Engine error",
            ErrorKind::Terminal => "Terminal error",
            ErrorKind::Config => "Configuration error",
            ErrorKind::Replay => "Replay trace error",
            ErrorKind::Unknown => "Unknown error",
        }
    }
}

/// A user-friendly error type for gauge operations.
#[derive(Debug)]
pub struct GaugeError {
    /// The kind of error.
    pub kind: ErrorKind,
    /// User-friendly error message.
    pub message: String,
    /// Optional suggestion for how to resolve the error.
    pub suggestion: Option<String>,
    /// The underlying error, if any.
    pub source: Option<Box<dyn Error + Send + Sync>>,
}

impl GaugeError {
    /// Create a new GaugeError.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), suggestion: None, source: None }
    }

    /// Add a suggestion for how to resolve the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add the underlying error source.
    pub fn with_source(
        mut self,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }

    /// Create an engine error.
    pub fn engine(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Engine, message)
            .with_suggestion("Check your internet connection and retest.")
    }

    /// Create a terminal error.
    pub fn terminal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Terminal, message).with_suggestion(
            "Run inside an interactive terminal, or pass --json for plain output.",
        )
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Create a replay trace error.
    pub fn replay(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Replay, message)
    }
}

impl fmt::Display for GaugeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.description(), self.message)?;

        if let Some(ref suggestion) = self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }

        Ok(())
    }
}

impl Error for GaugeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_exit_codes() {
        assert_eq!(ErrorKind::Engine.exit_code(), exit_codes::ENGINE_ERROR);
        assert_eq!(ErrorKind::Terminal.exit_code(), exit_codes::TERMINAL_ERROR);
        assert_eq!(ErrorKind::Config.exit_code(), exit_codes::CONFIG_ERROR);
        assert_eq!(ErrorKind::Replay.exit_code(), exit_codes::REPLAY_ERROR);
        assert_eq!(ErrorKind::Unknown.exit_code(), exit_codes::UNKNOWN_ERROR);
    }

    #[test]
    fn test_gauge_error_display() {
        let error = GaugeError::engine("measurement aborted")
            .with_suggestion("Check your internet connection and retest.");

        let display = format!("{}", error);
        assert!(display.contains("Engine error"));
        assert!(display.contains("measurement aborted"));
        assert!(display.contains("Suggestion"));
    }

    #[test]
    fn test_with_source_preserves_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no trace");
        let error = GaugeError::replay("trace missing").with_source(io);

        assert_eq!(error.kind, ErrorKind::Replay);
        assert!(error.source().is_some());
    }

    #[test]
    fn test_config_error_has_no_default_suggestion() {
        let error = GaugeError::config("bad flag");
        assert!(error.suggestion.is_none());
    }
}
