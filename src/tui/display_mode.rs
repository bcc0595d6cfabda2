//! Display mode detection.
//!
//! Decides between the interactive gauge, silent plain-text output, and
//! structured JSON, based on CLI flags and terminal capabilities.

/// The display mode for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Interactive gauge with live updates
    Tui,
    /// Silent mode - no output until final results
    Silent,
    /// JSON mode - structured output only
    Json,
}

impl DisplayMode {
    /// Determine display mode from CLI flags and environment.
    ///
    /// The `--json` flag wins regardless of TTY status; otherwise an
    /// interactive terminal gets the gauge and anything else (pipes,
    /// redirects) gets silent output.
    pub fn detect(json_flag: bool, is_tty: bool) -> Self {
        if json_flag {
            DisplayMode::Json
        } else if is_tty {
            DisplayMode::Tui
        } else {
            DisplayMode::Silent
        }
    }
}
