//! Terminal presentation layer for speed-gauge.
//!
//! Translates session state into concrete terminal output: the animated
//! needle gauge, the progress bar, the results table, and the status
//! chrome around them.

pub mod controller;
pub mod display_mode;
pub mod renderer;

pub use controller::GaugeController;
pub use display_mode::DisplayMode;
