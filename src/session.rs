//! Test session state and the progress interpreter.
//!
//! One [`TestSession`] exists per run. [`TestSession::apply_event`] is the
//! single transition function: it consumes engine events in delivery order
//! and derives the phase, the progress estimate, and the animation command
//! for the needle. Rendering and scheduling stay outside.

use log::{info, warn};

use crate::animation::AnimationCommand;
use crate::engine::{bandwidth_mbps, MeasurementEvent, TestSummary};

/// Fallback shown when the engine fails without a usable message.
pub const GENERIC_FAILURE: &str = "Speed test failed";

/// Coarse stage of the test, inferred from sample counts rather than
/// signaled authoritatively by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPhase {
    /// No run yet, or the previous run was dismissed.
    Idle,
    /// Run started; no download samples seen.
    Latency,
    /// Download samples are arriving.
    Download,
    /// Upload samples are arriving.
    Upload,
    /// Finished with a summary.
    Done,
    /// The engine reported a failure.
    Errored,
}

impl TestPhase {
    /// In-progress indicator text, when the phase has one.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            TestPhase::Latency => Some("Measuring Latency..."),
            TestPhase::Download => Some("Measuring Download..."),
            TestPhase::Upload => Some("Measuring Upload..."),
            _ => None,
        }
    }
}

/// Engine run status surfaced in the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Idle,
    Initializing,
    Running,
    Complete,
    Failed,
}

/// Ephemeral state for one test run.
#[derive(Debug, Clone)]
pub struct TestSession {
    pub phase: TestPhase,
    pub status: RunStatus,
    /// Rough completion estimate in `[0, 100]`.
    pub progress_percent: f64,
    /// Where the needle is heading, in Mbps.
    pub target_speed_mbps: f64,
    /// Final summary, present once the run is done.
    pub summary: Option<TestSummary>,
    /// Surfaced failure message, present once the run errored.
    pub error: Option<String>,
}

impl TestSession {
    /// A session that has not started measuring.
    pub fn idle() -> Self {
        Self {
            phase: TestPhase::Idle,
            status: RunStatus::Idle,
            progress_percent: 0.0,
            target_speed_mbps: 0.0,
            summary: None,
            error: None,
        }
    }

    /// A fresh session at the start of a run. The latency phase is entered
    /// immediately; the engine never announces it.
    pub fn start_run() -> Self {
        Self {
            phase: TestPhase::Latency,
            status: RunStatus::Initializing,
            progress_percent: 0.0,
            target_speed_mbps: 0.0,
            summary: None,
            error: None,
        }
    }

    /// Whether a test is currently in flight (start/retest stays disabled).
    pub fn in_flight(&self) -> bool {
        matches!(
            self.phase,
            TestPhase::Latency | TestPhase::Download | TestPhase::Upload
        )
    }

    /// Apply one engine event and report what the animation should do.
    pub fn apply_event(&mut self, event: &MeasurementEvent) -> AnimationCommand {
        match event {
            MeasurementEvent::RunningChanged { running: true } => {
                self.status = RunStatus::Running;
                AnimationCommand::None
            }
            MeasurementEvent::RunningChanged { running: false } => {
                // The Finished event owns the phase transition; this only
                // flips the status line.
                self.status = RunStatus::Complete;
                AnimationCommand::None
            }
            MeasurementEvent::ResultsUpdated {
                download_bps,
                download_samples,
                upload_samples,
            } => {
                let bps = *download_bps;
                let command = if bps > 0.0 {
                    self.target_speed_mbps = bandwidth_mbps(bps);
                    // Rough estimate: download occupies the back half of the
                    // bar and saturates near 10 MB/s. Cosmetic, not an ETA.
                    self.progress_percent = ((bps / 1e7) * 50.0 + 50.0).min(100.0);
                    AnimationCommand::Seek(self.target_speed_mbps)
                } else {
                    // Not yet meaningful; leave progress and needle alone.
                    AnimationCommand::None
                };

                // Edge-triggered phase detection, each transition at most
                // once per run.
                if self.phase == TestPhase::Latency && *download_samples > 0 {
                    info!("download samples arriving; entering download phase");
                    self.phase = TestPhase::Download;
                } else if self.phase == TestPhase::Download && *upload_samples > 0 {
                    info!("upload samples arriving; entering upload phase");
                    self.phase = TestPhase::Upload;
                }

                command
            }
            MeasurementEvent::Finished(summary) => {
                if self.phase == TestPhase::Errored {
                    // A summary after a failure belongs to a dead run.
                    warn!("discarding summary delivered after failure");
                    return AnimationCommand::None;
                }

                info!(
                    "run finished: download {:.1} Mbps, upload {:.1} Mbps",
                    bandwidth_mbps(summary.download_bps),
                    bandwidth_mbps(summary.upload_bps),
                );
                self.phase = TestPhase::Done;
                self.target_speed_mbps = bandwidth_mbps(summary.download_bps);
                self.summary = Some((**summary).clone());
                AnimationCommand::Seek(self.target_speed_mbps)
            }
            MeasurementEvent::Failed { message } => {
                warn!("engine failed: {}", message);
                self.phase = TestPhase::Errored;
                self.status = RunStatus::Failed;
                self.error = Some(if message.trim().is_empty() {
                    GENERIC_FAILURE.to_string()
                } else {
                    message.clone()
                });
                AnimationCommand::Cancel
            }
        }
    }
}
