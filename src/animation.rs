//! Needle animation: exponential easing plus the frame task that drives it.
//!
//! The displayed value chases its target by a fixed fraction per frame with
//! no delta-time correction; the easing rate is deliberately tied to the
//! frame cadence, and the renderer downstream assumes that coupling.

use std::time::Duration;

use log::debug;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::gauge::GaugeConfig;

/// Nominal frame period, roughly 60 frames per second.
pub const FRAME_PERIOD: Duration = Duration::from_millis(16);

/// What the interpreter wants done with the animation after an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationCommand {
    /// Nothing to animate for this event.
    None,
    /// Ease the displayed value toward a new target (Mbps).
    Seek(f64),
    /// Stop animating; the run is over.
    Cancel,
}

/// Eases a displayed scalar toward a target scalar, one step per frame.
#[derive(Debug, Clone)]
pub struct Animator {
    displayed: f64,
    target: f64,
    active: bool,
    smoothing: f64,
    epsilon: f64,
}

impl Animator {
    pub fn new(config: &GaugeConfig) -> Self {
        Self {
            displayed: 0.0,
            target: 0.0,
            active: false,
            smoothing: config.smoothing,
            epsilon: config.epsilon_mbps,
        }
    }

    /// Aim at a new target and re-arm convergence tracking, even when the
    /// target is unchanged.
    pub fn start(&mut self, target: f64) {
        self.target = target;
        self.active = true;
    }

    /// Stop without touching the displayed value.
    pub fn cancel(&mut self) {
        self.active = false;
    }

    /// Reset to the rest position for a fresh run.
    pub fn reset(&mut self) {
        self.displayed = 0.0;
        self.target = 0.0;
        self.active = false;
    }

    /// Advance one frame. Deactivates once the displayed value is within
    /// epsilon of the target; the value is left eased, not snapped.
    pub fn tick(&mut self) -> f64 {
        if !self.active {
            return self.displayed;
        }

        self.displayed += (self.target - self.displayed) * self.smoothing;

        if (self.target - self.displayed).abs() <= self.epsilon {
            self.active = false;
        }

        self.displayed
    }

    /// Whether another frame is still needed.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn displayed(&self) -> f64 {
        self.displayed
    }

    pub fn target(&self) -> f64 {
        self.target
    }
}

/// A frame tick tagged with the run it was scheduled for. The controller
/// drops ticks whose run number is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTick {
    pub run: u64,
}

/// The repeating frame task bound to the current run.
///
/// At most one task is ever scheduled: arming always cancels the previous
/// task before spawning the next, so a retest can never leave two loops
/// driving the same displayed value.
pub struct FrameLoop {
    handle: Option<JoinHandle<()>>,
    period: Duration,
}

impl FrameLoop {
    pub fn new(period: Duration) -> Self {
        Self { handle: None, period }
    }

    /// Start emitting ticks for `run` into `sink`, cancelling any previous
    /// task first.
    pub fn arm(&mut self, run: u64, sink: mpsc::UnboundedSender<FrameTick>) {
        self.cancel();
        debug!("arming frame loop for run {}", run);

        let period = self.period;
        self.handle = Some(tokio::spawn(async move {
            let mut frames = time::interval(period);
            frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                frames.tick().await;
                if sink.send(FrameTick { run }).is_err() {
                    // Receiver replaced or dropped; this run is over.
                    return;
                }
            }
        }));
    }

    /// Cancel the pending frame task, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Number of frame tasks currently scheduled. Never exceeds one.
    pub fn scheduled(&self) -> usize {
        usize::from(self.handle.as_ref().is_some_and(|h| !h.is_finished()))
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.cancel();
    }
}
