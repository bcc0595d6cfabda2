//! Boundary to the external measurement engine.
//!
//! The engine performs the actual latency/bandwidth/packet-loss measurement
//! and is treated as opaque: this module defines the configuration handed to
//! it, the events it delivers back, and the final summary record it produces.
//! The engine's callback hooks are collapsed into a single ordered channel of
//! [`MeasurementEvent`] values feeding the progress interpreter.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::errors::GaugeError;

/// Construction options for the measurement engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Start measuring as soon as the engine is constructed.
    pub auto_start: bool,
    /// Measure latency under download load.
    pub measure_download_loaded_latency: bool,
    /// Measure latency under upload load.
    pub measure_upload_loaded_latency: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_start: true,
            measure_download_loaded_latency: true,
            measure_upload_loaded_latency: true,
        }
    }
}

/// Application quality scores reported by the engine. Opaque: displayed
/// verbatim, never recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityScores {
    pub streaming: f64,
    pub gaming: f64,
    pub rtc: f64,
}

/// Final aggregated result record, produced once by the engine when the test
/// completes. Bandwidth figures are bytes per second as the engine reports
/// them; everything else is milliseconds except `packet_loss`, a fraction in
/// `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSummary {
    pub download_bps: f64,
    pub upload_bps: f64,
    pub unloaded_latency_ms: f64,
    pub unloaded_jitter_ms: f64,
    pub packet_loss: f64,
    pub down_loaded_latency_ms: f64,
    pub up_loaded_latency_ms: f64,
    pub scores: QualityScores,
}

/// Events delivered by the engine, in order, never concurrently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MeasurementEvent {
    /// The engine started or stopped running.
    RunningChanged { running: bool },
    /// Incremental snapshot of the in-flight measurement.
    ResultsUpdated {
        /// Current download bandwidth estimate, bytes per second.
        download_bps: f64,
        /// Download sample points collected so far.
        download_samples: usize,
        /// Upload sample points collected so far.
        upload_samples: usize,
    },
    /// The test finished with a complete summary.
    Finished(Box<TestSummary>),
    /// The engine failed; the run is over.
    Failed { message: String },
}

/// Convert an engine bandwidth figure to the displayed Mbps value.
pub fn bandwidth_mbps(bps: f64) -> f64 {
    bps / 1e6
}

/// Sink for engine events. One sender per run; replacing the channel
/// invalidates any straggling events from the previous run.
pub type EventSink = mpsc::UnboundedSender<MeasurementEvent>;

/// A measurement engine the gauge can drive.
///
/// `start` begins a fresh run delivering events into `sink`. Starting again
/// while a run is in flight must cancel the previous run first.
pub trait MeasurementEngine {
    fn start(&mut self, config: &EngineConfig, sink: EventSink) -> Result<(), GaugeError>;
}

/// One entry of a recorded event trace: wait `delay_ms`, then deliver `event`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracedEvent {
    #[serde(default)]
    pub delay_ms: u64,
    pub event: MeasurementEvent,
}

/// Replays a recorded engine event trace.
///
/// This is not a measurement implementation: it feeds previously captured
/// events through the channel with their original pacing, for demos and
/// tests against a deterministic engine.
pub struct ReplayEngine {
    trace: Vec<TracedEvent>,
    feeder: Option<JoinHandle<()>>,
}

impl ReplayEngine {
    pub fn new(trace: Vec<TracedEvent>) -> Self {
        Self { trace, feeder: None }
    }

    /// Load a trace from a JSON file (an array of `{delay_ms, event}` objects).
    pub fn from_path(path: &Path) -> Result<Self, GaugeError> {
        let file = File::open(path).map_err(|e| {
            GaugeError::replay(format!("cannot open trace {}: {}", path.display(), e))
        })?;
        let trace: Vec<TracedEvent> =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                GaugeError::replay(format!("malformed trace {}: {}", path.display(), e))
                    .with_source(e)
            })?;
        Ok(Self::new(trace))
    }

    /// The trace bundled with the binary, a capture of an ordinary run.
    pub fn default_trace() -> Vec<TracedEvent> {
        fn results(delay_ms: u64, bps: f64, dl: usize, ul: usize) -> TracedEvent {
            TracedEvent {
                delay_ms,
                event: MeasurementEvent::ResultsUpdated {
                    download_bps: bps,
                    download_samples: dl,
                    upload_samples: ul,
                },
            }
        }

        let mut trace = vec![TracedEvent {
            delay_ms: 150,
            event: MeasurementEvent::RunningChanged { running: true },
        }];
        trace.push(results(400, 0.0, 0, 0));
        trace.push(results(600, 38_000_000.0, 4, 0));
        trace.push(results(500, 62_000_000.0, 11, 0));
        trace.push(results(500, 71_500_000.0, 19, 0));
        trace.push(results(700, 74_000_000.0, 24, 3));
        trace.push(results(600, 76_250_000.0, 24, 9));
        trace.push(TracedEvent {
            delay_ms: 500,
            event: MeasurementEvent::RunningChanged { running: false },
        });
        trace.push(TracedEvent {
            delay_ms: 50,
            event: MeasurementEvent::Finished(Box::new(TestSummary {
                download_bps: 76_250_000.0,
                upload_bps: 21_400_000.0,
                unloaded_latency_ms: 14.0,
                unloaded_jitter_ms: 2.1,
                packet_loss: 0.001,
                down_loaded_latency_ms: 38.0,
                up_loaded_latency_ms: 44.0,
                scores: QualityScores { streaming: 92.0, gaming: 88.0, rtc: 90.0 },
            })),
        });
        trace
    }
}

impl MeasurementEngine for ReplayEngine {
    fn start(&mut self, config: &EngineConfig, sink: EventSink) -> Result<(), GaugeError> {
        // Cancel-before-replace: a retest aborts the previous feeder so two
        // runs never interleave on the sink.
        if let Some(feeder) = self.feeder.take() {
            debug!("aborting previous replay feeder");
            feeder.abort();
        }

        if !config.auto_start {
            return Err(GaugeError::config(
                "replay engine only supports auto-start runs",
            ));
        }

        info!("starting replay run ({} events)", self.trace.len());
        let trace = self.trace.clone();
        self.feeder = Some(tokio::spawn(async move {
            for entry in trace {
                tokio::time::sleep(Duration::from_millis(entry.delay_ms)).await;
                if sink.send(entry.event).is_err() {
                    // Receiver replaced or dropped; this run is stale.
                    return;
                }
            }
        }));

        Ok(())
    }
}
