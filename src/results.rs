//! Final results presentation.
//!
//! [`ResultsReport`] is the displayable form of the engine summary: every
//! figure is carried over verbatim and only formatted, never recomputed.
//! It serializes for `--json` output and renders labelled rows for the
//! results table and the plain-text summary.

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use crate::engine::{bandwidth_mbps, QualityScores, TestSummary};

/// A complete, display-ready result record for one finished run.
#[derive(Debug, Clone, Serialize)]
pub struct ResultsReport {
    /// Timestamp when the run completed.
    pub timestamp: DateTime<Utc>,
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub latency_ms: f64,
    pub jitter_ms: f64,
    /// Packet loss as a percentage (0.0 to 100.0).
    pub packet_loss_percent: f64,
    pub down_loaded_latency_ms: f64,
    pub up_loaded_latency_ms: f64,
    pub scores: QualityScores,
}

impl ResultsReport {
    /// Build a report from the engine summary.
    pub fn from_summary(summary: &TestSummary) -> Self {
        Self {
            timestamp: Utc::now(),
            download_mbps: bandwidth_mbps(summary.download_bps),
            upload_mbps: bandwidth_mbps(summary.upload_bps),
            latency_ms: summary.unloaded_latency_ms,
            jitter_ms: summary.unloaded_jitter_ms,
            packet_loss_percent: summary.packet_loss * 100.0,
            down_loaded_latency_ms: summary.down_loaded_latency_ms,
            up_loaded_latency_ms: summary.up_loaded_latency_ms,
            scores: summary.scores,
        }
    }

    /// Labelled rows for the results table, in display order.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Download", format_mbps(self.download_mbps)),
            ("Upload", format_mbps(self.upload_mbps)),
            ("Latency", format_millis(self.latency_ms)),
            ("Jitter", format_millis(self.jitter_ms)),
            ("Packet Loss", format_percent(self.packet_loss_percent)),
            ("Loaded Latency (Down)", format_millis(self.down_loaded_latency_ms)),
            ("Loaded Latency (Up)", format_millis(self.up_loaded_latency_ms)),
            ("Streaming Score", format_score(self.scores.streaming)),
            ("Gaming Score", format_score(self.scores.gaming)),
            ("RTC Score", format_score(self.scores.rtc)),
        ]
    }

    /// Plain-text rendition for non-interactive output.
    pub fn to_text(&self) -> String {
        self.rows()
            .into_iter()
            .map(|(label, value)| {
                format!(
                    "{} {}",
                    format!("{}:", label).bold().white(),
                    value.bright_cyan()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Format a bandwidth figure with one decimal place.
pub fn format_mbps(mbps: f64) -> String {
    format!("{:.1} Mbps", mbps)
}

/// Format a latency/jitter figure with no decimal places.
pub fn format_millis(ms: f64) -> String {
    format!("{:.0} ms", ms)
}

/// Format a percentage with one decimal place.
pub fn format_percent(percent: f64) -> String {
    format!("{:.1}%", percent)
}

/// Format an opaque quality score with no decimal places.
pub fn format_score(score: f64) -> String {
    format!("{:.0}", score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> TestSummary {
        TestSummary {
            download_bps: 9_400_000.0,
            upload_bps: 2_100_000.0,
            unloaded_latency_ms: 12.0,
            unloaded_jitter_ms: 1.5,
            packet_loss: 0.002,
            down_loaded_latency_ms: 40.0,
            up_loaded_latency_ms: 35.0,
            scores: QualityScores { streaming: 90.0, gaming: 85.0, rtc: 88.0 },
        }
    }

    #[test]
    fn test_report_carries_summary_verbatim() {
        let report = ResultsReport::from_summary(&summary());

        assert_eq!(report.download_mbps, 9.4);
        assert_eq!(report.upload_mbps, 2.1);
        assert_eq!(report.latency_ms, 12.0);
        assert_eq!(report.jitter_ms, 1.5);
        assert!((report.packet_loss_percent - 0.2).abs() < 1e-9);
        assert_eq!(report.down_loaded_latency_ms, 40.0);
        assert_eq!(report.up_loaded_latency_ms, 35.0);
        assert_eq!(report.scores.streaming, 90.0);
    }

    #[test]
    fn test_rows_format_like_the_panel() {
        let report = ResultsReport::from_summary(&summary());
        let rows = report.rows();

        assert_eq!(rows[0], ("Download", "9.4 Mbps".to_string()));
        assert_eq!(rows[1], ("Upload", "2.1 Mbps".to_string()));
        assert_eq!(rows[2], ("Latency", "12 ms".to_string()));
        assert_eq!(rows[3], ("Jitter", "2 ms".to_string()));
        assert_eq!(rows[4], ("Packet Loss", "0.2%".to_string()));
        assert_eq!(rows[5], ("Loaded Latency (Down)", "40 ms".to_string()));
        assert_eq!(rows[6], ("Loaded Latency (Up)", "35 ms".to_string()));
        assert_eq!(rows[7], ("Streaming Score", "90".to_string()));
        assert_eq!(rows[8], ("Gaming Score", "85".to_string()));
        assert_eq!(rows[9], ("RTC Score", "88".to_string()));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = ResultsReport::from_summary(&summary());
        let json = serde_json::to_string(&report).unwrap();

        assert!(json.contains("\"timestamp\""));
        assert!(json.contains("\"download_mbps\":9.4"));
        assert!(json.contains("\"upload_mbps\":2.1"));
        assert!(json.contains("\"packet_loss_percent\""));
        assert!(json.contains("\"streaming\":90.0"));
    }

    #[test]
    fn test_text_output_contains_every_row() {
        let report = ResultsReport::from_summary(&summary());
        let text = report.to_text();

        for (label, value) in report.rows() {
            assert!(text.contains(label), "missing label {}", label);
            assert!(text.contains(&value), "missing value {}", value);
        }
    }
}
