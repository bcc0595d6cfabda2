//! TUI rendering logic using ratatui.
//!
//! Lays out the status line, phase indicator, gauge canvas, progress bar,
//! results table, and error view, and replays the gauge scene onto a
//! ratatui canvas.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Context, Line as CanvasLine},
        Block, Borders, Gauge, Paragraph,
    },
    Frame,
};

use crate::gauge::{self, DrawCommand, GaugeConfig, Scene, SURFACE_SIZE};
use crate::results::ResultsReport;
use crate::session::{RunStatus, TestPhase, TestSession};

/// Get color for speed value based on thresholds.
///
/// - Green: >= 100 Mbps (fast)
/// - Yellow: 25-100 Mbps (moderate)
/// - Red: < 25 Mbps (slow)
pub fn speed_color(speed_mbps: f64) -> Color {
    if speed_mbps >= 100.0 {
        Color::Green
    } else if speed_mbps >= 25.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Render one frame of the gauge UI.
pub fn render_frame(
    frame: &mut Frame,
    session: &TestSession,
    displayed_mbps: f64,
    config: &GaugeConfig,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Status line
            Constraint::Length(1), // Phase indicator
            Constraint::Min(10),   // Gauge + panel
            Constraint::Length(1), // Help bar
        ])
        .split(frame.area());

    render_status(frame, chunks[0], session);
    render_phase_indicator(frame, chunks[1], session);
    render_main(frame, chunks[2], session, displayed_mbps, config);
    render_help(frame, chunks[3], session);
}

/// Render the status line at the top.
pub fn render_status(frame: &mut Frame, area: Rect, session: &TestSession) {
    let (text, style) = match session.status {
        RunStatus::Idle => (
            "Press enter to start a speed test.".to_string(),
            Style::default().fg(Color::DarkGray),
        ),
        RunStatus::Initializing => (
            "Initializing...".to_string(),
            Style::default().fg(Color::Yellow),
        ),
        RunStatus::Running => (
            "Running speed test...".to_string(),
            Style::default().fg(Color::Yellow),
        ),
        RunStatus::Complete => (
            "Test complete!".to_string(),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        RunStatus::Failed => (
            format!(
                "Error: {}",
                session.error.as_deref().unwrap_or("speed test failed")
            ),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
    };

    frame.render_widget(Paragraph::new(text).style(style), area);
}

/// Render the phase indicator under the status line.
pub fn render_phase_indicator(frame: &mut Frame, area: Rect, session: &TestSession) {
    let (text, style) = match session.phase {
        TestPhase::Done => (
            "✓ Complete",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        _ => match session.phase.label() {
            Some(label) => (
                label,
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            // Idle and errored runs show no phase.
            None => ("", Style::default()),
        },
    };

    frame.render_widget(Paragraph::new(text).style(style), area);
}

/// Render the main area: gauge plus the phase-dependent panel, or the
/// error view on failure.
fn render_main(
    frame: &mut Frame,
    area: Rect,
    session: &TestSession,
    displayed_mbps: f64,
    config: &GaugeConfig,
) {
    // The gauge is hidden outright on failure, like the rest of the
    // in-progress chrome.
    if session.phase == TestPhase::Errored {
        render_error(frame, area, session);
        return;
    }

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_gauge(frame, halves[0], displayed_mbps, config);

    match session.phase {
        TestPhase::Done => {
            if let Some(ref summary) = session.summary {
                let report = ResultsReport::from_summary(summary);
                render_results(frame, halves[1], &report);
            }
        }
        _ => render_progress(frame, halves[1], session),
    }
}

/// Render the speedometer scene onto a canvas.
pub fn render_gauge(frame: &mut Frame, area: Rect, displayed_mbps: f64, config: &GaugeConfig) {
    let scene = gauge::render(displayed_mbps, config);

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::NONE))
        .marker(Marker::Braille)
        .x_bounds([0.0, SURFACE_SIZE])
        .y_bounds([0.0, SURFACE_SIZE])
        .paint(|ctx| paint_scene(ctx, &scene, config));

    frame.render_widget(canvas, area);
}

/// Replay a gauge scene onto a canvas context.
///
/// The scene uses screen coordinates (y grows downward); the canvas y axis
/// grows upward, so every y is flipped on the way through.
pub fn paint_scene(ctx: &mut Context, scene: &Scene, config: &GaugeConfig) {
    let (cx, cy) = config.center();
    let point = |angle: f64, radius: f64| -> (f64, f64) {
        (cx + radius * angle.cos(), SURFACE_SIZE - (cy + radius * angle.sin()))
    };

    for command in &scene.commands {
        match command {
            // The canvas starts blank every draw; a full redraw is implicit.
            DrawCommand::Clear => {}
            DrawCommand::Arc { radius, width, start, end, from, to } => {
                paint_arc(ctx, &point, *radius, *width, *start, *end, *from, *to);
            }
            DrawCommand::Tick { angle, inner, outer, color } => {
                let (x1, y1) = point(*angle, *inner);
                let (x2, y2) = point(*angle, *outer);
                ctx.draw(&CanvasLine { x1, y1, x2, y2, color: *color });
            }
            DrawCommand::Label { x, y, text, color } => {
                ctx.print(
                    *x,
                    SURFACE_SIZE - y,
                    Line::styled(text.clone(), Style::default().fg(*color)),
                );
            }
            DrawCommand::Needle { angle, length, color } => {
                let (x2, y2) = point(*angle, *length);
                ctx.draw(&CanvasLine {
                    x1: cx,
                    y1: SURFACE_SIZE - cy,
                    x2,
                    y2,
                    color: *color,
                });
            }
            DrawCommand::Disc { radius, color } => {
                ctx.draw(&Circle {
                    x: cx,
                    y: SURFACE_SIZE - cy,
                    radius: *radius,
                    color: *color,
                });
            }
        }
    }
}

/// Stroke an arc as short chords, grading the color along the sweep and
/// tripling the pass to suggest the stroke width.
#[allow(clippy::too_many_arguments)]
fn paint_arc(
    ctx: &mut Context,
    point: &dyn Fn(f64, f64) -> (f64, f64),
    radius: f64,
    width: f64,
    start: f64,
    end: f64,
    from: Color,
    to: Color,
) {
    const SEGMENTS: usize = 64;

    for pass in [-width / 2.0, 0.0, width / 2.0] {
        let r = radius + pass;
        for i in 0..SEGMENTS {
            let t0 = i as f64 / SEGMENTS as f64;
            let t1 = (i + 1) as f64 / SEGMENTS as f64;
            let (x1, y1) = point(start + (end - start) * t0, r);
            let (x2, y2) = point(start + (end - start) * t1, r);
            ctx.draw(&CanvasLine { x1, y1, x2, y2, color: gradient(from, to, t0) });
        }
    }
}

/// Linear interpolation between two RGB colors; non-RGB colors fall back
/// to the start color.
fn gradient(from: Color, to: Color, t: f64) -> Color {
    match (from, to) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => Color::Rgb(
            lerp_channel(r1, r2, t),
            lerp_channel(g1, g2, t),
            lerp_channel(b1, b2, t),
        ),
        _ => from,
    }
}

fn lerp_channel(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * t).round().clamp(0.0, 255.0) as u8
}

/// Render the progress bar and label while the test runs.
pub fn render_progress(frame: &mut Frame, area: Rect, session: &TestSession) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    let percent = session.progress_percent.clamp(0.0, 100.0) as u16;
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::NONE))
        .gauge_style(Style::default().fg(Color::Cyan))
        .percent(percent)
        .label(format!("{}%", percent));
    frame.render_widget(gauge, chunks[0]);

    let target = Paragraph::new(format!("Target: {:.1} Mbps", session.target_speed_mbps))
        .style(Style::default().fg(Color::White));
    frame.render_widget(target, chunks[1]);
}

/// Render the final results table.
pub fn render_results(frame: &mut Frame, area: Rect, report: &ResultsReport) {
    let mut lines = Vec::new();

    for (label, value) in report.rows() {
        let value_color = match label {
            "Download" => speed_color(report.download_mbps),
            "Upload" => speed_color(report.upload_mbps),
            _ => Color::Cyan,
        };

        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<22}", format!("{}:", label)),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::styled(value, Style::default().fg(value_color)),
        ]));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

/// Render the error view shown in place of the gauge.
fn render_error(frame: &mut Frame, area: Rect, session: &TestSession) {
    let message = session.error.as_deref().unwrap_or("speed test failed");

    let lines = vec![
        Line::from(Span::styled(
            format!("Error: {}", message),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Press enter to retest.",
            Style::default().fg(Color::Yellow),
        )),
    ];

    frame.render_widget(Paragraph::new(lines), area);
}

/// Render the help bar at the bottom.
pub fn render_help(frame: &mut Frame, area: Rect, session: &TestSession) {
    let help = if session.in_flight() {
        "q quit"
    } else if session.phase == TestPhase::Idle {
        "enter start · q quit"
    } else {
        "enter retest · q quit"
    };

    let paragraph = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{QualityScores, TestSummary};
    use proptest::prelude::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

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

    /// Render a frame into a test backend and flatten the buffer to text.
    fn render_to_string(session: &TestSession, displayed: f64) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        let config = GaugeConfig::default();

        terminal
            .draw(|frame| render_frame(frame, session, displayed, &config))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer.cell((x, y)).unwrap().symbol());
            }
            text.push('\n');
        }
        text
    }

    proptest! {
        #[test]
        fn prop_speed_color_coding_fast(speed in 100.0f64..=1e9) {
            prop_assert_eq!(speed_color(speed), Color::Green);
        }

        #[test]
        fn prop_speed_color_coding_moderate(speed in 25.0f64..100.0f64) {
            prop_assert_eq!(speed_color(speed), Color::Yellow);
        }

        #[test]
        fn prop_speed_color_coding_slow(speed in -1e9f64..25.0f64) {
            prop_assert_eq!(speed_color(speed), Color::Red);
        }
    }

    #[test]
    fn test_idle_frame_prompts_for_start() {
        let session = TestSession::idle();
        let rendered = render_to_string(&session, 0.0);
        assert!(rendered.contains("Press enter to start a speed test."));
        assert!(rendered.contains("enter start"));
    }

    #[test]
    fn test_running_frame_shows_phase_and_progress() {
        let mut session = TestSession::start_run();
        session.apply_event(&crate::engine::MeasurementEvent::RunningChanged {
            running: true,
        });
        session.apply_event(&crate::engine::MeasurementEvent::ResultsUpdated {
            download_bps: 5_000_000.0,
            download_samples: 3,
            upload_samples: 0,
        });

        let rendered = render_to_string(&session, 2.5);
        assert!(rendered.contains("Running speed test..."));
        assert!(rendered.contains("Measuring Download..."));
        assert!(rendered.contains("75%"));
        assert!(rendered.contains("Target: 5.0 Mbps"));
    }

    #[test]
    fn test_done_frame_shows_results_verbatim() {
        let mut session = TestSession::start_run();
        session.apply_event(&crate::engine::MeasurementEvent::RunningChanged {
            running: false,
        });
        session.apply_event(&crate::engine::MeasurementEvent::Finished(Box::new(
            summary(),
        )));

        let rendered = render_to_string(&session, 9.4);
        assert!(rendered.contains("Test complete!"));
        assert!(rendered.contains("✓ Complete"));
        assert!(rendered.contains("9.4 Mbps"));
        assert!(rendered.contains("2.1 Mbps"));
        assert!(rendered.contains("12 ms"));
        assert!(rendered.contains("0.2%"));
        assert!(rendered.contains("90"));
    }

    #[test]
    fn test_failed_frame_shows_error_and_hides_gauge_labels() {
        let mut session = TestSession::start_run();
        session.apply_event(&crate::engine::MeasurementEvent::Failed {
            message: "network unreachable".to_string(),
        });

        let rendered = render_to_string(&session, 3.0);
        assert!(rendered.contains("Error: network unreachable"));
        assert!(rendered.contains("Press enter to retest."));
        // The gauge scale labels disappear with the canvas.
        assert!(!rendered.contains("1000"));
    }

    #[test]
    fn test_gauge_canvas_draws_scale_labels() {
        let session = TestSession::start_run();
        let rendered = render_to_string(&session, 0.0);
        for label in ["200", "400", "600", "800", "1000"] {
            assert!(rendered.contains(label), "missing scale label {}", label);
        }
    }
}
