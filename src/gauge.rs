//! Speedometer gauge geometry and scene construction.
//!
//! [`render`] is a pure function from a displayed speed and a [`GaugeConfig`]
//! to a [`Scene`]: an ordered list of vector draw commands (clear, outer arc,
//! ticks, labels, needle, hub). The scene is backend-free data; the
//! presentation layer replays it onto whatever surface it owns.

use std::f64::consts::PI;

use ratatui::style::Color;

/// Side length of the square drawing surface.
pub const SURFACE_SIZE: f64 = 300.0;

const ARC_RADIUS: f64 = 140.0;
const ARC_WIDTH: f64 = 20.0;
const TICK_INNER_RADIUS: f64 = 120.0;
const TICK_OUTER_RADIUS: f64 = 140.0;
const LABEL_RADIUS: f64 = 100.0;
const LABEL_OFFSET_X: f64 = -15.0;
const LABEL_OFFSET_Y: f64 = 5.0;
const NEEDLE_LENGTH: f64 = 120.0;
const HUB_OUTER_RADIUS: f64 = 8.0;
const HUB_INNER_RADIUS: f64 = 6.0;

const ARC_GRADIENT_FROM: Color = Color::Rgb(0x00, 0x74, 0xd9);
const ARC_GRADIENT_TO: Color = Color::Rgb(0xb1, 0x0d, 0xc9);
const TICK_COLOR: Color = Color::White;
const LABEL_COLOR: Color = Color::White;
const NEEDLE_COLOR: Color = Color::White;
const HUB_OUTER_COLOR: Color = Color::Rgb(0x00, 0x1f, 0x3f);
const HUB_INNER_COLOR: Color = Color::Rgb(0x00, 0xff, 0xff);

/// Static gauge configuration.
#[derive(Debug, Clone)]
pub struct GaugeConfig {
    /// Sweep start angle in radians.
    pub sweep_start: f64,
    /// Sweep end angle in radians.
    pub sweep_end: f64,
    /// Full-scale speed in Mbps; the needle pins here for larger values.
    pub max_scale_mbps: f64,
    /// Number of tick intervals across the sweep (ticks = intervals + 1).
    pub tick_intervals: usize,
    /// Per-frame easing factor applied by the animator.
    pub smoothing: f64,
    /// Animation convergence threshold in Mbps.
    pub epsilon_mbps: f64,
}

impl Default for GaugeConfig {
    fn default() -> Self {
        Self {
            sweep_start: PI * 0.75,
            sweep_end: PI * 2.25,
            max_scale_mbps: 1000.0,
            tick_intervals: 10,
            smoothing: 0.1,
            epsilon_mbps: 0.1,
        }
    }
}

impl GaugeConfig {
    /// Angular width of the sweep in radians.
    pub fn sweep(&self) -> f64 {
        self.sweep_end - self.sweep_start
    }

    /// Center of the drawing surface.
    pub fn center(&self) -> (f64, f64) {
        (SURFACE_SIZE / 2.0, SURFACE_SIZE / 2.0)
    }
}

/// Needle angle for a displayed speed, clamped to the full sweep.
pub fn needle_angle(speed_mbps: f64, config: &GaugeConfig) -> f64 {
    config.sweep_start
        + config.sweep() * speed_mbps.min(config.max_scale_mbps) / config.max_scale_mbps
}

/// One vector drawing primitive. Angles are radians in screen coordinates
/// (y grows downward, matching the sweep constants); radial commands are
/// centered on the surface center.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Clear the whole surface.
    Clear,
    /// Stroked circular arc with a color gradient along its sweep.
    Arc {
        radius: f64,
        width: f64,
        start: f64,
        end: f64,
        from: Color,
        to: Color,
    },
    /// Short radial line between two radii.
    Tick { angle: f64, inner: f64, outer: f64, color: Color },
    /// Text anchored at an absolute surface position.
    Label { x: f64, y: f64, text: String, color: Color },
    /// Straight line from the center to the tip at `length`.
    Needle { angle: f64, length: f64, color: Color },
    /// Filled disc centered on the surface center.
    Disc { radius: f64, color: Color },
}

/// An ordered vector drawing of the gauge. Later commands paint over
/// earlier ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub commands: Vec<DrawCommand>,
}

/// Build the gauge scene for a displayed speed.
pub fn render(displayed_mbps: f64, config: &GaugeConfig) -> Scene {
    let (cx, cy) = config.center();
    let intervals = config.tick_intervals;
    let mut commands = Vec::with_capacity(intervals + 10);

    commands.push(DrawCommand::Clear);

    commands.push(DrawCommand::Arc {
        radius: ARC_RADIUS,
        width: ARC_WIDTH,
        start: config.sweep_start,
        end: config.sweep_end,
        from: ARC_GRADIENT_FROM,
        to: ARC_GRADIENT_TO,
    });

    for i in 0..=intervals {
        let angle = config.sweep_start + config.sweep() * i as f64 / intervals as f64;
        commands.push(DrawCommand::Tick {
            angle,
            inner: TICK_INNER_RADIUS,
            outer: TICK_OUTER_RADIUS,
            color: TICK_COLOR,
        });
    }

    // Every second tick carries its scale value, nudged so the text sits
    // visually centered beside the tick.
    for i in (0..=intervals).step_by(2) {
        let angle = config.sweep_start + config.sweep() * i as f64 / intervals as f64;
        let value = config.max_scale_mbps * i as f64 / intervals as f64;
        commands.push(DrawCommand::Label {
            x: cx + LABEL_RADIUS * angle.cos() + LABEL_OFFSET_X,
            y: cy + LABEL_RADIUS * angle.sin() + LABEL_OFFSET_Y,
            text: format!("{}", value.round() as i64),
            color: LABEL_COLOR,
        });
    }

    commands.push(DrawCommand::Needle {
        angle: needle_angle(displayed_mbps, config),
        length: NEEDLE_LENGTH,
        color: NEEDLE_COLOR,
    });

    // Hub always sits on top of the needle.
    commands.push(DrawCommand::Disc { radius: HUB_OUTER_RADIUS, color: HUB_OUTER_COLOR });
    commands.push(DrawCommand::Disc { radius: HUB_INNER_RADIUS, color: HUB_INNER_COLOR });

    Scene { commands }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config() -> GaugeConfig {
        GaugeConfig::default()
    }

    #[test]
    fn test_needle_angle_endpoints() {
        let config = config();
        assert!((needle_angle(0.0, &config) - PI * 0.75).abs() < 1e-12);
        assert!((needle_angle(1000.0, &config) - PI * 2.25).abs() < 1e-12);
        assert!((needle_angle(500.0, &config) - PI * 1.5).abs() < 1e-12);
    }

    proptest! {
        /// The needle angle never decreases as the displayed speed grows.
        #[test]
        fn prop_needle_angle_monotonic(a in 0.0f64..5000.0, b in 0.0f64..5000.0) {
            let config = config();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(needle_angle(lo, &config) <= needle_angle(hi, &config));
        }

        /// Values past full scale pin at the maximum sweep angle.
        #[test]
        fn prop_needle_pins_past_full_scale(speed in 1000.0f64..1e12) {
            let config = config();
            prop_assert!((needle_angle(speed, &config) - config.sweep_end).abs() < 1e-9);
        }

        /// The needle always stays inside the sweep.
        #[test]
        fn prop_needle_within_sweep(speed in 0.0f64..1e12) {
            let config = config();
            let angle = needle_angle(speed, &config);
            prop_assert!(angle >= config.sweep_start);
            prop_assert!(angle <= config.sweep_end + 1e-9);
        }
    }

    #[test]
    fn test_scene_clears_first_and_hubs_last() {
        let scene = render(250.0, &config());
        assert_eq!(scene.commands[0], DrawCommand::Clear);

        let len = scene.commands.len();
        assert!(matches!(scene.commands[len - 2], DrawCommand::Disc { radius, .. }
            if radius == HUB_OUTER_RADIUS));
        assert!(matches!(scene.commands[len - 1], DrawCommand::Disc { radius, .. }
            if radius == HUB_INNER_RADIUS));
        // The needle is painted immediately under the hub.
        assert!(matches!(scene.commands[len - 3], DrawCommand::Needle { .. }));
    }

    #[test]
    fn test_scene_has_eleven_ticks() {
        let scene = render(0.0, &config());
        let ticks = scene
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Tick { .. }))
            .count();
        assert_eq!(ticks, 11);
    }

    #[test]
    fn test_labels_cover_even_ticks() {
        let scene = render(0.0, &config());
        let labels: Vec<&str> = scene
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Label { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(labels, ["0", "200", "400", "600", "800", "1000"]);
    }

    #[test]
    fn test_label_anchor_offsets() {
        let config = config();
        let scene = render(0.0, &config);
        let (cx, cy) = config.center();

        // The "0" label sits beside the first tick.
        let first = scene.commands.iter().find_map(|c| match c {
            DrawCommand::Label { x, y, text, .. } if text == "0" => Some((*x, *y)),
            _ => None,
        });
        let (x, y) = first.unwrap();
        let angle = config.sweep_start;
        assert!((x - (cx + LABEL_RADIUS * angle.cos() + LABEL_OFFSET_X)).abs() < 1e-9);
        assert!((y - (cy + LABEL_RADIUS * angle.sin() + LABEL_OFFSET_Y)).abs() < 1e-9);
    }

    #[test]
    fn test_needle_tracks_displayed_speed() {
        let config = config();
        for speed in [0.0, 9.4, 480.0, 1000.0, 2600.0] {
            let scene = render(speed, &config);
            let angle = scene.commands.iter().find_map(|c| match c {
                DrawCommand::Needle { angle, .. } => Some(*angle),
                _ => None,
            });
            assert_eq!(angle, Some(needle_angle(speed, &config)));
        }
    }
}
