//! Controller for the gauge display lifecycle.
//!
//! Owns the terminal, the session, the animator, and the frame loop, and
//! runs the single-threaded event loop: engine events feed the interpreter,
//! frame ticks advance the needle, key input starts and stops runs. The one
//! mutable shared resource is the frame task, guarded by cancel-before-
//! replace; ticks from a superseded run are dropped by sequence number.

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use log::{debug, info};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::{self, error::TryRecvError};

use super::display_mode::DisplayMode;
use super::renderer::render_frame;
use crate::animation::{
    AnimationCommand, Animator, FrameLoop, FrameTick, FRAME_PERIOD,
};
use crate::engine::{EngineConfig, MeasurementEngine, MeasurementEvent};
use crate::errors::GaugeError;
use crate::gauge::GaugeConfig;
use crate::results::ResultsReport;
use crate::session::{TestPhase, TestSession};

/// What a key press asks the controller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    /// Start a test, or retest after completion or failure.
    Start,
    /// Leave the application.
    Quit,
}

/// Controller for the gauge display.
pub struct GaugeController {
    mode: DisplayMode,
    config: GaugeConfig,
    engine_config: EngineConfig,
    session: TestSession,
    animator: Animator,
    frames: FrameLoop,
    /// Monotonic run number; frame ticks carrying an older number are stale.
    run_seq: u64,
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    initialized: bool,
}

impl GaugeController {
    /// Create a new controller in the given display mode.
    pub fn new(mode: DisplayMode, config: GaugeConfig) -> Result<Self, GaugeError> {
        let animator = Animator::new(&config);
        Ok(Self {
            mode,
            config,
            engine_config: EngineConfig::default(),
            session: TestSession::idle(),
            animator,
            frames: FrameLoop::new(FRAME_PERIOD),
            run_seq: 0,
            terminal: None,
            initialized: false,
        })
    }

    /// Get current display mode.
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// Initialize the terminal. A no-op outside TUI mode.
    pub fn init(&mut self) -> Result<(), GaugeError> {
        if self.mode != DisplayMode::Tui {
            return Ok(());
        }

        enable_raw_mode()
            .map_err(|e| GaugeError::terminal(format!("cannot enter raw mode: {}", e)))?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)
            .map_err(|e| GaugeError::terminal(format!("cannot set up screen: {}", e)))?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)
            .map_err(|e| GaugeError::terminal(format!("cannot create terminal: {}", e)))?;

        self.terminal = Some(terminal);
        self.initialized = true;

        Ok(())
    }

    /// Restore the terminal. Safe to call when never initialized.
    pub fn cleanup(&mut self) -> Result<(), GaugeError> {
        if !self.initialized {
            return Ok(());
        }

        if let Some(ref mut terminal) = self.terminal {
            execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)
                .map_err(|e| {
                    GaugeError::terminal(format!("cannot restore screen: {}", e))
                })?;
        }

        disable_raw_mode()
            .map_err(|e| GaugeError::terminal(format!("cannot leave raw mode: {}", e)))?;

        self.initialized = false;
        self.terminal = None;

        Ok(())
    }

    /// Drive the engine and the display until the user quits (TUI mode) or
    /// the run settles (silent/JSON modes).
    pub async fn run(
        &mut self,
        engine: &mut dyn MeasurementEngine,
    ) -> Result<(), GaugeError> {
        let (frame_tx, mut frame_rx) = mpsc::unbounded_channel();
        let mut engine_rx: Option<mpsc::UnboundedReceiver<MeasurementEvent>> = None;

        // Non-interactive modes start measuring immediately; the gauge
        // waits for the start key.
        if self.mode != DisplayMode::Tui {
            engine_rx = Some(self.start_run(engine)?);
        }

        loop {
            self.render()?;

            // Drain engine events in delivery order.
            let mut engine_gone = false;
            if let Some(rx) = engine_rx.as_mut() {
                loop {
                    match rx.try_recv() {
                        Ok(event) => self.handle_event(&event, &frame_tx),
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => {
                            engine_gone = true;
                            break;
                        }
                    }
                }
            }
            if engine_gone {
                engine_rx = None;
                if self.session.in_flight() {
                    // The engine died without a verdict; treat it as failure.
                    self.handle_event(
                        &MeasurementEvent::Failed {
                            message: "engine stopped without a result".to_string(),
                        },
                        &frame_tx,
                    );
                }
            }

            // Advance the needle for pending frame ticks.
            while let Ok(tick) = frame_rx.try_recv() {
                self.apply_frame_tick(tick);
            }

            match self.mode {
                DisplayMode::Tui => match self.poll_key()? {
                    Some(KeyAction::Quit) => break,
                    Some(KeyAction::Start) => {
                        // Idempotent while a test is in flight.
                        if !self.session.in_flight() {
                            engine_rx = Some(self.start_run(engine)?);
                        }
                    }
                    None => {}
                },
                _ => {
                    if matches!(
                        self.session.phase,
                        TestPhase::Done | TestPhase::Errored
                    ) {
                        break;
                    }
                    tokio::time::sleep(FRAME_PERIOD).await;
                }
            }
        }

        self.frames.cancel();
        self.finish_output()
    }

    /// Begin a fresh run: bump the run sequence, replace the session,
    /// reset the needle, cancel the previous frame task, and restart the
    /// engine on a new event channel. The old channel is dropped, so any
    /// straggling events from the previous run go nowhere.
    fn start_run(
        &mut self,
        engine: &mut dyn MeasurementEngine,
    ) -> Result<mpsc::UnboundedReceiver<MeasurementEvent>, GaugeError> {
        self.run_seq += 1;
        info!("starting test run {}", self.run_seq);

        self.session = TestSession::start_run();
        self.animator.reset();
        self.frames.cancel();

        let (tx, rx) = mpsc::unbounded_channel();
        engine.start(&self.engine_config, tx)?;
        Ok(rx)
    }

    /// Feed one engine event through the interpreter and carry out the
    /// resulting animation command.
    fn handle_event(
        &mut self,
        event: &MeasurementEvent,
        frame_tx: &mpsc::UnboundedSender<FrameTick>,
    ) {
        match self.session.apply_event(event) {
            AnimationCommand::Seek(target) => {
                self.animator.start(target);
                if self.frames.scheduled() == 0 {
                    self.frames.arm(self.run_seq, frame_tx.clone());
                }
            }
            AnimationCommand::Cancel => {
                self.animator.cancel();
                self.frames.cancel();
            }
            AnimationCommand::None => {}
        }
    }

    /// Advance the animation for one frame tick, unless the tick belongs
    /// to a superseded run.
    fn apply_frame_tick(&mut self, tick: FrameTick) {
        if tick.run != self.run_seq {
            debug!("dropping stale frame tick from run {}", tick.run);
            return;
        }

        self.animator.tick();
        if !self.animator.is_active() {
            // Converged; stop scheduling frames until the next target.
            debug!(
                "needle settled at {:.1} Mbps (target {:.1})",
                self.animator.displayed(),
                self.animator.target()
            );
            self.frames.cancel();
        }
    }

    /// Render the current state. A no-op outside TUI mode.
    fn render(&mut self) -> Result<(), GaugeError> {
        if self.mode != DisplayMode::Tui {
            return Ok(());
        }

        if let Some(ref mut terminal) = self.terminal {
            let session = self.session.clone();
            let displayed = self.animator.displayed();
            let config = self.config.clone();
            terminal
                .draw(|frame| render_frame(frame, &session, displayed, &config))
                .map_err(|e| {
                    GaugeError::terminal(format!("cannot draw frame: {}", e))
                })?;
        }

        Ok(())
    }

    /// Poll for a key press, mapping it to an action.
    fn poll_key(&self) -> Result<Option<KeyAction>, GaugeError> {
        let ready = event::poll(Duration::from_millis(30))
            .map_err(|e| GaugeError::terminal(format!("cannot poll input: {}", e)))?;
        if !ready {
            return Ok(None);
        }

        let read = event::read()
            .map_err(|e| GaugeError::terminal(format!("cannot read input: {}", e)))?;
        if let Event::Key(key) = read {
            if key.kind == KeyEventKind::Press {
                return Ok(match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => Some(KeyAction::Quit),
                    KeyCode::Enter | KeyCode::Char('r') => Some(KeyAction::Start),
                    _ => None,
                });
            }
        }

        Ok(None)
    }

    /// Emit end-of-run output for the non-interactive modes.
    fn finish_output(&mut self) -> Result<(), GaugeError> {
        if self.session.phase == TestPhase::Errored && self.mode != DisplayMode::Tui {
            let message = self
                .session
                .error
                .clone()
                .unwrap_or_else(|| "speed test failed".to_string());
            return Err(GaugeError::engine(message));
        }

        if let Some(ref summary) = self.session.summary {
            let report = ResultsReport::from_summary(summary);
            match self.mode {
                DisplayMode::Json => {
                    let json = serde_json::to_string_pretty(&report).map_err(|e| {
                        GaugeError::new(
                            crate::errors::ErrorKind::Unknown,
                            format!("cannot serialize results: {}", e),
                        )
                    })?;
                    println!("{}", json);
                }
                DisplayMode::Silent => println!("{}", report.to_text()),
                DisplayMode::Tui => {}
            }
        }

        Ok(())
    }

    /// The current session, for tests.
    #[cfg(test)]
    fn session(&self) -> &TestSession {
        &self.session
    }
}

impl Drop for GaugeController {
    /// Restore the terminal even when cleanup() was never called.
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
