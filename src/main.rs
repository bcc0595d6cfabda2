mod animation;
mod engine;
mod errors;
mod gauge;
mod results;
mod session;
mod tui;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::debug;

use crate::engine::ReplayEngine;
use crate::errors::GaugeError;
use crate::gauge::GaugeConfig;
use crate::tui::{DisplayMode, GaugeController};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Emit results as JSON instead of the interactive gauge.
    #[arg(long)]
    json: bool,

    /// Replay a recorded engine event trace instead of the bundled one.
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,

    #[command(flatten)]
    verbosity: clap_verbosity_flag::Verbosity,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbosity.log_level_filter())
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::from(errors::exit_codes::SUCCESS as u8),
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::from(error.exit_code() as u8)
        }
    }
}

async fn run(cli: Cli) -> Result<(), GaugeError> {
    let mode = DisplayMode::detect(cli.json, std::io::stdout().is_terminal());
    debug!("display mode: {:?}", mode);

    let mut engine = match cli.replay {
        Some(ref path) => ReplayEngine::from_path(path)?,
        None => ReplayEngine::new(ReplayEngine::default_trace()),
    };

    let mut controller = GaugeController::new(mode, GaugeConfig::default())?;
    controller.init()?;

    let result = controller.run(&mut engine).await;

    // Restore the terminal before any error text reaches stderr.
    controller.cleanup()?;
    result
}
