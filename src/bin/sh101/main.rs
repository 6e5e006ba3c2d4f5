//! sh101 - terminal front end for the synthesizer engine
//!
//! Run with: cargo run --bin sh101 -- --tempo 128

mod app;
mod ui;

use std::{fs::File, path::PathBuf, sync::Mutex};

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use tracing_subscriber::EnvFilter;

use app::App;

#[derive(Parser, Debug)]
#[command(name = "sh101", version, about = "SH-101 style mono synth in the terminal")]
struct Args {
    /// Sequencer tempo in BPM (60-200)
    #[arg(short, long, default_value_t = 120.0)]
    tempo: f32,

    /// Output device name (default device when omitted)
    #[arg(short, long)]
    device: Option<String>,

    /// Log file; the terminal belongs to the UI
    #[arg(long, default_value = "sh101.log")]
    log_file: PathBuf,
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let log = File::create(&args.log_file)
        .wrap_err_with(|| format!("failed to create log file {}", args.log_file.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(log))
        .with_ansi(false)
        .init();

    let mut app = App::start(args.device.as_deref(), args.tempo)?;

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();

    app.shutdown();
    result
}
