//! # Bomber Terminal Client
//!
//! Connects, joins, and draws the board as text at 30 Hz. Logs go to
//! stderr so stdout carries only the board and notices.
//!
//! ## Usage
//!
//! ```bash
//! bomber_client --name Ann --auto-ready
//! RUST_LOG=bomber_networking=debug bomber_client --config client.toml
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use bomber::cli::USAGE;
use bomber::{spawn_stdin_reader, CliArgs, FramePacer, TerminalApp, FRAME_RATE};
use bomber_networking::{ChannelConfig, ClientConfig, GameClient, LineChannel};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };
    if args.help {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "client stopped");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    args.apply(&mut config);
    config.validate()?;

    tracing::info!(addr = %config.server_addr(), role = ?config.role, "starting");
    let channel = Arc::new(LineChannel::new(ChannelConfig::from(&config)));
    let mut app = TerminalApp::new(GameClient::new(config, channel), args.auto_ready);
    app.client_mut().connect()?;

    let (inputs, _reader) = spawn_stdin_reader()?;
    let mut pacer = FramePacer::new(FRAME_RATE);

    while app.is_running() {
        pacer.wait_for_next_frame();
        let start = pacer.begin_frame();

        for input in inputs.try_iter() {
            app.handle_input(input, start);
        }
        let out = app.frame(start);
        for notice in &out.notices {
            println!("-- {notice}");
        }
        if let Some(board) = out.board {
            println!("{board}");
        }

        pacer.end_frame(start);
    }

    let stats = pacer.stats();
    tracing::info!(
        frames = pacer.frame_count(),
        late = stats.late_frames,
        avg_us = stats.avg_frame_us,
        cycles = app.client().stats().cycles,
        rejected = app.client().stats().rejected_positions,
        "session over"
    );
    Ok(())
}
