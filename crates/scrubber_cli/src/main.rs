mod args;
mod commands;
mod error;
mod options;

use std::fs;
use std::io;
use std::path::Path;
use std::process::ExitCode;

use scrubber::{Retention, TimelineOptions};
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::args::{Args, Command, USAGE};
use crate::error::Result;
use crate::options::CliOptions;

fn setup_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scrubber=info"));

    // stdout carries command output, logs go to stderr
    let console_layer = fmt::layer().with_target(true).with_writer(io::stderr);

    let Some(log_dir) = log_dir else {
        tracing_subscriber::registry()
            .with(console_layer)
            .with(env_filter)
            .init();
        return None;
    };

    use tracing_appender::{
        non_blocking,
        rolling::{RollingFileAppender, Rotation},
    };

    let file_appender = RollingFileAppender::new(
        Rotation::DAILY,
        log_dir,
        format!("scrubber-{}.log", env!("CARGO_PKG_VERSION")),
    );
    let (non_blocking_writer, guard) = non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking_writer);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    Some(guard)
}

/// Config file first, then flags on top
fn timeline_options(args: &Args) -> Result<TimelineOptions> {
    let mut options = match &args.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => TimelineOptions::default(),
    };

    if let Some(interval) = args.key_frame_interval {
        options = options.key_frame_interval(interval);
    }
    if args.options.contains(CliOptions::Loop) {
        options = options.looping(true);
    }
    if args.options.contains(CliOptions::KeepAll) {
        options = options.retention(Retention::All);
    }

    Ok(options)
}

fn run(args: &Args, command: &Command) -> Result<()> {
    let options = timeline_options(args)?;

    match command {
        Command::Info { file } => {
            let mut session = commands::load_session(file, options)?;
            let json = args.options.contains(CliOptions::Json);
            commands::info(&mut session, json, &mut io::stdout().lock())
        }
        Command::Explode { file, dir } => {
            let session = commands::load_session(file, options)?;
            let report = commands::explode(&session, dir, options.retention)?;
            if !report.failures.is_empty() {
                warn!(
                    "{} frames failed to decode: {:?}",
                    report.failures.len(),
                    report.failures
                );
            }
            Ok(())
        }
        Command::Frame { file, index, out } => {
            let mut session = commands::load_session(file, options)?;
            commands::frame(&mut session, *index, out)
        }
    }
}

fn main() -> ExitCode {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let (args, unrecognized) = Args::parse(&argv);

    // need guard to live for lifetime of program
    let _guard = setup_logging(args.log_dir.as_deref());

    for arg in &unrecognized {
        warn!("unrecognized argument: {arg}");
    }

    let Some(command) = &args.command else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    match run(&args, command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("scrubber: {err}");
            ExitCode::FAILURE
        }
    }
}
