use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use crossbeam_channel::{bounded, Sender};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use palmdeck_lib::config::{self, Config};
use palmdeck_lib::controller::Controller;
use palmdeck_lib::dispatch::{CommandSink, LogSink};
use palmdeck_lib::input::{FrameReader, InputError, InputEvent, StreamClock};
use palmdeck_lib::session::FrameReport;

/// Frames buffered between the reader thread and the controller
const CHANNEL_CAPACITY: usize = 64;

/// control presentations with hand gestures
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "Reads hand landmark frames as JSON Lines, classifies each frame into a gesture and sends presentation commands. Make a fist, then lift one finger to open a 3 second gesture window."
)]
struct Cli {
    /// landmark stream to read (defaults to stdin)
    #[clap(short, long)]
    input: Option<PathBuf>,

    /// config file to use instead of ~/.palmdeck/config.json
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// where fired commands go
    #[clap(short, long, value_enum, default_value_t = DispatchMode::Log)]
    dispatch: DispatchMode,

    /// per-frame output on stdout
    #[clap(short, long, value_enum, default_value_t = Telemetry::None)]
    telemetry: Telemetry,

    /// close the gesture window after each command
    #[clap(long)]
    one_shot: bool,

    /// minimum raised fingers (thumb excluded) for an open palm
    #[clap(long, value_parser = clap::value_parser!(u8).range(1..=4))]
    open_palm_fingers: Option<u8>,

    /// also append logs to ~/.palmdeck/logs/palmdeck.log
    #[clap(long)]
    log_file: bool,

    /// print the effective configuration and exit
    #[clap(long)]
    print_config: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum DispatchMode {
    /// log commands without sending keys
    Log,
    /// press the bound keys
    Keys,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Telemetry {
    None,
    Json,
    Text,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config::get_config_path);
    let mut config = config::load_from_path(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    apply_overrides(&mut config, &cli);

    palmdeck_lib::init_tracing(cli.log_file || config.general.log_to_file);
    tracing::debug!("Using config {}", config_path.display());

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let sink = make_sink(cli.dispatch)?;
    let started = Instant::now();
    let mut controller = Controller::new(&config, sink, started)?;
    let clock = StreamClock::new(started);

    let reader = open_input(cli.input.as_deref())?;
    let (tx, rx) = bounded(CHANNEL_CAPACITY);
    let reader_thread = thread::spawn(move || read_events(reader, tx));

    tracing::info!("Ready: make a fist, then lift one finger to open the gesture window");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    controller.run(&rx, &clock, |report| {
        if let Err(e) = write_telemetry(&mut out, cli.telemetry, report) {
            tracing::warn!("Failed to write telemetry: {}", e);
        }
    });

    match reader_thread.join() {
        Ok(Ok(lines)) => tracing::info!("Input finished after {} lines", lines),
        Ok(Err(e)) => tracing::error!("{}", e),
        Err(_) => bail!("Input reader thread panicked"),
    }

    let stats = controller.stats(Instant::now());
    if controller.dispatch_failures() > 0 {
        tracing::warn!("{} commands failed to dispatch", controller.dispatch_failures());
    }
    if config.general.print_summary {
        eprintln!("Session statistics:\n{}", stats.summary());
    }

    Ok(())
}

/// Apply command-line overrides on top of the loaded config
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if cli.one_shot {
        config.trigger.consume_on_fire = true;
    }
    if let Some(fingers) = cli.open_palm_fingers {
        config.classifier.open_palm_min_fingers = fingers;
    }
}

fn make_sink(mode: DispatchMode) -> Result<Box<dyn CommandSink>> {
    match mode {
        DispatchMode::Log => Ok(Box::new(LogSink::new())),
        #[cfg(feature = "keystrokes")]
        DispatchMode::Keys => Ok(Box::new(palmdeck_lib::dispatch::KeystrokeSink::new()?)),
        #[cfg(not(feature = "keystrokes"))]
        DispatchMode::Keys => {
            bail!("Keystroke dispatch needs a build with the `keystrokes` feature")
        }
    }
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead + Send>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

/// Reader thread body: parse lines and hand events to the controller
///
/// Returns the number of lines read. Malformed lines are skipped.
fn read_events(
    reader: Box<dyn BufRead + Send>,
    tx: Sender<InputEvent>,
) -> Result<usize, InputError> {
    let mut events = FrameReader::new(reader);
    for item in events.by_ref() {
        match item {
            Ok(event) => {
                if tx.send(event).is_err() {
                    tracing::debug!("Controller stopped, dropping remaining input");
                    break;
                }
            }
            Err(e) if e.is_recoverable() => tracing::warn!("Skipping {}", e),
            Err(e) => return Err(e),
        }
    }
    Ok(events.line())
}

fn write_telemetry<W: Write>(
    out: &mut W,
    mode: Telemetry,
    report: &FrameReport,
) -> io::Result<()> {
    match mode {
        Telemetry::None => Ok(()),
        Telemetry::Json => {
            serde_json::to_writer(&mut *out, report)?;
            writeln!(out)
        }
        Telemetry::Text => writeln!(out, "{}", format_report(report)),
    }
}

fn format_report(report: &FrameReport) -> String {
    if !report.hand_present {
        return format!("{:<14} {}", "-", if report.armed { "armed" } else { "" });
    }

    let mut line = format!(
        "{:<14} {:.2}  fingers={}",
        report.label.as_str(),
        report.confidence,
        report.extended_count
    );
    if report.just_armed {
        line.push_str("  window opened");
    } else if report.window_expired {
        line.push_str("  window expired");
    } else if report.armed {
        line.push_str("  armed");
    }
    if let Some(command) = report.command {
        line.push_str(&format!("  -> {}", command));
    }
    line
}
