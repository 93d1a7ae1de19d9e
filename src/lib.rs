//! PalmDeck - Hand-gesture presentation control
//!
//! Classifies hand landmark frames into gestures and turns them into
//! presentation commands, but only inside a short window opened by lifting a
//! finger out of a closed fist.

pub mod command;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod gesture;
pub mod input;
pub mod landmarks;
pub mod session;
pub mod stats;
pub mod trigger;

use std::path::PathBuf;

/// Get the path to the log directory (~/.palmdeck/logs)
pub fn get_log_dir() -> PathBuf {
    config::get_config_dir().join("logs")
}

/// Set up logging to stderr, plus an append-only file when requested
///
/// `RUST_LOG` overrides the default `info` filter. Stdout is left free for
/// telemetry.
pub fn init_tracing(log_to_file: bool) {
    use tracing_subscriber::prelude::*;

    /// Format timestamps using the system's local time via chrono
    struct LocalTimer;
    impl tracing_subscriber::fmt::time::FormatTime for LocalTimer {
        fn format_time(
            &self,
            w: &mut tracing_subscriber::fmt::format::Writer<'_>,
        ) -> std::fmt::Result {
            write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
        }
    }

    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(LocalTimer);

    let log_file = if log_to_file {
        let log_dir = get_log_dir();
        let _ = std::fs::create_dir_all(&log_dir);
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join("palmdeck.log"))
            .ok()
    } else {
        None
    };

    if let Some(file) = log_file {
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_timer(LocalTimer)
            .with_ansi(false);
        tracing_subscriber::registry()
            .with(filter())
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter())
            .with(stderr_layer)
            .init();
    }
}
