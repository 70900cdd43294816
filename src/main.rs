//! apcheck binary entrypoint kept minimal. The runtime lives in `app`.

use std::fmt;
use std::path::Path;
use std::process::ExitCode;
use std::sync::OnceLock;

use apcheck::app::{self, Context};
use apcheck::args::{Args, determine_log_level};
use apcheck::config::paths;
use clap::Parser;

/// Log timestamp formatter backed by `chrono`.
struct ApcheckTimer;

impl tracing_subscriber::fmt::time::FormatTime for ApcheckTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> fmt::Result {
        let ts = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string();
        w.write_str(&ts)
    }
}

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Build the level filter, letting `RUST_LOG` take precedence.
fn env_filter(level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
}

/// What: Install the global tracing subscriber.
///
/// Inputs:
/// - `config_dir`: Directory whose `logs/` subdirectory receives `apcheck.log`.
/// - `level`: Default level when `RUST_LOG` is unset.
///
/// Output:
/// - None; the non-blocking writer guard is parked in `LOG_GUARD`.
///
/// Details:
/// - Falls back to stderr when the log file cannot be opened.
fn init_logging(config_dir: &Path, level: &str) {
    let log_path = paths::logs_dir(config_dir).join(paths::LOG_FILE);
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(level))
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_timer(ApcheckTimer)
                .init();
            let _ = LOG_GUARD.set(guard);
            tracing::info!(path = %log_path.display(), "logging initialized");
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(level))
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_timer(ApcheckTimer)
                .init();
            tracing::warn!(error = %e, path = %log_path.display(), "failed to open log file; using stderr");
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config_dir = paths::config_dir(args.config_dir.as_deref());
    init_logging(&config_dir, &determine_log_level(&args));

    let mode = args.mode();
    tracing::info!(mode = ?mode, version = env!("CARGO_PKG_VERSION"), "apcheck starting");
    let outcome = match Context::load(&args, &config_dir) {
        Ok(ctx) => app::run(&ctx, mode).await,
        Err(e) => Err(e),
    };
    match outcome {
        Ok(()) => {
            tracing::info!("apcheck finished");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "apcheck failed");
            eprintln!("apcheck: {err}");
            ExitCode::FAILURE
        }
    }
}
