//! Console and rolling-file sinks, each with its own level.
//!
//! The console honours `RUST_LOG` first, then `-v`, then `logging.console_level`.
//! The file sink writes `<dir>/velo-calendar-<process>.<date>.log` without
//! colours and always at `logging.file_level`.

use crate::config::{LogRotation, LoggingConfig};
use anyhow::{Context, Result};
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

const CRATE_TARGET: &str = "velo_calendar";

pub fn console_directive(verbose: u8, level: &str) -> String {
    match verbose {
        0 => format!("{CRATE_TARGET}={level},warn"),
        1 => format!("{CRATE_TARGET}=debug,info"),
        _ => "trace".to_string(),
    }
}

pub fn file_directive(level: &str) -> String {
    format!("{CRATE_TARGET}={level},warn")
}

fn rotation(rotation: LogRotation) -> Rotation {
    match rotation {
        LogRotation::Minutely => Rotation::MINUTELY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Never => Rotation::NEVER,
    }
}

/// `Ok(None)` when file output is switched off.
pub fn file_appender(cfg: &LoggingConfig, process: &str) -> Result<Option<RollingFileAppender>> {
    if !cfg.file_output {
        return Ok(None);
    }
    std::fs::create_dir_all(&cfg.dir)
        .with_context(|| format!("Could not create log dir {:?}", cfg.dir))?;

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation(cfg.rotation))
        .filename_prefix(format!("velo-calendar-{process}"))
        .filename_suffix("log");
    if cfg.max_files > 0 {
        builder = builder.max_log_files(cfg.max_files);
    }
    let appender = builder
        .build(&cfg.dir)
        .with_context(|| format!("Could not open log file in {:?}", cfg.dir))?;
    Ok(Some(appender))
}

/// Install the global subscriber. Keep the returned guard alive until exit
/// or buffered file lines are lost.
///
/// A file sink that cannot be opened leaves the console sink alone and is
/// reported once logging is up.
pub fn init(cfg: &LoggingConfig, verbose: u8, process: &str) -> Option<WorkerGuard> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_directive(verbose, &cfg.console_level)));
    let console = fmt::layer()
        .compact()
        .with_target(false)
        .with_filter(console_filter);

    let (appender, file_error) = match file_appender(cfg, process) {
        Ok(appender) => (appender, None),
        Err(e) => (None, Some(e)),
    };

    let (file, guard) = match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_filter(EnvFilter::new(file_directive(&cfg.file_level)));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(console).with(file).init();

    if let Some(e) = file_error {
        warn!("File logging disabled: {:#}", e);
    }
    guard
}
