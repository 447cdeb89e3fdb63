use super::commands::{Cli, OutputFormat};
use crate::config::{DaemonConfig, LoggingConfig};
use pulse_types::{PulseError, PulseResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

const GREEN: &str = "\x1b[38;5;46m";
const RED: &str = "\x1b[38;5;196m";
const YELLOW: &str = "\x1b[38;5;226m";
const GREY: &str = "\x1b[38;5;245m";
const RESET: &str = "\x1b[0m";

/// `RUST_LOG` wins over everything; otherwise `-q`, then `-v`, then the
/// configured level.
pub fn log_directive(cli: &Cli, logging: &LoggingConfig) -> String {
    if cli.quiet {
        return "warn".to_string();
    }
    match cli.verbose {
        0 => logging.level.to_string(),
        1 => "info,pulse_daemon=debug".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

pub fn init_logging(cli: &Cli, logging: &LoggingConfig) -> PulseResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_directive(cli, logging)));

    let log_file = cli.log_file.as_ref().or(logging.file.as_ref());

    let output: Box<dyn Layer<Registry> + Send + Sync> = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| PulseError::Config(format!("Failed to open log file {:?}: {}", path, e)))?;
            let writer = std::sync::Mutex::new(file);
            if logging.json {
                Box::new(fmt::layer().json().with_writer(writer))
            } else {
                Box::new(fmt::layer().with_writer(writer).with_ansi(false))
            }
        }
        None if logging.json => Box::new(fmt::layer().json().with_writer(std::io::stderr)),
        None => Box::new(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(cli.verbose >= 2),
        ),
    };

    tracing_subscriber::registry()
        .with(output)
        .with(env_filter)
        .try_init()
        .map_err(|e| PulseError::Internal(format!("Failed to initialize logging: {}", e)))
}

pub fn default_data_dir() -> PathBuf {
    DaemonConfig::default().data_dir
}

/// Data dir and config path, with the config defaulting to
/// `<data_dir>/config.toml`.
pub fn resolve_paths(cli: &Cli) -> (PathBuf, PathBuf) {
    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| data_dir.join("config.toml"));
    (data_dir, config_path)
}

/// File, then environment, then the `--data-dir` flag. Not validated.
pub fn load_config(config_path: &Path, data_dir: Option<&Path>) -> PulseResult<DaemonConfig> {
    let mut config = DaemonConfig::load_file(config_path)?;
    config.apply_overrides(|key| std::env::var(key).ok());
    if let Some(dir) = data_dir {
        config.data_dir = dir.to_path_buf();
    }
    Ok(config)
}

/// Logging settings needed before a subscriber exists: the file's
/// `[logging]` section plus the logging variables only. The remaining
/// overrides are applied, and their warnings emitted, by the command's own
/// [`load_config`] once logging is up.
pub fn bootstrap_logging<F>(config_path: &Path, lookup: F) -> LoggingConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut logging = DaemonConfig::load_file(config_path)
        .map(|config| config.logging)
        .unwrap_or_default();
    logging.apply_overrides(lookup);
    logging
}

pub fn print_json<T: Serialize>(value: &T) -> PulseResult<()> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| PulseError::Serialization(e.to_string()))?;
    println!("{}", out);
    Ok(())
}

pub fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce()) -> PulseResult<()> {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Text => {
            text();
            Ok(())
        }
    }
}

pub fn print_ok(msg: impl std::fmt::Display) {
    println!("{}[+]{} {}", GREEN, RESET, msg);
}

pub fn print_fail(msg: impl std::fmt::Display) {
    println!("{}[-]{} {}", RED, RESET, msg);
}

pub fn print_warn(msg: impl std::fmt::Display) {
    println!("{}[!]{} {}", YELLOW, RESET, msg);
}

pub fn print_header(title: &str) {
    println!("{}{}{}", GREEN, title, RESET);
    println!("{}{}{}", GREY, "═".repeat(50), RESET);
}

pub fn dim(text: impl std::fmt::Display) -> String {
    format!("{}{}{}", GREY, text, RESET)
}
