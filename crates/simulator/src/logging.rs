//! Logging system setup and configuration.
//!
//! Initializes the tracing-based logging system with human-readable or JSON
//! output, and optionally mirrors everything to a log file.

use crate::config::LoggingSettings;
use std::fs::{File, OpenOptions};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the logging system with the specified configuration.
///
/// # Arguments
///
/// * `config` - Logging configuration from the config file
/// * `json_format` - Whether to force JSON output format (CLI override)
///
/// # Features
///
/// * **Environment variable support** - Respects `RUST_LOG` if set
/// * **Flexible formatting** - Human-readable or JSON output
/// * **Log file** - `logging.file_path` receives a plain-text copy
/// * **Thread information** - Includes thread IDs and names for debugging
pub fn setup_logging(
    config: &LoggingSettings,
    json_format: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = config.level.as_str();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));
    let log_file = open_log_file(config.file_path.as_deref())?;

    let registry = tracing_subscriber::registry().with(filter);

    if json_format || config.json_format {
        let file_layer = log_file.map(|file| {
            fmt::layer()
                .json()
                .with_writer(Mutex::new(file))
                .with_thread_ids(true)
                .with_thread_names(true)
        });
        registry
            .with(fmt::layer()
                .json()
                .with_file(false)
                .with_line_number(false)
                .with_thread_ids(true)
                .with_thread_names(true)
            )
            .with(file_layer)
            .try_init()?;
    } else {
        let file_layer = log_file.map(|file| {
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_thread_ids(true)
                .with_thread_names(true)
        });
        registry
            .with(fmt::layer()
                .with_ansi(true)
                .with_file(false)
                .with_line_number(false)
                .with_thread_ids(true)
                .with_thread_names(true)
            )
            .with(file_layer)
            .try_init()?;
    }

    info!("🔧 Logging initialized with level: {}", log_level);
    if let Some(path) = &config.file_path {
        info!("📝 Writing log file: {}", path);
    }
    Ok(())
}

fn open_log_file(path: Option<&str>) -> std::io::Result<Option<File>> {
    match path {
        Some(path) if !path.trim().is_empty() => OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map(Some),
        _ => Ok(None),
    }
}

/// Displays the startup banner using proper logging.
pub fn display_banner() {
    let version = option_env!("CARGO_PKG_VERSION").unwrap_or("UNK");
    info!("╔══════════════════════════════════════════╗");
    info!("║          🏝️  REGION SIMULATOR 🏝️           ║");
    info!("║                  v{:<8}               ║", version);
    info!("║                                          ║");
    info!("║  🔁 Scheduled Region Restarts            ║");
    info!("║  ☁️  Cloud Cover Simulation               ║");
    info!("║  🌬️  Pluggable Wind Models                ║");
    info!("║  🧩 Explicit Module Registry             ║");
    info!("║                                          ║");
    info!("╚══════════════════════════════════════════╝");
}
