//! # Region Simulator - Main Entry Point
//!
//! Hosts one or more regions, each with its own event bus and frame loop,
//! and attaches the configured region modules to them: the restart
//! scheduler and the cloud and wind simulations. This entry point handles
//! CLI parsing, configuration loading and application lifecycle management.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration
//! simulator
//!
//! # Specify custom configuration
//! simulator --config grid.toml
//!
//! # Only start one region and keep restart markers in /var/run/sim
//! simulator --region "Default Region" --marker-path /var/run/sim
//!
//! # JSON logging for production
//! simulator --json-logs --no-console
//! ```
//!
//! ## Configuration
//!
//! The simulator loads configuration from a TOML file (default: `config.toml`).
//! If the file doesn't exist, a default configuration will be created.
//!
//! ## Console
//!
//! Commands typed on stdin are run by the [`console::CommandConsole`], e.g.
//! `region restart notice "Restarting in {0}" 300 60 0`.
//!
//! ## Signal Handling
//!
//! The simulator shuts down gracefully on SIGINT (Ctrl+C) and SIGTERM.

use tracing::error;

pub mod app;
pub mod cli;
pub mod config;
pub mod console;
pub mod dialog;
pub mod logging;
pub mod modules;
pub mod scene;
pub mod signals;

use app::Application;
use cli::CliArgs;
use config::AppConfig;

/// Runs the simulator.
///
/// # Exit Codes
///
/// * **0**: Successful execution and shutdown
/// * **1**: Error during startup, configuration, or runtime
///
/// Called from `main` under `#[tokio::main]`, so it must not start a
/// runtime itself.
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Load configuration to get logging settings
    let mut config = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default();
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }

    if let Err(e) = logging::setup_logging(&config.logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {e:?}");
            std::process::exit(1);
        }
    }

    Ok(())
}

pub use config::{LoggingSettings, RegionSettings, SimulatorSettings, StartupSettings};
