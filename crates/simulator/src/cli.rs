//! Command-line interface handling for the region simulator.
//!
//! Options parsed here override the matching settings from the
//! configuration file.

use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    /// Optional override for the restart marker directory
    pub marker_path: Option<PathBuf>,
    /// Only start the named regions (all configured regions when empty)
    pub regions: Vec<String>,
    /// Disable the interactive stdin console
    pub no_console: bool,
}

impl CliArgs {
    /// Parses the process arguments.
    pub fn parse() -> Self {
        Self::from_matches(&build_command().get_matches())
    }

    /// Parses an explicit argument list; the first item is the binary name.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        build_command()
            .try_get_matches_from(args)
            .map(|matches| Self::from_matches(&matches))
    }

    fn from_matches(matches: &clap::ArgMatches) -> Self {
        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("config.toml")),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            marker_path: matches.get_one::<String>("marker-path").map(PathBuf::from),
            regions: matches
                .get_many::<String>("region")
                .map(|names| names.cloned().collect())
                .unwrap_or_default(),
            no_console: matches.get_flag("no-console"),
        }
    }
}

fn build_command() -> Command {
    Command::new("Region Simulator")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Region simulator host with restart scheduling and weather modules")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .help("Output logs in JSON format")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("marker-path")
                .long("marker-path")
                .value_name("DIR")
                .help("Directory for restart marker files (RestartModule.MarkerPath)"),
        )
        .arg(
            Arg::new("region")
                .short('r')
                .long("region")
                .value_name("NAME")
                .help("Only start this region; may be given more than once")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("no-console")
                .long("no-console")
                .help("Do not read console commands from stdin")
                .action(ArgAction::SetTrue),
        )
}
