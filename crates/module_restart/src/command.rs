//! `region restart ...` console command parsing.
//!
//! Every argument is validated before a command value is produced, so a
//! malformed line never changes scheduler state.

/// Usage line printed for malformed `region restart` commands.
pub const USAGE: &str = "Error: region restart <mode> <message> <delta seconds>+";

/// Help text listing the restart subcommands.
pub const HELP: &[(&str, &str)] = &[
    (
        "region restart bluebox <message> <delta seconds>+",
        "Schedule a region restart, announced as region notifications",
    ),
    (
        "region restart notice <message> <delta seconds>+",
        "Schedule a region restart, announced as general alerts",
    ),
    ("region restart abort [<message>]", "Abort a region restart"),
    (
        "region restart delay <seconds> [<message>]",
        "Push the running restart countdown back",
    ),
    ("region restart status", "Show the restart countdown of each region"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartCommand {
    Schedule {
        message: String,
        alerts: Vec<u64>,
        notice: bool,
    },
    Abort {
        message: String,
    },
    Delay {
        seconds: u64,
        message: String,
    },
    Status,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Error: region restart <mode> <message> <delta seconds>+")]
    Usage,
    #[error("Error: {0} is not a valid number")]
    InvalidNumber(String),
    #[error("Error: unknown restart mode '{0}', expected bluebox, notice, abort, delay or status")]
    UnknownMode(String),
}

impl RestartCommand {
    /// Parses a tokenised console line starting with `region restart`.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self, CommandError> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        let Some(mode) = args.get(2) else {
            return Err(CommandError::Usage);
        };

        match mode.to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort {
                message: args.get(3).map(|s| s.to_string()).unwrap_or_default(),
            }),
            "status" => Ok(Self::Status),
            "delay" => {
                let Some(seconds) = args.get(3) else {
                    return Err(CommandError::Usage);
                };
                Ok(Self::Delay {
                    seconds: parse_seconds(seconds)?,
                    message: args.get(4).map(|s| s.to_string()).unwrap_or_default(),
                })
            }
            "bluebox" | "notice" => {
                if args.len() < 5 {
                    return Err(CommandError::Usage);
                }
                let alerts = args[4..]
                    .iter()
                    .map(|arg| parse_seconds(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Schedule {
                    message: args[3].to_string(),
                    alerts,
                    notice: mode.eq_ignore_ascii_case("notice"),
                })
            }
            _ => Err(CommandError::UnknownMode(mode.to_string())),
        }
    }
}

fn parse_seconds(arg: &str) -> Result<u64, CommandError> {
    arg.parse()
        .map_err(|_| CommandError::InvalidNumber(arg.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_schedule_modes() {
        let command =
            RestartCommand::parse(&["region", "restart", "bluebox", "Restart in {0}", "300", "60", "0"])
                .unwrap();
        assert_eq!(
            command,
            RestartCommand::Schedule {
                message: "Restart in {0}".to_string(),
                alerts: vec![300, 60, 0],
                notice: false,
            }
        );

        let command = RestartCommand::parse(&["region", "restart", "notice", "Bye", "30"]).unwrap();
        assert!(matches!(command, RestartCommand::Schedule { notice: true, .. }));
    }

    #[test]
    fn test_invalid_number_reports_first_bad_argument() {
        let error = RestartCommand::parse(&["region", "restart", "notice", "msg", "60", "soon", "-5"])
            .unwrap_err();
        assert_eq!(error, CommandError::InvalidNumber("soon".to_string()));
        assert_eq!(error.to_string(), "Error: soon is not a valid number");

        let error = RestartCommand::parse(&["region", "restart", "notice", "msg", "-5"]).unwrap_err();
        assert_eq!(error, CommandError::InvalidNumber("-5".to_string()));
    }

    #[test]
    fn test_short_schedule_is_usage_error() {
        assert_eq!(
            RestartCommand::parse(&["region", "restart", "bluebox", "msg"]),
            Err(CommandError::Usage)
        );
        assert_eq!(RestartCommand::parse(&["region", "restart"]), Err(CommandError::Usage));
        assert_eq!(CommandError::Usage.to_string(), USAGE);
    }

    #[test]
    fn test_abort_message_is_optional() {
        assert_eq!(
            RestartCommand::parse(&["region", "restart", "abort"]),
            Ok(RestartCommand::Abort { message: String::new() })
        );
        assert_eq!(
            RestartCommand::parse(&["region", "restart", "abort", "Never mind"]),
            Ok(RestartCommand::Abort { message: "Never mind".to_string() })
        );
    }

    #[test]
    fn test_delay_and_status() {
        assert_eq!(
            RestartCommand::parse(&["region", "restart", "delay", "120"]),
            Ok(RestartCommand::Delay { seconds: 120, message: String::new() })
        );
        assert_eq!(
            RestartCommand::parse(&["region", "restart", "delay"]),
            Err(CommandError::Usage)
        );
        assert_eq!(RestartCommand::parse(&["region", "restart", "status"]), Ok(RestartCommand::Status));
        assert_eq!(
            RestartCommand::parse(&["region", "restart", "later", "x", "1"]),
            Err(CommandError::UnknownMode("later".to_string()))
        );
    }
}
