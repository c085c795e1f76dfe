//! Command-line vocabulary.
//!
//! [`Command`] describes every action the binary can perform; [`parse_args`]
//! turns the raw argument list into one.  Anything that is not a verb is
//! taken as a switch target and resolved later against the catalog, so
//! `gdswitch DP-2`, `gdswitch dp2` and `gdswitch triple` all parse the same
//! way.

use crate::profile::{Mode, ModeParseError};

/// Every action the binary can perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// No arguments: print usage and the current environment.
    Usage,
    /// `help`, `-h`, `--help`.
    Help,
    /// Print the current gdctl configuration verbatim.
    Show,
    /// Show connected monitors and which targets would work.
    Available,
    /// List every monitor and layout in the table.
    List,
    /// List the modes gdctl advertises, optionally for one monitor.
    Modes(Option<String>),
    /// Drive one monitor at an explicit mode.
    SetMode { monitor: String, mode: Mode },
    /// Switch to a monitor or layout.
    Switch(String),
}

/// Error from parsing the command line.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error(transparent)]
    Mode(#[from] ModeParseError),
    #[error("unexpected argument {0:?}")]
    Unexpected(String),
}

const SET_USAGE: &str = "gdswitch set <MONITOR> <WIDTHxHEIGHT@REFRESH>";
const MODES_USAGE: &str = "gdswitch modes [MONITOR]";

/// Parse the arguments after the program name.
pub fn parse_args(args: &[&str]) -> Result<Command, ParseError> {
    let Some((&first, rest)) = args.split_first() else {
        return Ok(Command::Usage);
    };

    let cmd = match first {
        "help" | "-h" | "--help" => Command::Help,
        "show" => Command::Show,
        "available" => Command::Available,
        "list" => Command::List,
        "modes" => {
            if rest.len() > 1 {
                return Err(ParseError::Usage(MODES_USAGE));
            }
            return Ok(Command::Modes(rest.first().map(|s| s.to_string())));
        }
        "set" => {
            let [monitor, mode] = rest else {
                return Err(ParseError::Usage(SET_USAGE));
            };
            return Ok(Command::SetMode {
                monitor: monitor.to_string(),
                mode: mode.parse()?,
            });
        }
        target => Command::Switch(target.to_string()),
    };

    match rest.first() {
        Some(extra) => Err(ParseError::Unexpected(extra.to_string())),
        None => Ok(cmd),
    }
}
