//! Console commands, one per line, standing in for chat messages.

use chatpoker::game::{Action, Chips, PlayerId, SessionId};
use std::{fmt, str::FromStr};

pub const USAGE: &str = "\
COMMANDS:
  new [NAME]                           Open a session
  join SESSION PLAYER NAME BUY_IN      Take a seat
  leave SESSION PLAYER                 Cash out and stand up
  start SESSION                        Deal a hand
  act SESSION PLAYER ACTION [TO]       fold | check | call | allin | raise TO
  view SESSION [PLAYER]                Print the table as PLAYER sees it
  abort SESSION                        Cancel the hand and refund everyone
  balance PLAYER                       Wallet balance
  sessions                             List running sessions
  help                                 Print this message
  quit                                 Exit
";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    New { name: Option<String> },
    Join {
        session_id: SessionId,
        player_id: PlayerId,
        name: String,
        buy_in: Chips,
    },
    Leave {
        session_id: SessionId,
        player_id: PlayerId,
    },
    Start { session_id: SessionId },
    Act {
        session_id: SessionId,
        player_id: PlayerId,
        action: Action,
    },
    View {
        session_id: SessionId,
        viewer: Option<PlayerId>,
    },
    Abort { session_id: SessionId },
    Balance { player_id: PlayerId },
    Sessions,
    Help,
    Quit,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    Empty,
    UnknownCommand(String),
    MissingArgument(&'static str),
    InvalidArgument { name: &'static str, value: String },
    UnknownAction(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty command"),
            Self::UnknownCommand(cmd) => write!(f, "unknown command '{cmd}', try 'help'"),
            Self::MissingArgument(name) => write!(f, "missing {name}"),
            Self::InvalidArgument { name, value } => write!(f, "invalid {name} '{value}'"),
            Self::UnknownAction(action) => write!(f, "unknown action '{action}'"),
        }
    }
}

impl std::error::Error for ParseError {}

fn arg<'a, T: FromStr>(
    args: &mut impl Iterator<Item = &'a str>,
    name: &'static str,
) -> Result<T, ParseError> {
    let value = args.next().ok_or(ParseError::MissingArgument(name))?;
    value.parse().map_err(|_| ParseError::InvalidArgument {
        name,
        value: value.to_string(),
    })
}

fn opt_arg<'a, T: FromStr>(
    args: &mut impl Iterator<Item = &'a str>,
    name: &'static str,
) -> Result<Option<T>, ParseError> {
    match args.next() {
        Some(value) => value.parse().map(Some).map_err(|_| ParseError::InvalidArgument {
            name,
            value: value.to_string(),
        }),
        None => Ok(None),
    }
}

fn parse_action<'a>(args: &mut impl Iterator<Item = &'a str>) -> Result<Action, ParseError> {
    let action = args.next().ok_or(ParseError::MissingArgument("action"))?;
    match action.to_lowercase().as_str() {
        "fold" => Ok(Action::Fold),
        "check" => Ok(Action::Check),
        "call" => Ok(Action::Call),
        "allin" | "all-in" => Ok(Action::AllIn),
        "raise" => Ok(Action::Raise(arg(args, "raise amount")?)),
        _ => Err(ParseError::UnknownAction(action.to_string())),
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut args = line.split_whitespace();
        let cmd = args.next().ok_or(ParseError::Empty)?;
        let command = match cmd.to_lowercase().as_str() {
            "new" => {
                let name = args.collect::<Vec<_>>().join(" ");
                Command::New {
                    name: (!name.is_empty()).then_some(name),
                }
            }
            "join" => Command::Join {
                session_id: arg(&mut args, "session id")?,
                player_id: arg(&mut args, "player id")?,
                name: arg(&mut args, "name")?,
                buy_in: arg(&mut args, "buy-in")?,
            },
            "leave" => Command::Leave {
                session_id: arg(&mut args, "session id")?,
                player_id: arg(&mut args, "player id")?,
            },
            "start" => Command::Start {
                session_id: arg(&mut args, "session id")?,
            },
            "act" => Command::Act {
                session_id: arg(&mut args, "session id")?,
                player_id: arg(&mut args, "player id")?,
                action: parse_action(&mut args)?,
            },
            "view" => Command::View {
                session_id: arg(&mut args, "session id")?,
                viewer: opt_arg(&mut args, "player id")?,
            },
            "abort" => Command::Abort {
                session_id: arg(&mut args, "session id")?,
            },
            "balance" => Command::Balance {
                player_id: arg(&mut args, "player id")?,
            },
            "sessions" => Command::Sessions,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => return Err(ParseError::UnknownCommand(cmd.to_string())),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_join() {
        let cmd: Command = "join 1 42 alice 500".parse().unwrap();
        assert_eq!(
            cmd,
            Command::Join {
                session_id: 1,
                player_id: 42,
                name: "alice".to_string(),
                buy_in: 500,
            }
        );
    }

    #[test]
    fn test_parse_actions() {
        let cmd: Command = "act 3 7 raise 120".parse().unwrap();
        assert!(matches!(
            cmd,
            Command::Act {
                action: Action::Raise(120),
                ..
            }
        ));
        let cmd: Command = "ACT 3 7 All-In".parse().unwrap();
        assert!(matches!(
            cmd,
            Command::Act {
                action: Action::AllIn,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_optional_args() {
        assert_eq!(
            "new".parse::<Command>().unwrap(),
            Command::New { name: None }
        );
        assert_eq!(
            "new friday night".parse::<Command>().unwrap(),
            Command::New {
                name: Some("friday night".to_string())
            }
        );
        assert_eq!(
            "view 2".parse::<Command>().unwrap(),
            Command::View {
                session_id: 2,
                viewer: None
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Command>(), Err(ParseError::Empty));
        assert_eq!(
            "shuffle".parse::<Command>(),
            Err(ParseError::UnknownCommand("shuffle".to_string()))
        );
        assert_eq!(
            "act 1 2".parse::<Command>(),
            Err(ParseError::MissingArgument("action"))
        );
        assert_eq!(
            "act 1 2 bet".parse::<Command>(),
            Err(ParseError::UnknownAction("bet".to_string()))
        );
        assert_eq!(
            "join 1 x alice 100".parse::<Command>(),
            Err(ParseError::InvalidArgument {
                name: "player id",
                value: "x".to_string()
            })
        );
        assert_eq!(
            "act 1 2 raise".parse::<Command>(),
            Err(ParseError::MissingArgument("raise amount"))
        );
    }
}
