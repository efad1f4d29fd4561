//! Operator command line parsing.

use pacsis_core::KeypadKey;
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  status                              doors, peripheral states and buttons
  open <door> <monitor>               OpenDoor
  close <door> <monitor>              CloseDoor
  rex <door> <rex>                    PushREX
  key <door> <reader> <key>           one keypad key (0-9, *, #)
  pin <door> <reader> <pin>           full PIN sequence
  swipe <door> <reader> <fc> <card>   SwipeCard
  activate <door> <input>             ActivateInput
  deactivate <door> <input>           DeactivateInput
  press <door> <peripheral>           press the button derived for a monitor or input
  connect | disconnect | toggle       controller connection
  alerts                              list alerts
  dismiss <n>                         dismiss alert n
  reload                              re-read the door configuration
  dump                                print the tree as a configuration document
  help
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Status,
    Open { door: String, monitor: String },
    Close { door: String, monitor: String },
    Rex { door: String, rex: String },
    Key {
        door: String,
        reader: String,
        key: KeypadKey,
    },
    Pin {
        door: String,
        reader: String,
        pin: String,
    },
    Swipe {
        door: String,
        reader: String,
        facility_code: u32,
        card_number: u32,
    },
    Activate { door: String, input: String },
    Deactivate { door: String, input: String },
    Press { door: String, peripheral: String },
    Connect,
    Disconnect,
    Toggle,
    Alerts,
    Dismiss(usize),
    Reload,
    Dump,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplError {
    #[error("Unknown command '{0}', try 'help'")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("'{0}' is not a number")]
    InvalidNumber(String),

    #[error(transparent)]
    InvalidKey(#[from] pacsis_core::Error),
}

/// Parse one input line. Blank lines parse to `None`.
pub fn parse(line: &str) -> Result<Option<ReplCommand>, ReplError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&name, args)) = words.split_first() else {
        return Ok(None);
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "status" | "ls" => ReplCommand::Status,
        "open" => {
            let [door, monitor] = expect(args, "open <door> <monitor>")?;
            ReplCommand::Open { door, monitor }
        }
        "close" => {
            let [door, monitor] = expect(args, "close <door> <monitor>")?;
            ReplCommand::Close { door, monitor }
        }
        "rex" => {
            let [door, rex] = expect(args, "rex <door> <rex>")?;
            ReplCommand::Rex { door, rex }
        }
        "key" => {
            let [door, reader, key] = expect(args, "key <door> <reader> <key>")?;
            let mut chars = key.chars();
            let key = match (chars.next(), chars.next()) {
                (Some(c), None) => KeypadKey::try_from(c)?,
                _ => return Err(ReplError::Usage("key <door> <reader> <key>")),
            };
            ReplCommand::Key { door, reader, key }
        }
        "pin" => {
            let [door, reader, pin] = expect(args, "pin <door> <reader> <pin>")?;
            ReplCommand::Pin { door, reader, pin }
        }
        "swipe" => {
            let [door, reader, fc, card] = expect(args, "swipe <door> <reader> <fc> <card>")?;
            ReplCommand::Swipe {
                door,
                reader,
                facility_code: number(&fc)?,
                card_number: number(&card)?,
            }
        }
        "activate" => {
            let [door, input] = expect(args, "activate <door> <input>")?;
            ReplCommand::Activate { door, input }
        }
        "deactivate" => {
            let [door, input] = expect(args, "deactivate <door> <input>")?;
            ReplCommand::Deactivate { door, input }
        }
        "press" => {
            let [door, peripheral] = expect(args, "press <door> <peripheral>")?;
            ReplCommand::Press { door, peripheral }
        }
        "connect" => ReplCommand::Connect,
        "disconnect" => ReplCommand::Disconnect,
        "toggle" => ReplCommand::Toggle,
        "alerts" => ReplCommand::Alerts,
        "dismiss" => {
            let [index] = expect(args, "dismiss <n>")?;
            ReplCommand::Dismiss(number(&index)?)
        }
        "reload" => ReplCommand::Reload,
        "dump" => ReplCommand::Dump,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        other => return Err(ReplError::Unknown(other.to_string())),
    };

    Ok(Some(command))
}

fn expect<const N: usize>(args: &[&str], usage: &'static str) -> Result<[String; N], ReplError> {
    let args: [&str; N] = args.try_into().map_err(|_| ReplError::Usage(usage))?;
    Ok(args.map(str::to_string))
}

fn number<T: std::str::FromStr>(word: &str) -> Result<T, ReplError> {
    word.parse()
        .map_err(|_| ReplError::InvalidNumber(word.to_string()))
}
