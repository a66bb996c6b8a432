//! Line parser for console commands.
use thiserror::Error;
use waystone_runtime::{Position, WorldId};

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Join {
        name: String,
        spawn: Option<Position>,
    },
    Leave(String),
    Move {
        name: String,
        to: Position,
    },
    SetHome(String),
    Home(String),
    /// `from` asks to travel to `to`.
    Tpa {
        from: String,
        to: String,
    },
    /// `from` asks `to` to travel over.
    TpaHere {
        from: String,
        to: String,
    },
    Accept(String),
    Deny(String),
    /// Abort the actor's pending warmup.
    Cancel(String),
    /// Withdraw every request the actor sent.
    TpaCancel(String),
    Toggle(String),
    Status,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("empty line")]
    Empty,

    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("'{0}' is not a number")]
    Number(String),
}

impl std::str::FromStr for ConsoleCommand {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&verb, args)) = words.split_first() else {
            return Err(ParseError::Empty);
        };

        let command = match (verb.to_ascii_lowercase().as_str(), args) {
            ("join", [name]) => ConsoleCommand::Join {
                name: name.to_string(),
                spawn: None,
            },
            ("join", [name, rest @ ..]) => ConsoleCommand::Join {
                name: name.to_string(),
                spawn: Some(parse_position(rest, "join <name> [world x y z]")?),
            },
            ("join", _) => return Err(ParseError::Usage("join <name> [world x y z]")),
            ("leave", [name]) => ConsoleCommand::Leave(name.to_string()),
            ("move", [name, rest @ ..]) => ConsoleCommand::Move {
                name: name.to_string(),
                to: parse_position(rest, "move <name> <world> <x> <y> <z>")?,
            },
            ("sethome", [name]) => ConsoleCommand::SetHome(name.to_string()),
            ("home", [name]) => ConsoleCommand::Home(name.to_string()),
            ("tpa", [from, to]) => ConsoleCommand::Tpa {
                from: from.to_string(),
                to: to.to_string(),
            },
            ("tpahere", [from, to]) => ConsoleCommand::TpaHere {
                from: from.to_string(),
                to: to.to_string(),
            },
            ("accept" | "tpaccept", [name]) => ConsoleCommand::Accept(name.to_string()),
            ("deny" | "tpdeny", [name]) => ConsoleCommand::Deny(name.to_string()),
            ("cancel", [name]) => ConsoleCommand::Cancel(name.to_string()),
            ("tpacancel", [name]) => ConsoleCommand::TpaCancel(name.to_string()),
            ("toggle" | "tptoggle", [name]) => ConsoleCommand::Toggle(name.to_string()),
            ("status", []) => ConsoleCommand::Status,
            ("help", _) => ConsoleCommand::Help,
            ("quit" | "exit", []) => ConsoleCommand::Quit,
            (
                "leave" | "move" | "sethome" | "home" | "tpa" | "tpahere" | "accept" | "tpaccept"
                | "deny" | "tpdeny" | "cancel" | "tpacancel" | "toggle" | "tptoggle" | "status"
                | "quit" | "exit",
                _,
            ) => return Err(ParseError::Usage(usage(verb))),
            (other, _) => return Err(ParseError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn parse_position(args: &[&str], usage: &'static str) -> Result<Position, ParseError> {
    let [world, x, y, z] = args else {
        return Err(ParseError::Usage(usage));
    };
    Ok(Position::new(
        WorldId::new(*world),
        parse_coord(x)?,
        parse_coord(y)?,
        parse_coord(z)?,
    ))
}

fn parse_coord(raw: &str) -> Result<f64, ParseError> {
    raw.parse()
        .map_err(|_| ParseError::Number(raw.to_string()))
}

fn usage(verb: &str) -> &'static str {
    match verb.to_ascii_lowercase().as_str() {
        "leave" => "leave <name>",
        "move" => "move <name> <world> <x> <y> <z>",
        "sethome" => "sethome <name>",
        "home" => "home <name>",
        "tpa" => "tpa <from> <to>",
        "tpahere" => "tpahere <from> <to>",
        "accept" | "tpaccept" => "accept <name>",
        "deny" | "tpdeny" => "deny <name>",
        "cancel" => "cancel <name>",
        "tpacancel" => "tpacancel <name>",
        "toggle" | "tptoggle" => "toggle <name>",
        _ => "status | quit",
    }
}

pub const HELP: &str = "\
commands:
  join <name> [world x y z]      connect an actor
  leave <name>                   disconnect an actor
  move <name> <world> <x> <y> <z>
  sethome <name>                 remember the current position
  home <name>                    warm up, then teleport home
  tpa <from> <to>                ask to teleport to another actor
  tpahere <from> <to>            ask another actor to come over
  accept <name> | deny <name>    answer the inbound request
  cancel <name>                  abort a pending warmup
  tpacancel <name>               withdraw sent requests
  toggle <name>                  switch incoming requests on/off
  status                         counters as JSON
  quit";
