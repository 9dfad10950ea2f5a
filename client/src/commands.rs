use std::fmt;

// One parsed client REPL command.
#[derive(Debug, PartialEq, Eq)]
pub enum ClientCommand {
    Spawn { location: String, rank: String },
    Move { location: String, unit_id: String },
    Status,
    Help,
    Spam { count: u32 },
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    Unknown { command: String },
    Usage { usage: &'static str },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "Type 'help' for a list of commands."),
            ParseError::Unknown { command } => {
                write!(f, "Unknown command '{command}'. Type 'help' for a list of commands.")
            }
            ParseError::Usage { usage } => write!(f, "Usage: {usage}"),
        }
    }
}

pub fn parse(words: &[String]) -> Result<ClientCommand, ParseError> {
    let Some((first, rest)) = words.split_first() else {
        return Err(ParseError::Empty);
    };

    match first.as_str() {
        "spawn" => match rest {
            [location, rank] => Ok(ClientCommand::Spawn {
                location: location.clone(),
                rank: rank.clone(),
            }),
            _ => Err(ParseError::Usage {
                usage: "spawn <location> <rank>",
            }),
        },
        "move" => match rest {
            [location, unit_id] => Ok(ClientCommand::Move {
                location: location.clone(),
                unit_id: unit_id.clone(),
            }),
            _ => Err(ParseError::Usage {
                usage: "move <location> <unit_id>",
            }),
        },
        "status" if rest.is_empty() => Ok(ClientCommand::Status),
        "help" if rest.is_empty() => Ok(ClientCommand::Help),
        "spam" => match rest {
            [count] => count
                .parse()
                .map(|count| ClientCommand::Spam { count })
                .map_err(|_| ParseError::Usage { usage: "spam <n>" }),
            _ => Err(ParseError::Usage { usage: "spam <n>" }),
        },
        "quit" if rest.is_empty() => Ok(ClientCommand::Quit),
        _ => Err(ParseError::Unknown {
            command: first.clone(),
        }),
    }
}
