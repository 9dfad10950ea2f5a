use std::fmt;

// One parsed server REPL command.
#[derive(Debug, PartialEq, Eq)]
pub enum ServerCommand {
    Pause,
    Resume,
    Help,
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

pub fn parse(words: &[String]) -> Result<ServerCommand, ParseError> {
    let Some((first, rest)) = words.split_first() else {
        return Err(ParseError::Empty);
    };

    let command = match first.as_str() {
        "pause" => ServerCommand::Pause,
        "resume" => ServerCommand::Resume,
        "help" => ServerCommand::Help,
        "quit" => ServerCommand::Quit,
        _ => {
            return Err(ParseError::Unknown {
                command: first.clone(),
            });
        }
    };

    if !rest.is_empty() {
        return Err(ParseError::Usage {
            usage: match command {
                ServerCommand::Pause => "pause",
                ServerCommand::Resume => "resume",
                ServerCommand::Help => "help",
                ServerCommand::Quit => "quit",
            },
        });
    }
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn when_line_is_well_formed_then_command_is_parsed() {
        assert_eq!(parse(&words("pause")), Ok(ServerCommand::Pause));
        assert_eq!(parse(&words("resume")), Ok(ServerCommand::Resume));
        assert_eq!(parse(&words("help")), Ok(ServerCommand::Help));
        assert_eq!(parse(&words("quit")), Ok(ServerCommand::Quit));
    }

    #[test]
    fn when_command_takes_arguments_then_error_carries_the_usage_string() {
        assert_eq!(
            parse(&words("pause now")),
            Err(ParseError::Usage { usage: "pause" })
        );
    }

    #[test]
    fn when_command_is_unknown_then_error_names_it() {
        assert_eq!(
            parse(&words("stop")),
            Err(ParseError::Unknown {
                command: "stop".to_string()
            })
        );
    }
}
