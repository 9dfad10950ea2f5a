use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

// Line-oriented async stdin reader for the REPLs. The consumption loop
// suspends on `next_line`, so a subscription handler can print in between
// without fighting a blocked reader thread.
pub struct InputReader {
    lines: Lines<BufReader<Stdin>>,
}

impl InputReader {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    // Prompt and read one line, split on whitespace. None on end of input.
    pub async fn read_words(&mut self) -> std::io::Result<Option<Vec<String>>> {
        prompt()?;
        match self.lines.next_line().await? {
            Some(line) => Ok(Some(
                line.split_whitespace().map(str::to_string).collect(),
            )),
            None => Ok(None),
        }
    }

    // Greet the player and keep prompting until a one-word username
    // arrives. None when stdin closes first.
    pub async fn client_welcome(&mut self) -> std::io::Result<Option<String>> {
        println!("Welcome to the Peril client!");
        println!("Please enter your username:");
        loop {
            let Some(words) = self.read_words().await? else {
                return Ok(None);
            };
            match words.as_slice() {
                [username] => return Ok(Some(username.clone())),
                _ => println!("A username must be a single word."),
            }
        }
    }
}

impl Default for InputReader {
    fn default() -> Self {
        Self::new()
    }
}

// Print the REPL prompt. Also used by handlers that write over it.
pub fn prompt() -> std::io::Result<()> {
    print!("> ");
    std::io::stdout().flush()
}

pub fn print_client_help() {
    println!("Commands:");
    println!("  spawn <location> <rank>    add a unit to the board");
    println!("  move <location> <unit_id>  move one of your units");
    println!("  status                     show the current game state");
    println!("  spam <n>                   publish n test log messages");
    println!("  help                       show this help");
    println!("  quit                       leave the game");
}

pub fn print_server_help() {
    println!("Commands:");
    println!("  pause   pause the game for every player");
    println!("  resume  resume the game for every player");
    println!("  help    show this help");
    println!("  quit    stop the server");
}

pub fn print_quit() {
    println!("Goodbye, commander.");
}
