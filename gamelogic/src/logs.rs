use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use peril_routing::GameLog;

// Where the server aggregates game logs, relative to its working dir.
pub const GAME_LOG_FILE: &str = "game.log";

// Append one aggregated game log line to the shared log file.
pub fn write_log(log: &GameLog) -> std::io::Result<()> {
    write_log_to(Path::new(GAME_LOG_FILE), log)
}

// Target path is a parameter so tests can write somewhere disposable.
pub fn write_log_to(path: &Path, log: &GameLog) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", format_log_line(log))
}

pub fn format_log_line(log: &GameLog) -> String {
    format!(
        "{}: {}: {}",
        log.current_time.to_rfc3339(),
        log.username,
        log.message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample(message: &str) -> GameLog {
        GameLog {
            current_time: Utc.with_ymd_and_hms(2026, 8, 24, 9, 30, 0).unwrap(),
            message: message.to_string(),
            username: "alice".to_string(),
        }
    }

    #[test]
    fn when_log_line_is_formatted_then_it_reads_time_user_message() {
        let line = format_log_line(&sample("unit spawned"));
        assert_eq!(line, "2026-08-24T09:30:00+00:00: alice: unit spawned");
    }

    #[test]
    fn when_logs_are_written_then_lines_accumulate_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("game.log");

        write_log_to(&path, &sample("first")).expect("write");
        write_log_to(&path, &sample("second")).expect("write");

        let contents = std::fs::read_to_string(&path).expect("read back");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("alice: first"));
        assert!(lines[1].ends_with("alice: second"));
    }
}
