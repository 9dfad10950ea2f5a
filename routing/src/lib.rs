// Naming contract shared by every peril process: exchange names, routing
// keys, queue-name conventions and the wire message types. Pure data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Direct exchange for per-player control messages (exact key match).
pub const EXCHANGE_PERIL_DIRECT: &str = "peril_direct";
// Topic exchange for broadcast telemetry (pattern-matched keys).
pub const EXCHANGE_PERIL_TOPIC: &str = "peril_topic";

pub const PAUSE_KEY: &str = "pause";
pub const GAME_LOG_SLUG: &str = "game_logs";
// Binding pattern for the server's shared durable log queue.
pub const GAME_LOG_BINDING_KEY: &str = "game_logs.*";

// Per-player transient control queue, e.g. "pause.alice".
pub fn pause_queue_name(username: &str) -> String {
    format!("{PAUSE_KEY}.{username}")
}

// Per-player telemetry routing key, e.g. "game_logs.alice".
pub fn game_log_routing_key(username: &str) -> String {
    format!("{GAME_LOG_SLUG}.{username}")
}

// Pause/resume control message broadcast by the server.
// Field names are PascalCase on the wire: {"IsPaused":true}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayingState {
    pub is_paused: bool,
}

// One telemetry line emitted by a client and aggregated by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GameLog {
    pub current_time: DateTime<Utc>,
    pub message: String,
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn when_playing_state_is_serialized_then_wire_shape_is_pascal_case() {
        let state = PlayingState { is_paused: true };
        let wire = serde_json::to_string(&state).expect("serialize");
        assert_eq!(wire, r#"{"IsPaused":true}"#);
    }

    #[test]
    fn when_playing_state_round_trips_then_value_is_unchanged() {
        let state = PlayingState { is_paused: false };
        let wire = serde_json::to_vec(&state).expect("serialize");
        let back: PlayingState = serde_json::from_slice(&wire).expect("deserialize");
        assert_eq!(back, state);
    }

    #[test]
    fn when_game_log_round_trips_then_value_is_unchanged() {
        let log = GameLog {
            current_time: Utc.with_ymd_and_hms(2026, 8, 24, 12, 0, 0).unwrap(),
            message: "unit spawned".to_string(),
            username: "alice".to_string(),
        };
        let wire = serde_json::to_vec(&log).expect("serialize");
        let back: GameLog = serde_json::from_slice(&wire).expect("deserialize");
        assert_eq!(back, log);
    }

    #[test]
    fn when_queue_and_key_names_are_built_then_prefix_conventions_hold() {
        assert_eq!(pause_queue_name("alice"), "pause.alice");
        assert_eq!(game_log_routing_key("alice"), "game_logs.alice");
    }
}
