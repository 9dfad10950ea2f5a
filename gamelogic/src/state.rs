use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use peril_routing::PlayingState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Americas,
    Europe,
    Africa,
    Asia,
    Antarctica,
    Australia,
}

impl Location {
    pub const ALL: [Location; 6] = [
        Location::Americas,
        Location::Europe,
        Location::Africa,
        Location::Asia,
        Location::Antarctica,
        Location::Australia,
    ];

    fn name(self) -> &'static str {
        match self {
            Location::Americas => "americas",
            Location::Europe => "europe",
            Location::Africa => "africa",
            Location::Asia => "asia",
            Location::Antarctica => "antarctica",
            Location::Australia => "australia",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Location {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Location::ALL
            .into_iter()
            .find(|location| location.name() == s)
            .ok_or_else(|| CommandError::UnknownLocation {
                name: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitRank {
    Infantry,
    Cavalry,
    Artillery,
}

impl UnitRank {
    pub const ALL: [UnitRank; 3] = [UnitRank::Infantry, UnitRank::Cavalry, UnitRank::Artillery];

    fn name(self) -> &'static str {
        match self {
            UnitRank::Infantry => "infantry",
            UnitRank::Cavalry => "cavalry",
            UnitRank::Artillery => "artillery",
        }
    }
}

impl fmt::Display for UnitRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UnitRank {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UnitRank::ALL
            .into_iter()
            .find(|rank| rank.name() == s)
            .ok_or_else(|| CommandError::UnknownRank {
                name: s.to_string(),
            })
    }
}

// One unit on the board, owned by the local player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub id: u64,
    pub rank: UnitRank,
    pub location: Location,
}

// Errors for the player-facing spawn/move commands.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandError {
    UnknownLocation { name: String },
    UnknownRank { name: String },
    MalformedUnitId { raw: String },
    UnknownUnit { id: u64 },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownLocation { name } => {
                write!(f, "unknown location '{name}'")
            }
            CommandError::UnknownRank { name } => write!(f, "unknown unit rank '{name}'"),
            CommandError::MalformedUnitId { raw } => {
                write!(f, "'{raw}' is not a unit id")
            }
            CommandError::UnknownUnit { id } => write!(f, "no unit with id {id}"),
        }
    }
}

impl std::error::Error for CommandError {}

// Local player's view of the game: pause state plus the unit roster.
// Plain in-memory mutation; the binaries decide how it is shared.
#[derive(Debug)]
pub struct GameState {
    username: String,
    paused: bool,
    next_unit_id: u64,
    units: BTreeMap<u64, Unit>,
}

impl GameState {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            paused: false,
            next_unit_id: 1,
            units: BTreeMap::new(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // Record a broadcast pause/resume control message.
    pub fn handle_pause(&mut self, state: &PlayingState) {
        self.paused = state.is_paused;
    }

    // Validate the names, assign the next unit id and place the unit.
    pub fn command_spawn(&mut self, location: &str, rank: &str) -> Result<&Unit, CommandError> {
        let location: Location = location.parse()?;
        let rank: UnitRank = rank.parse()?;

        let id = self.next_unit_id;
        self.next_unit_id += 1;
        self.units.insert(id, Unit { id, rank, location });
        Ok(&self.units[&id])
    }

    // Re-locate an owned unit, returning the moved unit.
    pub fn command_move(&mut self, location: &str, unit_id: &str) -> Result<Unit, CommandError> {
        let destination: Location = location.parse()?;
        let id: u64 = unit_id
            .parse()
            .map_err(|_| CommandError::MalformedUnitId {
                raw: unit_id.to_string(),
            })?;

        let unit = self
            .units
            .get_mut(&id)
            .ok_or(CommandError::UnknownUnit { id })?;
        unit.location = destination;
        Ok(unit.clone())
    }

    // Status report for the REPL to print; ordered by unit id.
    pub fn status_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!(
                "Game is {}",
                if self.paused { "paused" } else { "running" }
            ),
            format!("Player: {}", self.username),
            format!("Units: {}", self.units.len()),
        ];
        for unit in self.units.values() {
            lines.push(format!("  #{}: {} in {}", unit.id, unit.rank, unit.location));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_location_names_round_trip_then_parse_matches_display() {
        for location in Location::ALL {
            let parsed: Location = location.to_string().parse().expect("parse");
            assert_eq!(parsed, location);
        }
    }

    #[test]
    fn when_rank_is_unknown_then_spawn_reports_it_and_stores_nothing() {
        let mut game = GameState::new("alice");
        let error = game.command_spawn("europe", "dragoon").expect_err("must fail");
        assert_eq!(
            error,
            CommandError::UnknownRank {
                name: "dragoon".to_string()
            }
        );
        assert_eq!(game.status_lines()[2], "Units: 0");
    }

    #[test]
    fn when_units_are_spawned_then_ids_are_sequential() {
        let mut game = GameState::new("alice");
        let first = game.command_spawn("europe", "infantry").expect("spawn").id;
        let second = game.command_spawn("asia", "cavalry").expect("spawn").id;
        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[test]
    fn when_unit_is_moved_then_new_location_is_recorded() {
        let mut game = GameState::new("alice");
        let id = game.command_spawn("europe", "artillery").expect("spawn").id;
        let moved = game.command_move("africa", &id.to_string()).expect("move");
        assert_eq!(moved.location, Location::Africa);
        assert!(
            game.status_lines()
                .iter()
                .any(|line| line.contains("africa"))
        );
    }

    #[test]
    fn when_unit_id_is_malformed_then_move_fails_without_side_effects() {
        let mut game = GameState::new("alice");
        game.command_spawn("europe", "infantry").expect("spawn");
        let error = game.command_move("africa", "one").expect_err("must fail");
        assert_eq!(
            error,
            CommandError::MalformedUnitId {
                raw: "one".to_string()
            }
        );
    }

    #[test]
    fn when_unit_is_unknown_then_move_fails() {
        let mut game = GameState::new("alice");
        let error = game.command_move("africa", "7").expect_err("must fail");
        assert_eq!(error, CommandError::UnknownUnit { id: 7 });
    }

    #[test]
    fn when_pause_broadcast_arrives_then_state_follows_it() {
        let mut game = GameState::new("alice");
        game.handle_pause(&PlayingState { is_paused: true });
        assert!(game.is_paused());
        game.handle_pause(&PlayingState { is_paused: false });
        assert!(!game.is_paused());
    }
}
