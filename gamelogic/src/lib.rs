// In-memory game state, terminal I/O helpers and the game-log sink. No
// broker awareness: the binaries wire these into handlers and the REPL.

pub mod input;
pub mod logs;
pub mod state;

pub use state::{CommandError, GameState, Location, Unit, UnitRank};
