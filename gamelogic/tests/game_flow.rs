use peril_gamelogic::{CommandError, GameState, Location};
use peril_routing::PlayingState;

// Walk one client session worth of commands through the public API.
#[test]
fn test_full_session_flow() {
    let mut game = GameState::new("alice");
    assert_eq!(game.username(), "alice");
    assert!(!game.is_paused());

    let infantry = game.command_spawn("europe", "infantry").expect("spawn").id;
    let cavalry = game.command_spawn("asia", "cavalry").expect("spawn").id;
    assert_ne!(infantry, cavalry);

    let moved = game
        .command_move("australia", &cavalry.to_string())
        .expect("move");
    assert_eq!(moved.id, cavalry);
    assert_eq!(moved.location, Location::Australia);

    game.handle_pause(&PlayingState { is_paused: true });
    let status = game.status_lines();
    assert_eq!(status[0], "Game is paused");
    assert_eq!(status[1], "Player: alice");
    assert_eq!(status[2], "Units: 2");
    assert!(status.iter().any(|line| line.contains("australia")));
}

#[test]
fn test_commands_reject_bad_input_without_corrupting_state() {
    let mut game = GameState::new("bob");

    assert!(matches!(
        game.command_spawn("atlantis", "infantry"),
        Err(CommandError::UnknownLocation { .. })
    ));
    assert!(matches!(
        game.command_move("europe", "99"),
        Err(CommandError::UnknownUnit { id: 99 })
    ));

    assert_eq!(game.status_lines()[2], "Units: 0");
}
