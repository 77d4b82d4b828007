// Integration tests for converting API snapshots into simulation boards
//
// The search works on board::Board; the game server speaks types::GameState.
// These tests pin down the conversion both ways.

use mcts_snake::board::{Board, GameMode};
use mcts_snake::types::{Coord, GameState};

fn request(ruleset: &str) -> String {
    format!(
        r#"{{
        "game": {{"id": "g1", "ruleset": {{"name": "{}", "version": "v1",
                 "settings": {{"foodSpawnChance": 25, "minimumFood": 2, "hazardDamagePerTurn": 14,
                              "royale": {{"shrinkEveryNTurns": 20}}}}}},
                 "timeout": 500, "source": "league"}},
        "turn": 7,
        "board": {{"height": 11, "width": 11,
                  "food": [{{"x": 5, "y": 5}}, {{"x": 5, "y": 5}}, {{"x": 0, "y": 10}}],
                  "hazards": [{{"x": 0, "y": 0}}],
                  "snakes": [
                    {{"id": "me", "name": "Me", "health": 96,
                      "body": [{{"x": 1, "y": 1}}, {{"x": 1, "y": 2}}, {{"x": 1, "y": 3}}],
                      "head": {{"x": 1, "y": 1}}, "length": 3, "latency": "12", "shout": ""}},
                    {{"id": "them", "name": "Them", "health": 40,
                      "body": [{{"x": 8, "y": 8}}, {{"x": 8, "y": 7}}],
                      "head": {{"x": 8, "y": 8}}, "length": 2, "latency": "20", "shout": ""}}]}},
        "you": {{"id": "me", "name": "Me", "health": 96,
                "body": [{{"x": 1, "y": 1}}, {{"x": 1, "y": 2}}, {{"x": 1, "y": 3}}],
                "head": {{"x": 1, "y": 1}}, "length": 3, "latency": "12", "shout": ""}}
    }}"#,
        ruleset
    )
}

#[test]
fn test_snapshot_converts_into_board() {
    let state: GameState = serde_json::from_str(&request("royale")).unwrap();
    let board = Board::from_game_state(&state);

    assert_eq!((board.width, board.height), (11, 11));
    assert_eq!(board.turn, 7);
    assert_eq!(board.agents.len(), 2);
    assert!(board.agents.iter().all(|a| a.is_alive()));
    assert_eq!(board.agent("me").unwrap().name, "Me");
    assert_eq!(board.agent("them").unwrap().health, 40);

    // Duplicate food collapses into one cell
    assert_eq!(board.food.len(), 2);
    assert!(board.is_hazard(&Coord { x: 0, y: 0 }));

    assert_eq!(board.settings.game_mode, GameMode::Royale);
    assert_eq!(board.settings.food_spawn_chance, 25);
    assert_eq!(board.settings.minimum_food, 2);
    assert_eq!(board.settings.hazard_damage_per_turn, 14);
    assert_eq!(board.settings.shrink_every_n_turns, 20);
}

#[test]
fn test_board_converts_back_to_wire() {
    let state: GameState = serde_json::from_str(&request("standard")).unwrap();
    let board = Board::from_game_state(&state);
    let wire = board.to_wire();

    assert_eq!(wire.width, state.board.width);
    assert_eq!(wire.height, state.board.height);
    assert_eq!(wire.snakes.len(), 2);
    for (converted, original) in wire.snakes.iter().zip(state.board.snakes.iter()) {
        assert_eq!(converted.id, original.id);
        assert_eq!(converted.body, original.body);
        assert_eq!(converted.head, original.head);
        assert_eq!(converted.length, original.length);
        assert_eq!(converted.health, original.health);
    }

    // Converting the wire board again yields the same simulation board
    let again = Board::from_wire(&state.game, state.turn, &wire);
    assert_eq!(again, board);
}

#[test]
fn test_unknown_ruleset_plays_as_standard() {
    let state: GameState = serde_json::from_str(&request("wrapped")).unwrap();
    let board = Board::from_game_state(&state);
    assert_eq!(board.settings.game_mode, GameMode::Standard);
}
