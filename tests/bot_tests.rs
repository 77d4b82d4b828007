// Integration tests for the Bot API surface
//
// Drives Bot::get_move the way the /move handler does and checks the JSON
// response, including the fallbacks for failed or slow searches.

use mcts_snake::bot::Bot;
use mcts_snake::config::Config;
use mcts_snake::types::{Battlesnake, Board, Coord, Direction, Game, GameState, Ruleset};

fn snake(id: &str, body: Vec<Coord>, health: i32) -> Battlesnake {
    Battlesnake {
        id: id.to_string(),
        name: id.to_string(),
        health,
        head: body[0],
        length: body.len() as i32,
        body,
        latency: "0".to_string(),
        shout: None,
    }
}

fn game(ruleset: &str) -> Game {
    Game {
        id: "test-game".to_string(),
        ruleset: Ruleset {
            name: ruleset.to_string(),
            ..Ruleset::default()
        },
        timeout: 500,
        source: "test".to_string(),
    }
}

fn fast_config() -> Config {
    let mut config = Config::default_hardcoded();
    config.search.iterations = 200;
    config.search.seed = Some(42);
    // Generous budget so slow CI machines don't hit the timeout path
    config.timing.response_time_budget_ms = 5_000;
    config
}

fn parse_move(response: &serde_json::Value) -> Direction {
    response["move"]
        .as_str()
        .expect("response should carry a move")
        .parse()
        .expect("move should be a valid direction")
}

/// Test: the metadata response carries the fields the game server expects
#[test]
fn test_info_response() {
    let bot = Bot::new(Config::default_hardcoded());
    let info = bot.info();
    assert_eq!(info["apiversion"], "1");
    assert_eq!(info["author"], "mcts-snake");
    assert!(info["color"].is_string());
    assert!(info["head"].is_string());
    assert!(info["tail"].is_string());
}

/// Test: a starving solo snake is sent to the food
#[tokio::test]
async fn test_get_move_goes_for_food_when_starving() {
    let bot = Bot::new(fast_config());
    let you = snake("me", vec![Coord { x: 5, y: 5 }, Coord { x: 5, y: 4 }, Coord { x: 5, y: 3 }], 1);
    let board = Board {
        height: 11,
        width: 11,
        food: vec![Coord { x: 5, y: 6 }],
        snakes: vec![you.clone()],
        hazards: vec![],
    };

    let response = bot.get_move(&game("solo"), &10, &board, &you).await;
    assert_eq!(parse_move(&response), Direction::Up);
}

/// Test: a snake against the top wall is never sent out of bounds
#[tokio::test]
async fn test_get_move_stays_in_bounds_at_wall() {
    let bot = Bot::new(fast_config());
    let you = snake(
        "me",
        vec![Coord { x: 5, y: 10 }, Coord { x: 5, y: 9 }, Coord { x: 5, y: 8 }],
        50,
    );
    let other = snake(
        "other",
        vec![Coord { x: 1, y: 1 }, Coord { x: 1, y: 2 }, Coord { x: 1, y: 3 }],
        50,
    );
    let board = Board {
        height: 11,
        width: 11,
        food: vec![],
        snakes: vec![you.clone(), other],
        hazards: vec![],
    };

    let response = bot.get_move(&game("standard"), &3, &board, &you).await;
    let mv = parse_move(&response);
    assert!(
        mv == Direction::Left || mv == Direction::Right,
        "Expected left or right along the wall, got {}",
        mv
    );
}

/// Test: an invalid search config still yields a safe in-bounds move
#[tokio::test]
async fn test_get_move_falls_back_when_search_fails() {
    let mut config = fast_config();
    config.search.iterations = 0;
    let bot = Bot::new(config);
    let you = snake("me", vec![Coord { x: 0, y: 0 }, Coord { x: 1, y: 0 }], 50);
    let board = Board {
        height: 11,
        width: 11,
        food: vec![],
        snakes: vec![you.clone()],
        hazards: vec![],
    };

    let response = bot.get_move(&game("solo"), &0, &board, &you).await;
    assert_eq!(parse_move(&response), Direction::Up, "Up is the only safe move");
}

/// Test: a search that cannot finish in time falls back to a safe move.
/// The abandoned search is stopped, so the runtime can shut down right away.
#[tokio::test]
async fn test_get_move_falls_back_on_timeout() {
    let mut config = fast_config();
    config.search.iterations = 5_000_000;
    config.timing.response_time_budget_ms = 60;
    config.timing.network_overhead_ms = 10;
    let bot = Bot::new(config);
    let you = snake("me", vec![Coord { x: 10, y: 10 }, Coord { x: 9, y: 10 }], 80);
    let other = snake("other", vec![Coord { x: 2, y: 2 }, Coord { x: 2, y: 3 }], 80);
    let board = Board {
        height: 11,
        width: 11,
        food: vec![],
        snakes: vec![you.clone(), other],
        hazards: vec![],
    };

    let response = bot.get_move(&game("standard"), &0, &board, &you).await;
    assert_eq!(parse_move(&response), Direction::Down, "Down is the only safe move");
}

/// Test: full request bodies as sent by the game server deserialize
#[test]
fn test_move_request_deserializes() {
    let body = r#"{
        "game": {"id": "g1", "ruleset": {"name": "standard", "version": "v1.2.3",
                 "settings": {"foodSpawnChance": 15, "minimumFood": 1, "hazardDamagePerTurn": 0}},
                 "timeout": 500, "source": "league"},
        "turn": 4,
        "board": {"height": 11, "width": 11, "food": [{"x": 5, "y": 5}], "hazards": [],
                  "snakes": [{"id": "me", "name": "me", "health": 96,
                              "body": [{"x": 1, "y": 1}, {"x": 1, "y": 2}, {"x": 1, "y": 3}],
                              "head": {"x": 1, "y": 1}, "length": 3, "latency": "12", "shout": ""}]},
        "you": {"id": "me", "name": "me", "health": 96,
                "body": [{"x": 1, "y": 1}, {"x": 1, "y": 2}, {"x": 1, "y": 3}],
                "head": {"x": 1, "y": 1}, "length": 3, "latency": "12", "shout": ""}
    }"#;
    let state: GameState = serde_json::from_str(body).unwrap();
    assert_eq!(state.turn, 4);
    assert_eq!(state.game.ruleset.settings.food_spawn_chance, 15);
    assert_eq!(state.you.body.len(), 3);
}
