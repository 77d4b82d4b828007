// Battlesnake bot
//
// Owns the static configuration and answers the four API calls. Move
// requests are translated into a simulation board and handed to the MCTS
// on a blocking thread; the HTTP side only waits for the report or the
// response deadline, whichever comes first. A search that misses the deadline
// is told to stop so it does not hold a blocking thread into the next turn.

use log::{error, info, warn};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::board;
use crate::config::Config;
use crate::debug_logger::DebugLogger;
use crate::mcts;
use crate::movegen::{legal_moves, FALLBACK_MOVE};
use crate::types::{Battlesnake, Board, Direction, Game};

/// Battlesnake Bot with OOP-style API
/// Takes static configuration dependencies and exposes methods corresponding to API endpoints
pub struct Bot {
    config: Config,
    debug_logger: DebugLogger,
}

impl Bot {
    /// Creates a new Bot instance with the given configuration and no decision log
    ///
    /// # Arguments
    /// * `config` - Static configuration that does not change during the bot's lifetime
    pub fn new(config: Config) -> Self {
        Self::with_debug_logger(config, DebugLogger::disabled())
    }

    /// Creates a Bot that records every decision through `debug_logger`
    pub fn with_debug_logger(config: Config, debug_logger: DebugLogger) -> Self {
        Bot {
            config,
            debug_logger,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns bot metadata and appearance
    /// Corresponds to GET / endpoint
    pub fn info(&self) -> Value {
        info!("INFO");

        json!({
            "apiversion": "1",
            "author": "mcts-snake",
            "color": "#3E338F",
            "head": "default",
            "tail": "default",
        })
    }

    /// Called when a game starts
    /// Corresponds to POST /start endpoint
    pub fn start(&self, game: &Game, _turn: &i32, board: &Board, _you: &Battlesnake) {
        info!(
            "GAME START {} ({}, {}x{}, {} snakes)",
            game.id,
            game.ruleset.name,
            board.width,
            board.height,
            board.snakes.len()
        );
    }

    /// Called when a game ends
    /// Corresponds to POST /end endpoint
    pub fn end(&self, game: &Game, turn: &i32, board: &Board, you: &Battlesnake) {
        let survived = board.snakes.iter().any(|s| s.id == you.id);
        info!(
            "GAME OVER {} after {} turns ({})",
            game.id,
            turn,
            if survived { "survived" } else { "eliminated" }
        );
    }

    /// Builds the simulation board for a request, with the configured health rules applied
    pub fn simulation_board(config: &Config, game: &Game, turn: i32, board: &Board) -> board::Board {
        let mut sim = board::Board::from_wire(game, turn, board);
        sim.settings.max_health = config.game_rules.health_on_food;
        sim.settings.health_loss_per_turn = config.game_rules.health_loss_per_turn;
        sim
    }

    /// Computes and returns the next move using Monte Carlo Tree Search
    /// Corresponds to POST /move endpoint
    ///
    /// The search runs on tokio's blocking pool. If it fails or misses the
    /// effective time budget a safe in-bounds move is returned instead.
    ///
    /// # Arguments
    /// * `game` - Current game metadata
    /// * `turn` - Current turn number
    /// * `board` - Current board state
    /// * `you` - Your snake's current state
    ///
    /// # Returns
    /// * `Value` - JSON response containing the chosen move direction
    pub async fn get_move(&self, game: &Game, turn: &i32, board: &Board, you: &Battlesnake) -> Value {
        let start_time = Instant::now();
        info!("Turn {}: Computing move", turn);

        let sim = Self::simulation_board(&self.config, game, *turn, board);
        let fallback = Self::safe_default(&sim, you, &self.config);

        let search_board = sim.clone();
        let you_id = you.id.clone();
        let search_config = self.config.search.clone();
        let strictness = self.config.move_generation.strictness;

        let stop = Arc::new(AtomicBool::new(false));
        let search_stop = Arc::clone(&stop);
        let handle = tokio::task::spawn_blocking(move || {
            mcts::choose_move_with_stop(
                &search_board,
                &you_id,
                &search_config,
                strictness,
                &search_stop,
            )
        });

        let budget = Duration::from_millis(self.config.timing.effective_budget_ms());
        let chosen_move = match tokio::time::timeout(budget, handle).await {
            Ok(Ok(Ok(report))) => {
                self.debug_logger
                    .log_move(*turn, game.clone(), board.clone(), you.id.clone(), &report);
                report.chosen
            }
            Ok(Ok(Err(e))) => {
                error!("Turn {}: search failed: {}", turn, e);
                fallback
            }
            Ok(Err(e)) => {
                error!("Turn {}: search task panicked: {}", turn, e);
                fallback
            }
            Err(_) => {
                stop.store(true, Ordering::Relaxed);
                warn!(
                    "Turn {}: search exceeded {}ms budget, playing {}",
                    turn,
                    budget.as_millis(),
                    fallback
                );
                fallback
            }
        };

        info!(
            "Turn {}: Chose {} (time: {}ms)",
            turn,
            chosen_move.as_str(),
            start_time.elapsed().as_millis()
        );

        json!({ "move": chosen_move.as_str() })
    }

    /// Move used when the search produces nothing: the first legal move,
    /// else any move that stays on the board, else the fallback move
    fn safe_default(sim: &board::Board, you: &Battlesnake, config: &Config) -> Direction {
        if let Some(&mv) = legal_moves(sim, &you.id, config.move_generation.strictness).first() {
            return mv;
        }
        let head = you.body.first().copied().unwrap_or(you.head);
        Direction::all()
            .into_iter()
            .find(|dir| sim.in_bounds(&dir.apply(&head)))
            .unwrap_or(FALLBACK_MOVE)
    }
}
