// Random playouts
//
// A rollout plays uniformly random legal moves on a private copy of a leaf's
// board until the game is over or the tick cap is reached. The tree is never
// touched from here, which lets several rollouts of the same leaf run in parallel.

use rand::Rng;

use crate::board::{Board, GameMode};
use crate::config::{FoodSpawnPolicy, RolloutResolution, SearchConfig};
use crate::error::SimulationError;
use crate::movegen::{moves_or_fallback, Strictness};
use crate::rotation::TurnRotation;
use crate::rules;
use crate::types::Direction;

/// Result of a finished rollout
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Winner(String),
    /// Nobody or more than one agent left standing
    Tie,
    /// Solo survivor credited with a reward in (0, 1] by how much it grew
    Scored { agent: String, reward: f64 },
}

impl Outcome {
    pub fn is_win_for(&self, agent_id: &str) -> bool {
        matches!(self, Outcome::Winner(id) if id == agent_id)
    }

    /// Reward credited to `agent_id`, from 0 for a loss or tie to 1 for a win
    pub fn reward_for(&self, agent_id: &str) -> f64 {
        match self {
            Outcome::Winner(id) if id == agent_id => 1.0,
            Outcome::Scored { agent, reward } if agent == agent_id => *reward,
            _ => 0.0,
        }
    }

    /// Sole survivor wins, anything else is a tie
    pub fn of(board: &Board) -> Self {
        match board.sole_survivor() {
            Some(id) => Outcome::Winner(id.to_string()),
            None => Outcome::Tie,
        }
    }

    /// Like [`Outcome::of`], except a solo survivor is scored by its growth over
    /// `baseline_length`: surviving alone is worth 0.5, each food eaten closes half
    /// the remaining gap to 1.
    pub fn scored(board: &Board, baseline_length: Option<usize>) -> Self {
        let Some(baseline) = baseline_length else {
            return Outcome::of(board);
        };
        if board.settings.game_mode != GameMode::Solo {
            return Outcome::of(board);
        }
        match board.sole_survivor().and_then(|id| board.agent(id)) {
            Some(agent) => {
                let growth = agent.len().saturating_sub(baseline) as f64;
                Outcome::Scored {
                    agent: agent.id.clone(),
                    reward: 0.5 + 0.5 * growth / (growth + 1.0),
                }
            }
            None => Outcome::Tie,
        }
    }
}

/// Parameters a rollout needs, extracted once per search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RolloutPolicy {
    pub max_turns: u32,
    pub food_spawn: FoodSpawnPolicy,
    pub resolution: RolloutResolution,
    pub strictness: Strictness,
    /// Deciding agent's length at the root; set for solo games only
    pub baseline_length: Option<usize>,
}

impl RolloutPolicy {
    pub fn from_config(search: &SearchConfig, strictness: Strictness) -> Self {
        RolloutPolicy {
            max_turns: search.max_rollout_turns,
            food_spawn: search.rollout_food_spawn,
            resolution: search.rollout_resolution,
            strictness,
            baseline_length: None,
        }
    }

    /// Scores solo rollouts against the deciding agent's current length
    pub fn with_baseline(mut self, root: &Board, deciding_id: &str) -> Self {
        if root.settings.game_mode == GameMode::Solo {
            self.baseline_length = root.agent(deciding_id).map(|a| a.len());
        }
        self
    }
}

/// Plays a random game out from `board`, where `player` made the last move.
///
/// # Arguments
/// * `board` - Leaf board; cloned, never modified
/// * `player` - Agent that owns the leaf
/// * `rotation` - Turn order of the current search
/// * `policy` - Tick cap, food handling and resolution mode
/// * `rng` - Source for move choice and food spawns
///
/// # Returns
/// * `Result<Outcome, SimulationError>` - The winner, a tie, or a solo score
pub fn rollout<R: Rng + ?Sized>(
    board: &Board,
    player: &str,
    rotation: &TurnRotation,
    policy: &RolloutPolicy,
    rng: &mut R,
) -> Result<Outcome, SimulationError> {
    let mut board = board.clone();
    board.settings.food_spawn_chance = policy.food_spawn.apply(board.settings.food_spawn_chance);
    let start_turn = board.turn;
    let within_cap = |b: &Board| b.turn - start_turn < policy.max_turns;

    let mut current = rotation.next(player).to_string();

    match policy.resolution {
        RolloutResolution::Sequential => {
            while !rules::is_game_over(&board) && within_cap(&board) {
                play_one(&mut board, &current, rotation, policy.strictness, rng)?;
                current = rotation.next(&current).to_string();
            }
        }
        RolloutResolution::Simultaneous => {
            // Finish the tick the tree left open before switching to joint ticks
            while current != rotation.deciding() && !rules::is_game_over(&board) {
                play_one(&mut board, &current, rotation, policy.strictness, rng)?;
                current = rotation.next(&current).to_string();
            }
            while !rules::is_game_over(&board) && within_cap(&board) {
                let moves: Vec<(String, Direction)> = rotation
                    .order()
                    .iter()
                    .filter(|id| board.agent(id).is_some_and(|a| a.is_alive()))
                    .map(|id| (id.clone(), random_move(&board, id, policy.strictness, rng)))
                    .collect();
                board = rules::apply_joint_moves(&board, &moves, rng)?;
            }
        }
    }

    Ok(Outcome::scored(&board, policy.baseline_length))
}

fn play_one<R: Rng + ?Sized>(
    board: &mut Board,
    agent_id: &str,
    rotation: &TurnRotation,
    strictness: Strictness,
    rng: &mut R,
) -> Result<(), SimulationError> {
    let mv = random_move(board, agent_id, strictness, rng);
    rules::step(board, agent_id, mv, rotation.is_last(agent_id), rng)
}

fn random_move<R: Rng + ?Sized>(
    board: &Board,
    agent_id: &str,
    strictness: Strictness,
    rng: &mut R,
) -> Direction {
    let moves = moves_or_fallback(board, agent_id, strictness);
    moves[rng.random_range(0..moves.len())]
}
