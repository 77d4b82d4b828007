// Rule engine
//
// Pure functions that advance a board snapshot. The search resolves one
// agent at a time (`apply_action`), feeding and food spawning happen once
// the last agent of the turn rotation has moved. `apply_joint_moves`
// resolves a whole tick with every agent moving simultaneously.

use log::debug;
use rand::Rng;

use crate::board::{Agent, Board, EliminationCause, GameMode, Point, Status};
use crate::error::SimulationError;
use crate::movegen::FALLBACK_MOVE;
use crate::types::{Coord, Direction};

/// Applies one agent's move to a copy of `board` and resolves its consequences.
///
/// # Arguments
/// * `board` - Snapshot to advance; left untouched
/// * `agent_id` - Agent whose action is applied
/// * `mv` - Direction the agent moves in (ignored if it is already eliminated)
/// * `last_in_rotation` - Whether this agent closes the current tick
/// * `rng` - Source for food spawning and hazard expansion
///
/// # Returns
/// * `Result<Board, SimulationError>` - The next snapshot or the reason the input was malformed
pub fn apply_action<R: Rng + ?Sized>(
    board: &Board,
    agent_id: &str,
    mv: Direction,
    last_in_rotation: bool,
    rng: &mut R,
) -> Result<Board, SimulationError> {
    let mut next = board.clone();
    step(&mut next, agent_id, mv, last_in_rotation, rng)?;
    Ok(next)
}

/// In-place variant of [`apply_action`], used by rollouts on their private copy
pub fn step<R: Rng + ?Sized>(
    board: &mut Board,
    agent_id: &str,
    mv: Direction,
    last_in_rotation: bool,
    rng: &mut R,
) -> Result<(), SimulationError> {
    let idx = board
        .agent_index(agent_id)
        .ok_or_else(|| SimulationError::UnknownAgent(agent_id.to_string()))?;

    if board.agents[idx].is_empty() {
        return Err(SimulationError::InvalidState(format!(
            "snake '{}' has an empty body",
            agent_id
        )));
    }

    if board.agents[idx].is_alive() {
        move_agent(&mut board.agents[idx], mv);
        reduce_health(board, idx);
    }

    if last_in_rotation {
        end_of_tick(board, rng);
    }

    eliminate_agents(board)?;

    if last_in_rotation {
        board.turn += 1;
    }
    Ok(())
}

/// Resolves a full tick where every living agent moves at once.
/// Living agents without an entry in `moves` use the fallback move.
pub fn apply_joint_moves<R: Rng + ?Sized>(
    board: &Board,
    moves: &[(String, Direction)],
    rng: &mut R,
) -> Result<Board, SimulationError> {
    for (id, _) in moves {
        if board.agent(id).is_none() {
            return Err(SimulationError::UnknownAgent(id.clone()));
        }
    }

    let mut next = board.clone();
    for idx in 0..next.agents.len() {
        if !next.agents[idx].is_alive() {
            continue;
        }
        if next.agents[idx].is_empty() {
            return Err(SimulationError::InvalidState(format!(
                "snake '{}' has an empty body",
                next.agents[idx].id
            )));
        }
        let mv = moves
            .iter()
            .find(|(id, _)| *id == next.agents[idx].id)
            .map(|(_, mv)| *mv)
            .unwrap_or(FALLBACK_MOVE);
        move_agent(&mut next.agents[idx], mv);
    }
    for idx in 0..next.agents.len() {
        if next.agents[idx].is_alive() {
            reduce_health(&mut next, idx);
        }
    }

    end_of_tick(&mut next, rng);
    eliminate_agents(&mut next)?;
    next.turn += 1;
    Ok(next)
}

/// Whether the game has ended on this board
pub fn is_game_over(board: &Board) -> bool {
    let alive = board.alive_count();
    match board.settings.game_mode {
        GameMode::Solo => alive == 0,
        GameMode::Standard | GameMode::Royale => alive <= 1,
    }
}

/// Prepends the new head and drops the tail, length stays the same
fn move_agent(agent: &mut Agent, mv: Direction) {
    let Some(head) = agent.head() else {
        return;
    };
    agent.body.insert(0, mv.apply(&head));
    agent.body.pop();
}

fn reduce_health(board: &mut Board, idx: usize) {
    let base = board.settings.health_loss_per_turn;
    let on_hazard = board.agents[idx]
        .head()
        .map(|h| board.is_hazard(&h))
        .unwrap_or(false);
    let damage = if on_hazard {
        base + board.settings.hazard_damage_per_turn
    } else {
        base
    };
    let agent = &mut board.agents[idx];
    agent.health = (agent.health - damage).max(0);
}

/// Hazard expansion, feeding and food spawning; runs once per tick
fn end_of_tick<R: Rng + ?Sized>(board: &mut Board, rng: &mut R) {
    if board.settings.game_mode == GameMode::Royale {
        shrink_safe_area(board, rng);
    }
    feed_agents(board);
    spawn_food(board, rng);
}

fn feed_agents(board: &mut Board) {
    let max_health = board.settings.max_health;
    let mut remaining = Vec::with_capacity(board.food.len());

    for food in std::mem::take(&mut board.food) {
        let eater = board
            .agents
            .iter_mut()
            .find(|a| a.is_alive() && a.head() == Some(food));
        match eater {
            Some(agent) => {
                agent.health = max_health;
                if let Some(tail) = agent.body.last().copied() {
                    agent.body.push(tail);
                }
            }
            None => remaining.push(food),
        }
    }

    board.food = remaining;
}

fn spawn_food<R: Rng + ?Sized>(board: &mut Board, rng: &mut R) {
    let minimum = board.settings.minimum_food.max(0) as usize;
    let to_spawn = if board.food.len() < minimum {
        minimum - board.food.len()
    } else if board.settings.food_spawn_chance > 0
        && rng.random_range(0..100) < board.settings.food_spawn_chance
    {
        1
    } else {
        0
    };
    if to_spawn == 0 {
        return;
    }

    let mut free = board.free_cells();
    for _ in 0..to_spawn {
        if free.is_empty() {
            break;
        }
        let pick = rng.random_range(0..free.len());
        board.food.push(free.swap_remove(pick));
    }
}

/// Royale: every `shrink_every_n_turns` ticks one side of the safe area becomes hazard
fn shrink_safe_area<R: Rng + ?Sized>(board: &mut Board, rng: &mut R) {
    let interval = board.settings.shrink_every_n_turns;
    if interval <= 0 || (board.turn + 1) % interval as u32 != 0 {
        return;
    }

    let Some((min_x, max_x, min_y, max_y)) = safe_bounds(board) else {
        return;
    };

    let cells: Vec<Point> = match rng.random_range(0..4) {
        0 => (min_y..=max_y).map(|y| Coord { x: min_x, y }).collect(),
        1 => (min_y..=max_y).map(|y| Coord { x: max_x, y }).collect(),
        2 => (min_x..=max_x).map(|x| Coord { x, y: min_y }).collect(),
        _ => (min_x..=max_x).map(|x| Coord { x, y: max_y }).collect(),
    };
    for cell in cells {
        if !board.is_hazard(&cell) {
            board.hazards.push(cell);
        }
    }
    debug!(
        "Royale shrink on turn {}: {} hazard cells",
        board.turn + 1,
        board.hazards.len()
    );
}

/// Bounding box of the cells that are not hazards
fn safe_bounds(board: &Board) -> Option<(i32, i32, i32, i32)> {
    let mut bounds: Option<(i32, i32, i32, i32)> = None;
    for y in 0..board.height {
        for x in 0..board.width {
            let p = Coord { x, y };
            if board.is_hazard(&p) {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, x, y, y),
                Some((x0, x1, y0, y1)) => (x0.min(x), x1.max(x), y0.min(y), y1.max(y)),
            });
        }
    }
    bounds
}

/// Decides eliminations for every living agent against the current snapshot,
/// then applies them together.
fn eliminate_agents(board: &mut Board) -> Result<(), SimulationError> {
    let turn = board.turn + 1;

    // Wall and starvation first; these agents are ignored for collisions.
    // Food still on the board means the tick is open: an agent standing on it
    // eats before starvation is checked again at the end of the tick.
    let mut first_pass: Vec<(usize, EliminationCause)> = Vec::new();
    for (idx, agent) in board.agents.iter().enumerate() {
        if !agent.is_alive() {
            continue;
        }
        let Some(head) = agent.head() else {
            return Err(SimulationError::InvalidState(format!(
                "snake '{}' has an empty body",
                agent.id
            )));
        };
        if !board.in_bounds(&head) {
            first_pass.push((idx, EliminationCause::Wall));
        } else if agent.health <= 0 && !board.food.contains(&head) {
            first_pass.push((idx, EliminationCause::Starvation));
        }
    }
    for (idx, cause) in first_pass {
        board.agents[idx].status = Status::Eliminated {
            cause,
            turn,
            by: None,
        };
    }

    let mut collisions: Vec<(usize, EliminationCause, Option<String>)> = Vec::new();
    for (idx, agent) in board.agents.iter().enumerate() {
        if !agent.is_alive() {
            continue;
        }
        let Some(head) = agent.head() else {
            continue;
        };

        if agent.body[1..].contains(&head) {
            collisions.push((idx, EliminationCause::SelfCollision, None));
            continue;
        }

        let body_hit = board
            .agents
            .iter()
            .enumerate()
            .filter(|(other_idx, other)| *other_idx != idx && other.is_alive())
            .find(|(_, other)| other.body.iter().skip(1).any(|p| *p == head));
        if let Some((_, other)) = body_hit {
            collisions.push((idx, EliminationCause::Collision, Some(other.id.clone())));
            continue;
        }

        let head_hit = board
            .agents
            .iter()
            .enumerate()
            .filter(|(other_idx, other)| *other_idx != idx && other.is_alive())
            .find(|(_, other)| other.head() == Some(head) && agent.len() <= other.len());
        if let Some((_, other)) = head_hit {
            collisions.push((idx, EliminationCause::HeadToHead, Some(other.id.clone())));
        }
    }
    for (idx, cause, by) in collisions {
        board.agents[idx].status = Status::Eliminated { cause, turn, by };
    }

    Ok(())
}
