// Move generation
//
// Enumerates the moves that do not immediately lose for one agent. When
// nothing is left, callers fall back to FALLBACK_MOVE so that a living
// agent always has an action to expand.

use serde::Deserialize;

use crate::board::{Board, Point};
use crate::types::Direction;

/// Move played when an agent has no legal move, and for eliminated agents' turns
pub const FALLBACK_MOVE: Direction = Direction::Down;

/// How conservatively an agent's own body is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    /// Own tail is ignored since it moves away this turn
    #[default]
    Lenient,
    /// Every own segment blocks, tail included
    Strict,
}

/// Legal moves for `agent_id`, in Up, Down, Left, Right order.
/// Empty when the agent is unknown or eliminated.
pub fn legal_moves(board: &Board, agent_id: &str, strictness: Strictness) -> Vec<Direction> {
    let Some(agent) = board.agent(agent_id) else {
        return Vec::new();
    };
    if !agent.is_alive() {
        return Vec::new();
    }
    let Some(head) = agent.head() else {
        return Vec::new();
    };
    let neck = if agent.len() > 1 { agent.neck() } else { None };
    let own_body: &[Point] = match strictness {
        Strictness::Strict => &agent.body,
        Strictness::Lenient => &agent.body[..agent.len() - 1],
    };

    Direction::all()
        .into_iter()
        .filter(|dir| {
            let next = dir.apply(&head);

            // Can't reverse onto neck
            if neck == Some(next) {
                return false;
            }

            // Must stay in bounds
            if !board.in_bounds(&next) {
                return false;
            }

            if own_body.contains(&next) {
                return false;
            }

            for other in board.alive_agents() {
                if other.id == agent.id {
                    continue;
                }
                if other.body.contains(&next) {
                    return false;
                }
                // Other head could step onto the same cell and win the head-to-head
                if let Some(other_head) = other.head() {
                    if manhattan_distance(other_head, next) == 1 && agent.len() <= other.len() {
                        return false;
                    }
                }
            }

            true
        })
        .collect()
}

/// Legal moves, or the single fallback move when there are none
pub fn moves_or_fallback(board: &Board, agent_id: &str, strictness: Strictness) -> Vec<Direction> {
    let moves = legal_moves(board, agent_id, strictness);
    if moves.is_empty() {
        vec![FALLBACK_MOVE]
    } else {
        moves
    }
}

/// Calculates Manhattan distance between two coordinates
fn manhattan_distance(a: Point, b: Point) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}
