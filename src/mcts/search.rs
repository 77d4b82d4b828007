// Decision cycle
//
// select -> expand -> rollout -> backpropagate, repeated for the configured
// number of iterations, then the most visited root child is played. A stop
// flag raised by the caller abandons the search between iterations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::config::{DecisionCriterion, SearchConfig};
use crate::error::SearchError;
use crate::mcts::rollout::{rollout, Outcome, RolloutPolicy};
use crate::mcts::tree::{NodeId, SearchNode, SearchTree, ROOT};
use crate::movegen::{Strictness, FALLBACK_MOVE};
use crate::rotation::TurnRotation;
use crate::types::Direction;

/// Visit statistics of one root child
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildStats {
    #[serde(rename = "move")]
    pub action: Direction,
    pub sims: u32,
    pub wins: f64,
    pub win_rate: f64,
}

/// What a decision cycle produced
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub chosen: Direction,
    pub children: Vec<ChildStats>,
    pub iterations: u32,
    pub tree_size: usize,
    pub elapsed_ms: u64,
}

/// Picks a move for `deciding_id` using an RNG seeded from the config, or from
/// the OS when no seed is set.
pub fn choose_move(
    board: &Board,
    deciding_id: &str,
    config: &SearchConfig,
    strictness: Strictness,
) -> Result<SearchReport, SearchError> {
    choose_move_with_stop(board, deciding_id, config, strictness, &AtomicBool::new(false))
}

/// Same as [`choose_move`], giving up with [`SearchError::Cancelled`] once `stop` is set
pub fn choose_move_with_stop(
    board: &Board,
    deciding_id: &str,
    config: &SearchConfig,
    strictness: Strictness,
    stop: &AtomicBool,
) -> Result<SearchReport, SearchError> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    choose_move_with_rng(board, deciding_id, config, strictness, &mut rng, stop)
}

/// Same as [`choose_move_with_stop`] with a caller supplied RNG
pub fn choose_move_with_rng<R: Rng + ?Sized>(
    board: &Board,
    deciding_id: &str,
    config: &SearchConfig,
    strictness: Strictness,
    rng: &mut R,
    stop: &AtomicBool,
) -> Result<SearchReport, SearchError> {
    let start = Instant::now();
    let tree = build_tree(board, deciding_id, config, strictness, rng, stop)?;
    let chosen = decide(&tree, config.decision_criterion).unwrap_or(FALLBACK_MOVE);

    let children: Vec<ChildStats> = tree
        .root()
        .children
        .iter()
        .map(|&id| {
            let child = tree.node(id);
            ChildStats {
                action: child.action.unwrap_or(FALLBACK_MOVE),
                sims: child.sims,
                wins: child.wins,
                win_rate: child.win_rate(),
            }
        })
        .collect();
    for stats in &children {
        debug!(
            "  {:>5}: {:.1} wins / {} sims ({:.3})",
            stats.action, stats.wins, stats.sims, stats.win_rate
        );
    }

    let elapsed_ms = start.elapsed().as_millis() as u64;
    info!(
        "Turn {}: {} chose {} after {} iterations, {} nodes, {}ms",
        board.turn,
        deciding_id,
        chosen,
        config.iterations,
        tree.len(),
        elapsed_ms
    );

    Ok(SearchReport {
        chosen,
        children,
        iterations: config.iterations,
        tree_size: tree.len(),
        elapsed_ms,
    })
}

/// Runs the full iteration budget and hands back the tree.
///
/// # Arguments
/// * `board` - Snapshot to decide on
/// * `deciding_id` - Agent the move is for; must be alive on `board`
/// * `config` - Search parameters, validated before any work starts
/// * `strictness` - Own-body rule for move generation
/// * `rng` - Source for every random choice of the search
/// * `stop` - Checked before every iteration; once set the tree is discarded
///
/// # Returns
/// * `Result<SearchTree, SearchError>` - The searched tree
pub fn build_tree<R: Rng + ?Sized>(
    board: &Board,
    deciding_id: &str,
    config: &SearchConfig,
    strictness: Strictness,
    rng: &mut R,
    stop: &AtomicBool,
) -> Result<SearchTree, SearchError> {
    config.validate()?;
    let rotation = TurnRotation::new(board, deciding_id)?;
    let policy = RolloutPolicy::from_config(config, strictness).with_baseline(board, deciding_id);

    let mut tree = SearchTree::new(board.clone(), rotation);
    tree.expand(ROOT, strictness, rng)?;

    for iteration in 0..config.iterations {
        if stop.load(Ordering::Relaxed) {
            return Err(SearchError::Cancelled(iteration));
        }
        let leaf = tree.select_leaf(config.exploration_constant);
        let children = tree.expand(leaf, strictness, rng)?;
        let target = if children.is_empty() {
            leaf
        } else {
            children[rng.random_range(0..children.len())]
        };

        for outcome in run_rollouts(&tree, target, config.rollouts_per_leaf, &policy, rng)? {
            tree.backpropagate(target, &outcome);
        }
    }

    Ok(tree)
}

/// One rollout inline, or several in parallel each with its own seeded RNG
fn run_rollouts<R: Rng + ?Sized>(
    tree: &SearchTree,
    target: NodeId,
    count: u32,
    policy: &RolloutPolicy,
    rng: &mut R,
) -> Result<Vec<Outcome>, SearchError> {
    let node = tree.node(target);
    if count == 1 {
        let outcome = rollout(&node.board, &node.player, tree.rotation(), policy, rng)?;
        return Ok(vec![outcome]);
    }

    let seeds: Vec<u64> = (0..count).map(|_| rng.random()).collect();
    let outcomes = seeds
        .into_par_iter()
        .map(|seed| {
            let mut local = StdRng::seed_from_u64(seed);
            rollout(&node.board, &node.player, tree.rotation(), policy, &mut local)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(outcomes)
}

/// Final move among the root's children.
/// Visits: most simulations, ties to the better win rate, then the first child.
/// WinRate: best win rate, ties to more simulations, then the first child.
pub fn decide(tree: &SearchTree, criterion: DecisionCriterion) -> Option<Direction> {
    let mut best: Option<(&SearchNode, (f64, f64))> = None;
    for &id in &tree.root().children {
        let child = tree.node(id);
        let key = match criterion {
            DecisionCriterion::Visits => (child.sims as f64, child.win_rate()),
            DecisionCriterion::WinRate => (child.win_rate(), child.sims as f64),
        };
        let better = match &best {
            None => true,
            Some((_, best_key)) => key > *best_key,
        };
        if better {
            best = Some((child, key));
        }
    }
    best.and_then(|(node, _)| node.action)
}
