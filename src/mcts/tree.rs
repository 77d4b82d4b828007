// Search tree
//
// Nodes live in a single arena and point at each other by index, so the
// parent link needed by backpropagation is just a NodeId. A node's `player`
// is the agent whose action produced it; the root is owned by the agent
// acting right before the deciding agent.

use rand::Rng;

use crate::board::Board;
use crate::error::SimulationError;
use crate::mcts::rollout::Outcome;
use crate::movegen::{moves_or_fallback, Strictness};
use crate::rotation::TurnRotation;
use crate::rules;
use crate::types::Direction;

/// Index of a node in the tree arena
pub type NodeId = usize;

/// The root always sits at index 0
pub const ROOT: NodeId = 0;

#[derive(Debug, Clone)]
pub struct SearchNode {
    pub board: Board,
    /// Move that produced this node, `None` for the root
    pub action: Option<Direction>,
    pub player: String,
    pub sims: u32,
    /// Sum of rollout rewards for `player`; a win counts 1.0
    pub wins: f64,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl SearchNode {
    pub fn win_rate(&self) -> f64 {
        if self.sims == 0 {
            0.0
        } else {
            self.wins / self.sims as f64
        }
    }
}

/// Upper confidence bound for a child.
/// Unvisited children score +inf so every child is tried once before any is revisited.
pub fn uct_score(wins: f64, sims: u32, parent_sims: u32, exploration_constant: f64) -> f64 {
    if sims == 0 {
        return f64::INFINITY;
    }
    let sims = sims as f64;
    let exploitation = wins / sims;
    let exploration = exploration_constant * (((parent_sims as f64) + 1.0).ln() / sims).sqrt();
    exploitation + exploration
}

#[derive(Debug)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
    rotation: TurnRotation,
}

impl SearchTree {
    /// Creates a tree holding only the root for `board`
    pub fn new(board: Board, rotation: TurnRotation) -> Self {
        let player = rotation.prev(rotation.deciding()).to_string();
        let root = SearchNode {
            board,
            action: None,
            player,
            sims: 0,
            wins: 0.0,
            parent: None,
            children: Vec::new(),
        };
        SearchTree {
            nodes: vec![root],
            rotation,
        }
    }

    pub fn root(&self) -> &SearchNode {
        &self.nodes[ROOT]
    }

    pub fn node(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[SearchNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn rotation(&self) -> &TurnRotation {
        &self.rotation
    }

    /// Walks down from the root, always following the child with the highest
    /// UCT score (first one wins ties), until it reaches a node without children.
    pub fn select_leaf(&self, exploration_constant: f64) -> NodeId {
        let mut current = ROOT;
        loop {
            let node = &self.nodes[current];
            if node.children.is_empty() {
                return current;
            }

            let mut best = node.children[0];
            let mut best_score = f64::NEG_INFINITY;
            for &child_id in &node.children {
                let child = &self.nodes[child_id];
                let score = uct_score(child.wins, child.sims, node.sims, exploration_constant);
                if score > best_score {
                    best_score = score;
                    best = child_id;
                }
            }
            current = best;
        }
    }

    /// Adds one child per move of the next agent in the rotation.
    ///
    /// # Arguments
    /// * `id` - Node to expand; a node that already has children is left alone
    /// * `strictness` - Own-body rule for move generation
    /// * `rng` - Randomness for food spawns on tick boundaries
    ///
    /// # Returns
    /// * `Result<&[NodeId], SimulationError>` - The node's children, empty for terminal boards
    pub fn expand<R: Rng + ?Sized>(
        &mut self,
        id: NodeId,
        strictness: Strictness,
        rng: &mut R,
    ) -> Result<&[NodeId], SimulationError> {
        if !self.nodes[id].children.is_empty() {
            return Ok(&self.nodes[id].children);
        }
        // The root is always expanded: the deciding agent needs a move even on a finished board
        if id != ROOT && rules::is_game_over(&self.nodes[id].board) {
            return Ok(&self.nodes[id].children);
        }

        let next = self.rotation.next(&self.nodes[id].player).to_string();
        let last = self.rotation.is_last(&next);
        let moves = moves_or_fallback(&self.nodes[id].board, &next, strictness);

        let mut boards = Vec::with_capacity(moves.len());
        for mv in moves {
            let board = rules::apply_action(&self.nodes[id].board, &next, mv, last, rng)?;
            boards.push((mv, board));
        }

        for (mv, board) in boards {
            let child_id = self.nodes.len();
            self.nodes.push(SearchNode {
                board,
                action: Some(mv),
                player: next.clone(),
                sims: 0,
                wins: 0.0,
                parent: Some(id),
                children: Vec::new(),
            });
            self.nodes[id].children.push(child_id);
        }

        Ok(&self.nodes[id].children)
    }

    /// Records one rollout outcome on `from` and every ancestor up to the root
    pub fn backpropagate(&mut self, from: NodeId, outcome: &Outcome) {
        let mut current = Some(from);
        while let Some(id) = current {
            let node = &mut self.nodes[id];
            node.sims += 1;
            node.wins += outcome.reward_for(&node.player);
            current = node.parent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Agent, Settings};
    use crate::types::Coord;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn two_snake_tree() -> SearchTree {
        let mut board = Board::new(11, 11, Settings::default());
        board.agents.push(Agent::new(
            "me",
            vec![Coord { x: 2, y: 2 }, Coord { x: 2, y: 1 }, Coord { x: 2, y: 0 }],
            90,
        ));
        board.agents.push(Agent::new(
            "them",
            vec![Coord { x: 8, y: 8 }, Coord { x: 8, y: 9 }, Coord { x: 8, y: 10 }],
            90,
        ));
        let rotation = TurnRotation::new(&board, "me").unwrap();
        SearchTree::new(board, rotation)
    }

    #[test]
    fn test_unvisited_child_beats_visited() {
        assert_eq!(uct_score(0.0, 0, 10, 1.41), f64::INFINITY);
        assert!(uct_score(0.0, 0, 10, 1.41) > uct_score(10.0, 10, 10, 1.41));
    }

    #[test]
    fn test_uct_prefers_better_win_rate_at_equal_visits() {
        assert!(uct_score(8.0, 10, 20, 1.41) > uct_score(2.0, 10, 20, 1.41));
        // Without exploration the score is the plain win rate
        assert_eq!(uct_score(3.0, 4, 100, 0.0), 0.75);
    }

    #[test]
    fn test_root_belongs_to_agent_before_deciding() {
        let tree = two_snake_tree();
        assert_eq!(tree.root().player, "them");
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_expand_creates_one_child_per_legal_move_for_next_agent() {
        let mut tree = two_snake_tree();
        let mut rng = StdRng::seed_from_u64(1);
        let children = tree.expand(ROOT, Strictness::Lenient, &mut rng).unwrap().to_vec();
        assert_eq!(children.len(), 3);
        for id in children {
            let child = tree.node(id);
            assert_eq!(child.player, "me");
            assert_eq!(child.parent, Some(ROOT));
            assert!(child.action.is_some());
            // me moved, them has not: the tick is still open
            assert_eq!(child.board.turn, 0);
        }

        // Expanding again is a no-op
        let again = tree.expand(ROOT, Strictness::Lenient, &mut rng).unwrap().len();
        assert_eq!(again, 3);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_second_level_closes_the_tick() {
        let mut tree = two_snake_tree();
        let mut rng = StdRng::seed_from_u64(1);
        let first = tree.expand(ROOT, Strictness::Lenient, &mut rng).unwrap()[0];
        let grandchildren = tree.expand(first, Strictness::Lenient, &mut rng).unwrap().to_vec();
        assert!(!grandchildren.is_empty());
        for id in grandchildren {
            assert_eq!(tree.node(id).player, "them");
            assert_eq!(tree.node(id).board.turn, 1);
        }
    }

    #[test]
    fn test_select_leaf_visits_unvisited_children_in_order() {
        let mut tree = two_snake_tree();
        let mut rng = StdRng::seed_from_u64(1);
        let children = tree.expand(ROOT, Strictness::Lenient, &mut rng).unwrap().to_vec();
        assert_eq!(tree.select_leaf(1.41), children[0]);

        tree.backpropagate(children[0], &Outcome::Tie);
        assert_eq!(tree.select_leaf(1.41), children[1]);
    }

    #[test]
    fn test_backpropagate_credits_matching_player_only() {
        let mut tree = two_snake_tree();
        let mut rng = StdRng::seed_from_u64(1);
        let child = tree.expand(ROOT, Strictness::Lenient, &mut rng).unwrap()[0];
        let grandchild = tree.expand(child, Strictness::Lenient, &mut rng).unwrap()[0];

        tree.backpropagate(grandchild, &Outcome::Winner("me".to_string()));
        tree.backpropagate(grandchild, &Outcome::Winner("them".to_string()));
        tree.backpropagate(grandchild, &Outcome::Tie);

        assert_eq!(tree.node(grandchild).sims, 3);
        assert_eq!(tree.node(grandchild).wins, 1.0); // owned by "them"
        assert_eq!(tree.node(child).sims, 3);
        assert_eq!(tree.node(child).wins, 1.0); // owned by "me"
        assert_eq!(tree.root().sims, 3);
        assert_eq!(tree.root().wins, 1.0);

        for node in tree.nodes() {
            assert!(node.wins <= node.sims as f64);
        }
    }

    #[test]
    fn test_backpropagate_adds_partial_rewards() {
        let mut tree = two_snake_tree();
        let mut rng = StdRng::seed_from_u64(1);
        let child = tree.expand(ROOT, Strictness::Lenient, &mut rng).unwrap()[0];

        let scored = Outcome::Scored {
            agent: "me".to_string(),
            reward: 0.75,
        };
        tree.backpropagate(child, &scored);
        tree.backpropagate(child, &Outcome::Winner("me".to_string()));

        assert_eq!(tree.node(child).sims, 2);
        assert_eq!(tree.node(child).wins, 1.75);
        assert_eq!(tree.node(child).win_rate(), 0.875);
        // Root belongs to "them"
        assert_eq!(tree.root().wins, 0.0);
    }

    #[test]
    fn test_terminal_node_is_not_expanded() {
        let mut tree = two_snake_tree();
        let mut rng = StdRng::seed_from_u64(1);
        let child = tree.expand(ROOT, Strictness::Lenient, &mut rng).unwrap()[0];
        // Knock out the opponent on the child's board
        tree.nodes[child].board.agents[1].status = crate::board::Status::Eliminated {
            cause: crate::board::EliminationCause::Wall,
            turn: 1,
            by: None,
        };
        assert!(tree.expand(child, Strictness::Lenient, &mut rng).unwrap().is_empty());
    }
}
