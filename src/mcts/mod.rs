// Monte Carlo Tree Search
//
// tree: arena of search nodes, UCT selection, expansion, backpropagation
// rollout: random playouts from a leaf to a terminal board or the turn cap
// search: the decision cycle tying the pieces together

pub mod rollout;
pub mod search;
pub mod tree;

pub use rollout::{Outcome, RolloutPolicy};
pub use search::{
    build_tree, choose_move, choose_move_with_rng, choose_move_with_stop, decide, ChildStats,
    SearchReport,
};
pub use tree::{uct_score, NodeId, SearchNode, SearchTree, ROOT};
