// Turn rotation
//
// Fixed cyclic order over the agents alive when the decision cycle starts,
// deciding agent first. The table is built once and never shrinks: an agent
// eliminated mid-search keeps its slot and its turns become no-ops.

use std::collections::HashMap;

use crate::board::Board;
use crate::error::SearchError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRotation {
    order: Vec<String>,
    slots: HashMap<String, usize>,
}

impl TurnRotation {
    /// Builds the rotation for `deciding_id`, followed by every other living agent in board order
    pub fn new(board: &Board, deciding_id: &str) -> Result<Self, SearchError> {
        if !board.agent(deciding_id).is_some_and(|a| a.is_alive()) {
            return Err(SearchError::UnknownAgent(deciding_id.to_string()));
        }

        let mut order = vec![deciding_id.to_string()];
        order.extend(
            board
                .alive_agents()
                .filter(|a| a.id != deciding_id)
                .map(|a| a.id.clone()),
        );
        let slots = order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        Ok(TurnRotation { order, slots })
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn deciding(&self) -> &str {
        &self.order[0]
    }

    fn slot(&self, id: &str) -> usize {
        // Ids outside the table behave like the deciding agent's slot
        self.slots.get(id).copied().unwrap_or(0)
    }

    /// Agent acting after `id`
    pub fn next(&self, id: &str) -> &str {
        &self.order[(self.slot(id) + 1) % self.order.len()]
    }

    /// Agent acting before `id`
    pub fn prev(&self, id: &str) -> &str {
        let len = self.order.len();
        &self.order[(self.slot(id) + len - 1) % len]
    }

    /// Whether `id` closes a tick
    pub fn is_last(&self, id: &str) -> bool {
        self.slot(id) == self.order.len() - 1
    }
}
