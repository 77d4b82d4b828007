// Error taxonomy for the decision engine
//
// Configuration problems are reported before any search work starts,
// simulation problems abort the decision cycle they occur in.

use thiserror::Error;

/// Invalid or missing configuration
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("iteration budget must be a positive integer, got {0}")]
    InvalidIterations(u32),
    #[error("exploration constant must be finite and non-negative, got {0}")]
    InvalidExplorationConstant(f64),
    #[error("rollout turn cap must be positive")]
    InvalidRolloutCap,
    #[error("rollouts per leaf must be positive")]
    InvalidRolloutsPerLeaf,
    #[error("maximum health must be positive, got {0}")]
    InvalidMaxHealth(i32),
    #[error("health loss per turn must not be negative, got {0}")]
    InvalidHealthLoss(i32),
    #[error("failed to read config file: {0}")]
    Read(String),
    #[error("failed to parse config file: {0}")]
    Parse(String),
}

/// Malformed board encountered while simulating
#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("invalid board state: {0}")]
    InvalidState(String),
    #[error("no agent with id '{0}' on the board")]
    UnknownAgent(String),
}

/// Anything that stops a decision cycle from producing a move
#[derive(Debug, Error, PartialEq)]
pub enum SearchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("simulation failed: {0}")]
    Simulation(#[from] SimulationError),
    #[error("deciding agent '{0}' is not alive on the board")]
    UnknownAgent(String),
    #[error("search stopped after {0} iterations")]
    Cancelled(u32),
}
