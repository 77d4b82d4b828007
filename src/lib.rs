// Library exports for the MCTS Battlesnake
// The server binary, the replay tool and the integration tests all build on these

pub mod board;
pub mod bot;
pub mod config;
pub mod debug_logger;
pub mod error;
pub mod mcts;
pub mod movegen;
pub mod replay;
pub mod rotation;
pub mod rules;
pub mod types;
