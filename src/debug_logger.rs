// Debug logging module for asynchronous decision logging
//
// This module provides fire-and-forget async logging to avoid blocking
// the main request/response cycle. Each decision is written as one line of
// a JSONL file together with the root statistics that produced it, which is
// the input format of the replay tool.

use log::error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::mcts::{ChildStats, SearchReport};
use crate::types::{Board, Direction, Game};

/// Represents a single debug log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugLogEntry {
    pub turn: i32,
    pub you_id: String,
    pub chosen_move: Direction,
    #[serde(default)]
    pub game: Game,
    pub board: Board,
    #[serde(default)]
    pub children: Vec<ChildStats>,
    #[serde(default)]
    pub iterations: u32,
    #[serde(default)]
    pub tree_size: usize,
    #[serde(default)]
    pub elapsed_ms: u64,
    pub timestamp: String,
}

/// Shared debug logger state
/// Uses Arc<Mutex<File>> to allow concurrent async writes from multiple tasks
#[derive(Clone)]
pub struct DebugLogger {
    file: Arc<Mutex<Option<File>>>,
    enabled: bool,
}

impl DebugLogger {
    /// Creates a new debug logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub async fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return Self::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
            .await
        {
            Ok(file) => {
                log::info!("Debug logging enabled: {}", log_file_path);
                DebugLogger {
                    file: Arc::new(Mutex::new(Some(file))),
                    enabled: true,
                }
            }
            Err(e) => {
                error!("Failed to create debug log file '{}': {}", log_file_path, e);
                Self::disabled()
            }
        }
    }

    /// Creates a disabled debug logger (no-op)
    pub fn disabled() -> Self {
        DebugLogger {
            file: Arc::new(Mutex::new(None)),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Logs a move decision asynchronously (fire-and-forget)
    /// This spawns a tokio task that writes to the file without blocking
    pub fn log_move(&self, turn: i32, game: Game, board: Board, you_id: String, report: &SearchReport) {
        if !self.enabled {
            return;
        }

        let entry = DebugLogEntry {
            turn,
            you_id,
            chosen_move: report.chosen,
            game,
            board,
            children: report.children.clone(),
            iterations: report.iterations,
            tree_size: report.tree_size,
            elapsed_ms: report.elapsed_ms,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let file_handle = self.file.clone();

        tokio::spawn(async move {
            Self::write_entry(file_handle, entry).await;
        });
    }

    /// Internal async function that performs the actual file write
    async fn write_entry(file_handle: Arc<Mutex<Option<File>>>, entry: DebugLogEntry) {
        let mut file_guard = file_handle.lock().await;

        if let Some(file) = file_guard.as_mut() {
            match serde_json::to_string(&entry) {
                Ok(json_line) => {
                    let line_with_newline = format!("{}\n", json_line);
                    if let Err(e) = file.write_all(line_with_newline.as_bytes()).await {
                        error!("Failed to write debug log entry: {}", e);
                    } else if let Err(e) = file.flush().await {
                        error!("Failed to flush debug log: {}", e);
                    }
                }
                Err(e) => {
                    error!("Failed to serialize debug log entry: {}", e);
                }
            }
        }
    }

    /// Writes `entry` and waits for it to hit the file
    pub async fn log_entry(&self, entry: DebugLogEntry) {
        if self.enabled {
            Self::write_entry(self.file.clone(), entry).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Battlesnake, Coord};

    fn entry(turn: i32) -> DebugLogEntry {
        let you = Battlesnake {
            id: "me".to_string(),
            name: "me".to_string(),
            health: 90,
            body: vec![Coord { x: 2, y: 2 }, Coord { x: 2, y: 1 }],
            head: Coord { x: 2, y: 2 },
            length: 2,
            latency: "0".to_string(),
            shout: None,
        };
        DebugLogEntry {
            turn,
            you_id: "me".to_string(),
            chosen_move: Direction::Up,
            game: Game::default(),
            board: Board {
                height: 11,
                width: 11,
                food: vec![],
                snakes: vec![you],
                hazards: vec![],
            },
            children: vec![],
            iterations: 10,
            tree_size: 20,
            elapsed_ms: 1,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn test_entries_are_written_one_per_line() {
        let path = std::env::temp_dir().join(format!(
            "mcts_snake_debug_{}.jsonl",
            std::process::id()
        ));
        let path_str = path.to_string_lossy().to_string();

        let logger = DebugLogger::new(true, &path_str).await;
        assert!(logger.is_enabled());
        logger.log_entry(entry(1)).await;
        logger.log_entry(entry(2)).await;

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: DebugLogEntry = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed.turn, 2);
        assert_eq!(parsed.chosen_move, Direction::Up);
        assert!(lines[0].contains(r#""chosen_move":"up""#));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_disabled_logger_writes_nothing() {
        let logger = DebugLogger::new(false, "should_not_exist.jsonl").await;
        assert!(!logger.is_enabled());
        logger.log_entry(entry(1)).await;
        assert!(!std::path::Path::new("should_not_exist.jsonl").exists());
    }
}
