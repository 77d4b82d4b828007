// Replay module for analyzing logged decisions
//
// This module provides functionality to:
// 1. Parse JSONL debug logs
// 2. Re-run the search on the logged board states
// 3. Compare logged vs replayed moves
// 4. Generate detailed analysis reports
//
// Searches without a fixed seed are not reproducible, so mismatches are
// expected unless the replay config sets `search.seed`.

use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use crate::bot::Bot;
use crate::config::Config;
use crate::mcts::{self, SearchReport};
use crate::types::Direction;

pub use crate::debug_logger::DebugLogEntry as LogEntry;

/// Result of replaying a single turn
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub turn: i32,
    pub original_move: Direction,
    pub replayed_move: Direction,
    pub matches: bool,
    /// Logged win rate of the original move, if the log carried root stats
    pub original_win_rate: Option<f64>,
    pub replayed_win_rate: f64,
    pub tree_size: usize,
    pub computation_time_ms: u64,
}

/// Statistics for a complete replay session
#[derive(Debug, Default)]
pub struct ReplayStats {
    pub total_turns: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub match_rate: f64,
}

/// Moves a logged turn is allowed to have played, written `turn:move` or
/// `turn:move|move|...`
#[derive(Debug, Clone, PartialEq)]
pub struct Expectation {
    pub turn: i32,
    pub moves: Vec<Direction>,
}

impl FromStr for Expectation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (turn, moves) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("Invalid expectation '{}', expected 'turn:move'", s))?;
        let turn = turn
            .parse::<i32>()
            .map_err(|e| format!("Invalid turn number '{}': {}", turn, e))?;
        let moves = moves
            .split('|')
            .map(str::parse::<Direction>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Expectation { turn, moves })
    }
}

/// Replay engine for analyzing debug logs
pub struct ReplayEngine {
    config: Config,
    verbose: bool,
}

impl ReplayEngine {
    /// Creates a new replay engine with the given configuration
    pub fn new(config: Config, verbose: bool) -> Self {
        ReplayEngine { config, verbose }
    }

    /// Loads all log entries from a JSONL file
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<LogEntry>, String> {
        let file =
            File::open(log_path.as_ref()).map_err(|e| format!("Failed to open log file: {}", e))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: LogEntry = serde_json::from_str(&line)
                .map_err(|e| format!("Failed to parse JSON on line {}: {}", line_num + 1, e))?;

            entries.push(entry);
        }

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    /// Runs the search on a logged board state
    pub fn replay_turn(&self, entry: &LogEntry) -> Result<SearchReport, String> {
        if !entry.board.snakes.iter().any(|s| s.id == entry.you_id) {
            return Err(format!(
                "Snake with id '{}' not found in board state",
                entry.you_id
            ));
        }

        let sim = Bot::simulation_board(&self.config, &entry.game, entry.turn, &entry.board);
        mcts::choose_move(
            &sim,
            &entry.you_id,
            &self.config.search,
            self.config.move_generation.strictness,
        )
        .map_err(|e| format!("Search failed on turn {}: {}", entry.turn, e))
    }

    /// Replays a single log entry and compares the result
    pub fn replay_entry(&self, entry: &LogEntry) -> Result<ReplayResult, String> {
        if self.verbose {
            info!("Replaying turn {}...", entry.turn);
        }

        let report = self.replay_turn(entry)?;
        let original_move = entry.chosen_move;
        let replayed_move = report.chosen;
        let matches = original_move == replayed_move;

        let original_win_rate = entry
            .children
            .iter()
            .find(|c| c.action == original_move)
            .map(|c| c.win_rate);
        let replayed_win_rate = report
            .children
            .iter()
            .find(|c| c.action == replayed_move)
            .map(|c| c.win_rate)
            .unwrap_or(0.0);

        let result = ReplayResult {
            turn: entry.turn,
            original_move,
            replayed_move,
            matches,
            original_win_rate,
            replayed_win_rate,
            tree_size: report.tree_size,
            computation_time_ms: report.elapsed_ms,
        };

        if self.verbose {
            if matches {
                info!(
                    "Turn {}: ✓ MATCH - {} (win rate: {:.3}, nodes: {}, time: {}ms)",
                    entry.turn,
                    replayed_move,
                    replayed_win_rate,
                    report.tree_size,
                    report.elapsed_ms
                );
            } else {
                warn!(
                    "Turn {}: ✗ MISMATCH - Original: {}, Replayed: {} (win rate: {:.3}, nodes: {}, time: {}ms)",
                    entry.turn,
                    original_move,
                    replayed_move,
                    replayed_win_rate,
                    report.tree_size,
                    report.elapsed_ms
                );
            }
        }

        Ok(result)
    }

    /// Replays all entries in a log file
    pub fn replay_all(&self, entries: &[LogEntry]) -> Result<Vec<ReplayResult>, String> {
        let mut results = Vec::new();

        for entry in entries {
            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Failed to replay turn {}: {}", entry.turn, e);
                }
            }
        }

        Ok(results)
    }

    /// Replays specific turns from a log file
    pub fn replay_turns(
        &self,
        entries: &[LogEntry],
        turn_numbers: &[i32],
    ) -> Result<Vec<ReplayResult>, String> {
        let mut results = Vec::new();

        for turn_num in turn_numbers {
            let entry = entries
                .iter()
                .find(|e| e.turn == *turn_num)
                .ok_or_else(|| format!("Turn {} not found in log file", turn_num))?;

            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Failed to replay turn {}: {}", turn_num, e);
                }
            }
        }

        Ok(results)
    }

    /// Generates statistics from replay results
    pub fn generate_stats(&self, results: &[ReplayResult]) -> ReplayStats {
        let total_turns = results.len();
        let matches = results.iter().filter(|r| r.matches).count();
        let mismatches = total_turns - matches;
        let match_rate = if total_turns > 0 {
            (matches as f64 / total_turns as f64) * 100.0
        } else {
            0.0
        };

        ReplayStats {
            total_turns,
            matches,
            mismatches,
            match_rate,
        }
    }

    /// Prints a detailed report of replay results
    pub fn print_report(&self, results: &[ReplayResult]) {
        let stats = self.generate_stats(results);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Total Turns:    {}", stats.total_turns);
        println!("Matches:        {} ({:.1}%)", stats.matches, stats.match_rate);
        println!("Mismatches:     {}", stats.mismatches);
        println!("═══════════════════════════════════════════════════════════\n");

        if !results.is_empty() {
            let avg_time: f64 = results
                .iter()
                .map(|r| r.computation_time_ms as f64)
                .sum::<f64>()
                / results.len() as f64;
            let avg_nodes: f64 =
                results.iter().map(|r| r.tree_size as f64).sum::<f64>() / results.len() as f64;

            println!("Average Tree Size:          {:.1}", avg_nodes);
            println!("Average Computation Time:   {:.1}ms\n", avg_time);
        }

        let mismatches: Vec<_> = results.iter().filter(|r| !r.matches).collect();
        if !mismatches.is_empty() {
            println!("═══════════════════════════════════════════════════════════");
            println!("                  DETAILED MISMATCHES");
            println!("═══════════════════════════════════════════════════════════");

            for result in mismatches {
                let original = result
                    .original_win_rate
                    .map(|w| format!("{:.3}", w))
                    .unwrap_or_else(|| "n/a".to_string());
                println!(
                    "Turn {}: {} ({}) → {} ({:.3}) (nodes: {}, time: {}ms)",
                    result.turn,
                    result.original_move,
                    original,
                    result.replayed_move,
                    result.replayed_win_rate,
                    result.tree_size,
                    result.computation_time_ms
                );
            }
            println!();
        }
    }

    /// Checks every expectation against the logged moves
    pub fn validate_expected_moves(
        &self,
        entries: &[LogEntry],
        expectations: &[Expectation],
    ) -> Result<(), String> {
        for expectation in expectations {
            let entry = entries
                .iter()
                .find(|e| e.turn == expectation.turn)
                .ok_or_else(|| format!("Turn {} not found in log", expectation.turn))?;

            if !expectation.moves.contains(&entry.chosen_move) {
                return Err(format!(
                    "Turn {}: Expected one of {:?}, but got {}",
                    expectation.turn,
                    expectation.moves.iter().map(|d| d.as_str()).collect::<Vec<_>>(),
                    entry.chosen_move
                ));
            }
        }

        Ok(())
    }
}
