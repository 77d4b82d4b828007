// Re-runs decisions from a JSONL decision log through the search
//
//   replay battlesnake_debug.jsonl all --seed 42
//   replay battlesnake_debug.jsonl turns 5,10,15 --iterations 5000
//   replay battlesnake_debug.jsonl expect 5:up,10:left|right
//   replay battlesnake_debug.jsonl show 10

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use log::warn;

use mcts_snake::config::Config;
use mcts_snake::replay::{Expectation, LogEntry, ReplayEngine};

#[derive(Parser)]
#[command(name = "replay")]
#[command(about = "Replay logged decisions through the MCTS search and compare the moves")]
#[command(version)]
struct Cli {
    /// Decision log written by the server
    log_file: PathBuf,

    /// Configuration the search is replayed with
    #[arg(long, default_value = "Snake.toml")]
    config: PathBuf,

    /// Seed for every replayed search; without one replays are not reproducible
    #[arg(long)]
    seed: Option<u64>,

    /// Iteration budget, overriding the config
    #[arg(long)]
    iterations: Option<u32>,

    /// Log every replayed turn
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay every logged turn
    All,
    /// Replay the given turns
    Turns {
        #[arg(value_delimiter = ',', required = true)]
        turns: Vec<i32>,
    },
    /// Check logged moves, e.g. `5:up,10:left|right`
    Expect {
        #[arg(value_delimiter = ',', required = true)]
        expectations: Vec<Expectation>,
    },
    /// Print the root statistics logged for one turn
    Show { turn: i32 },
}

fn show(entry: &LogEntry) {
    println!(
        "Turn {}: {} played {} ({} iterations, {} nodes, {}ms)",
        entry.turn,
        entry.you_id,
        entry.chosen_move,
        entry.iterations,
        entry.tree_size,
        entry.elapsed_ms
    );
    if entry.children.is_empty() {
        println!("  no root statistics logged");
    }
    for child in &entry.children {
        println!(
            "  {:>5}: {:>6} sims, {:>8.1} wins, win rate {:.3}",
            child.action, child.sims, child.wins, child.win_rate
        );
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let mut config = Config::load_or_default_from(&cli.config)
        .map_err(|e| format!("invalid config '{}': {}", cli.config.display(), e))?;
    if let Some(seed) = cli.seed {
        config.search.seed = Some(seed);
    }
    if let Some(iterations) = cli.iterations {
        config.search.iterations = iterations;
    }
    config.validate().map_err(|e| e.to_string())?;
    if config.search.seed.is_none() {
        warn!("No search seed set, replayed moves can differ between runs");
    }

    let engine = ReplayEngine::new(config, cli.verbose);
    let entries = engine.load_log_file(&cli.log_file)?;
    if entries.is_empty() {
        return Err(format!("{} has no entries", cli.log_file.display()));
    }

    match cli.command {
        Command::All => engine.print_report(&engine.replay_all(&entries)?),
        Command::Turns { turns } => engine.print_report(&engine.replay_turns(&entries, &turns)?),
        Command::Expect { expectations } => {
            engine.validate_expected_moves(&entries, &expectations)?;
            println!("All {} expectation(s) hold", expectations.len());
        }
        Command::Show { turn } => {
            let entry = entries
                .iter()
                .find(|e| e.turn == turn)
                .ok_or_else(|| format!("Turn {} not found in log", turn))?;
            show(entry);
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
