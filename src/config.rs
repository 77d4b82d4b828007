// Configuration module for reading Snake.toml
// All tunables of the search live here so that nothing is read from the
// environment deep inside the algorithm.

use log::warn;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::ConfigError;
use crate::movegen::Strictness;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub timing: TimingConfig,
    pub search: SearchConfig,
    pub move_generation: MoveGenerationConfig,
    pub game_rules: GameRulesConfig,
    pub debug: DebugConfig,
}

/// Response deadline handling for the HTTP layer
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TimingConfig {
    pub response_time_budget_ms: u64,
    pub network_overhead_ms: u64,
}

impl TimingConfig {
    /// Computes the effective computation budget
    pub fn effective_budget_ms(&self) -> u64 {
        self.response_time_budget_ms.saturating_sub(self.network_overhead_ms)
    }
}

/// Food spawning inside rollouts
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FoodSpawnPolicy {
    /// Same chance as the real game
    Keep,
    /// Half the real chance, keeps playouts shorter
    #[default]
    Halve,
    /// No random spawns; minimum food is still replenished
    Disable,
}

impl FoodSpawnPolicy {
    pub fn apply(&self, chance: i32) -> i32 {
        match self {
            FoodSpawnPolicy::Keep => chance,
            FoodSpawnPolicy::Halve => chance / 2,
            FoodSpawnPolicy::Disable => 0,
        }
    }
}

/// How rollouts advance the board
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RolloutResolution {
    /// One agent at a time following the turn rotation
    #[default]
    Sequential,
    /// Every agent picks a move, the tick resolves at once
    Simultaneous,
}

/// Criterion for the final move among the root's children
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecisionCriterion {
    #[default]
    Visits,
    WinRate,
}

/// Monte Carlo Tree Search parameters
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SearchConfig {
    /// Select/expand/rollout/backpropagate cycles per decision
    pub iterations: u32,
    /// UCT exploration constant C
    pub exploration_constant: f64,
    /// Hard cap on rollout length, in ticks
    pub max_rollout_turns: u32,
    #[serde(default)]
    pub rollout_food_spawn: FoodSpawnPolicy,
    #[serde(default)]
    pub rollout_resolution: RolloutResolution,
    #[serde(default)]
    pub decision_criterion: DecisionCriterion,
    /// Rollouts run per iteration; more than one fans out over rayon
    #[serde(default = "default_rollouts_per_leaf")]
    pub rollouts_per_leaf: u32,
    /// Fixed seed for reproducible searches
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_rollouts_per_leaf() -> u32 {
    1
}

impl SearchConfig {
    /// Rejects values the search cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::InvalidIterations(self.iterations));
        }
        if !self.exploration_constant.is_finite() || self.exploration_constant < 0.0 {
            return Err(ConfigError::InvalidExplorationConstant(
                self.exploration_constant,
            ));
        }
        if self.max_rollout_turns == 0 {
            return Err(ConfigError::InvalidRolloutCap);
        }
        if self.rollouts_per_leaf == 0 {
            return Err(ConfigError::InvalidRolloutsPerLeaf);
        }
        Ok(())
    }
}

/// Move generation constants
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MoveGenerationConfig {
    #[serde(default)]
    pub strictness: Strictness,
}

/// Game rules constants
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GameRulesConfig {
    pub health_on_food: i32,
    pub health_loss_per_turn: i32,
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Snake.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, ConfigError>` - Parsed and validated configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read(e.to_string()))?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads default configuration from Snake.toml in the project root
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::from_file("Snake.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Snake.toml
    pub fn default_hardcoded() -> Self {
        Config {
            timing: TimingConfig {
                response_time_budget_ms: 400,
                network_overhead_ms: 50,
            },
            search: SearchConfig {
                iterations: 1500,
                exploration_constant: 1.41,
                max_rollout_turns: 50,
                rollout_food_spawn: FoodSpawnPolicy::Halve,
                rollout_resolution: RolloutResolution::Sequential,
                decision_criterion: DecisionCriterion::Visits,
                rollouts_per_leaf: 1,
                seed: None,
            },
            move_generation: MoveGenerationConfig {
                strictness: Strictness::Lenient,
            },
            game_rules: GameRulesConfig {
                health_on_food: 100,
                health_loss_per_turn: 1,
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "battlesnake_debug.jsonl".to_string(),
            },
        }
    }

    /// Checks every section; the search config is checked again at the search entry
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.search.validate()?;
        if self.game_rules.health_on_food <= 0 {
            return Err(ConfigError::InvalidMaxHealth(self.game_rules.health_on_food));
        }
        if self.game_rules.health_loss_per_turn < 0 {
            return Err(ConfigError::InvalidHealthLoss(
                self.game_rules.health_loss_per_turn,
            ));
        }
        Ok(())
    }

    /// Loads Snake.toml, falling back to hardcoded defaults only when the file is missing.
    /// A file that exists but is invalid is an error, never silently replaced.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Self::load_or_default_from("Snake.toml")
    }

    pub fn load_or_default_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match fs::read_to_string(path.as_ref()) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(
                    "Could not find {} ({}), using hardcoded defaults",
                    path.as_ref().display(),
                    e
                );
                Ok(Self::default_hardcoded())
            }
            Err(e) => Err(ConfigError::Read(e.to_string())),
        }
    }
}
