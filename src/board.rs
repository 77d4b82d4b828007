// Internal board model used by the rule engine and the search
//
// A Board owns all of its agents, points and settings. Cloning a Board
// produces a fully independent snapshot, which is what every search node
// and every rollout relies on.

use std::fmt;

use crate::types::{self, Battlesnake, Coord, Game, GameState, Ruleset};

/// Grid coordinate
pub type Point = Coord;

pub const DEFAULT_MAX_HEALTH: i32 = 100;

/// Why an agent was removed from play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EliminationCause {
    Wall,
    Starvation,
    SelfCollision,
    Collision,
    HeadToHead,
}

impl fmt::Display for EliminationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EliminationCause::Wall => "wall-collision",
            EliminationCause::Starvation => "out-of-health",
            EliminationCause::SelfCollision => "snake-self-collision",
            EliminationCause::Collision => "snake-collision",
            EliminationCause::HeadToHead => "head-collision",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Alive,
    Eliminated {
        cause: EliminationCause,
        turn: u32,
        by: Option<String>,
    },
}

/// One competing snake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub id: String,
    pub name: String,
    /// Head first
    pub body: Vec<Point>,
    pub health: i32,
    pub status: Status,
}

impl Agent {
    pub fn new(id: impl Into<String>, body: Vec<Point>, health: i32) -> Self {
        let id = id.into();
        Agent {
            name: id.clone(),
            id,
            body,
            health,
            status: Status::Alive,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.status == Status::Alive
    }

    pub fn head(&self) -> Option<Point> {
        self.body.first().copied()
    }

    pub fn neck(&self) -> Option<Point> {
        self.body.get(1).copied()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn elimination_cause(&self) -> Option<EliminationCause> {
        match &self.status {
            Status::Alive => None,
            Status::Eliminated { cause, .. } => Some(*cause),
        }
    }
}

/// Game mode variants that change rule evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    Standard,
    /// Single snake; the game only ends when it dies
    Solo,
    /// Standard plus periodically expanding hazards
    Royale,
}

impl GameMode {
    pub fn from_ruleset_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "solo" => GameMode::Solo,
            "royale" => GameMode::Royale,
            _ => GameMode::Standard,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Standard => "standard",
            GameMode::Solo => "solo",
            GameMode::Royale => "royale",
        }
    }
}

/// Ruleset settings carried by every board
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Percent chance (0-100) of spawning one food per tick
    pub food_spawn_chance: i32,
    pub minimum_food: i32,
    pub hazard_damage_per_turn: i32,
    /// Royale only; 0 disables shrinking
    pub shrink_every_n_turns: i32,
    pub game_mode: GameMode,
    pub max_health: i32,
    pub health_loss_per_turn: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            food_spawn_chance: 15,
            minimum_food: 1,
            hazard_damage_per_turn: 0,
            shrink_every_n_turns: 0,
            game_mode: GameMode::Standard,
            max_health: DEFAULT_MAX_HEALTH,
            health_loss_per_turn: 1,
        }
    }
}

impl Settings {
    pub fn from_ruleset(ruleset: &Ruleset) -> Self {
        Settings {
            food_spawn_chance: ruleset.settings.food_spawn_chance,
            minimum_food: ruleset.settings.minimum_food,
            hazard_damage_per_turn: ruleset.settings.hazard_damage_per_turn,
            shrink_every_n_turns: ruleset.settings.royale.shrink_every_n_turns,
            game_mode: GameMode::from_ruleset_name(&ruleset.name),
            ..Settings::default()
        }
    }
}

/// Closed snapshot of one game position
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    pub width: i32,
    pub height: i32,
    pub turn: u32,
    pub agents: Vec<Agent>,
    pub food: Vec<Point>,
    pub hazards: Vec<Point>,
    pub settings: Settings,
}

impl Board {
    pub fn new(width: i32, height: i32, settings: Settings) -> Self {
        Board {
            width,
            height,
            turn: 0,
            agents: Vec::new(),
            food: Vec::new(),
            hazards: Vec::new(),
            settings,
        }
    }

    /// Converts an API snapshot into the internal model.
    /// Every snake in the snapshot starts out alive.
    pub fn from_game_state(state: &GameState) -> Self {
        Self::from_wire(&state.game, state.turn, &state.board)
    }

    /// Same as [`Board::from_game_state`] for callers holding the pieces separately
    pub fn from_wire(game: &Game, turn: i32, wire: &types::Board) -> Self {
        let mut board = Board::new(wire.width, wire.height, Settings::from_ruleset(&game.ruleset));
        board.turn = turn.max(0) as u32;
        board.agents = wire
            .snakes
            .iter()
            .map(|snake| Agent {
                id: snake.id.clone(),
                name: snake.name.clone(),
                body: snake.body.clone(),
                health: snake.health,
                status: Status::Alive,
            })
            .collect();
        for food in &wire.food {
            if !board.food.contains(food) {
                board.food.push(*food);
            }
        }
        for hazard in &wire.hazards {
            if !board.hazards.contains(hazard) {
                board.hazards.push(*hazard);
            }
        }
        board
    }

    /// Converts back into the API representation; eliminated agents are left out
    pub fn to_wire(&self) -> types::Board {
        types::Board {
            height: self.height,
            width: self.width,
            food: self.food.clone(),
            hazards: self.hazards.clone(),
            snakes: self
                .agents
                .iter()
                .filter(|a| a.is_alive())
                .map(|a| Battlesnake {
                    id: a.id.clone(),
                    name: a.name.clone(),
                    health: a.health,
                    body: a.body.clone(),
                    head: a.head().unwrap_or(Coord { x: 0, y: 0 }),
                    length: a.len() as i32,
                    latency: "0".to_string(),
                    shout: None,
                })
                .collect(),
        }
    }

    pub fn agent(&self, id: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn agent_index(&self, id: &str) -> Option<usize> {
        self.agents.iter().position(|a| a.id == id)
    }

    pub fn alive_agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|a| a.is_alive())
    }

    pub fn alive_count(&self) -> usize {
        self.alive_agents().count()
    }

    pub fn in_bounds(&self, p: &Point) -> bool {
        p.x >= 0 && p.x < self.width && p.y >= 0 && p.y < self.height
    }

    pub fn is_hazard(&self, p: &Point) -> bool {
        self.hazards.contains(p)
    }

    pub fn has_food(&self, p: &Point) -> bool {
        self.food.contains(p)
    }

    /// Cells that hold neither food nor a living snake segment
    pub fn free_cells(&self) -> Vec<Point> {
        let mut cells = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let p = Coord { x, y };
                if self.has_food(&p) {
                    continue;
                }
                if self.alive_agents().any(|a| a.body.contains(&p)) {
                    continue;
                }
                cells.push(p);
            }
        }
        cells
    }

    /// Sole surviving agent, if exactly one is alive
    pub fn sole_survivor(&self) -> Option<&str> {
        let mut alive = self.alive_agents();
        match (alive.next(), alive.next()) {
            (Some(agent), None) => Some(agent.id.as_str()),
            _ => None,
        }
    }
}
