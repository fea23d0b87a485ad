// Configuration module for reading Snake.toml
// Tunable constants live in Snake.toml; default_hardcoded() mirrors them

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::types::Direction;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub timing: TimingConfig,
    pub engine: EngineConfig,
    pub board: BoardConfig,
    pub reachability: ReachabilityConfig,
    pub pathfinding: PathfindingConfig,
    pub apple: AppleConfig,
    pub rivals: RivalsConfig,
    pub hunting: HuntingConfig,
    pub scores: ScoresConfig,
    pub floors: FloorsConfig,
    pub direction_encoding: DirectionEncodingConfig,
    pub debug: DebugConfig,
}

/// Per-turn wall-clock budget
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    pub turn_budget_ms: u64,
    /// Time kept back for the fallback tiers once the scored tiers run long
    pub fallback_reserve_ms: u64,
}

impl TimingConfig {
    /// Computes the budget available to the scored tiers
    pub fn effective_budget_ms(&self) -> u64 {
        self.turn_budget_ms.saturating_sub(self.fallback_reserve_ms)
    }
}

/// Engine construction options
#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    /// Fixed seed for the engine's random source; entropy-seeded when absent
    #[serde(default)]
    pub rng_seed: Option<u64>,
    /// "weighted" or "cautious"
    pub scoring_policy: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BoardConfig {
    /// Treat the outermost ring of cells as wall. Off makes the whole board
    /// playable.
    pub edge_cells_are_walls: bool,
}

/// Flood-fill and projection bounds
#[derive(Debug, Deserialize, Clone)]
pub struct ReachabilityConfig {
    pub visit_cap: usize,
    pub future_depth: usize,
    pub future_discount: f64,
    pub local_space_cap: usize,
}

/// Path search bounds and risk costs
#[derive(Debug, Deserialize, Clone)]
pub struct PathfindingConfig {
    pub max_expansions: usize,
    pub base_step_cost: u32,
    pub proximity_radius: i32,
    pub proximity_weight: u32,
    pub space_discount: u32,
}

/// Apple valuation: value = ceil(base_value - age / ticks_per_point)
#[derive(Debug, Deserialize, Clone)]
pub struct AppleConfig {
    pub base_value: i32,
    pub ticks_per_point: i32,
    pub lethal_value: i32,
    /// Greedy approach radius used when no path to the apple exists
    pub close_distance: i32,
    /// Length lead over every rival that counts as decisive
    pub decisive_lead: usize,
    /// Harmful apples further away than this are left to general scoring
    pub hazard_radius: i32,
}

/// Rival classification and movement prediction
#[derive(Debug, Deserialize, Clone)]
pub struct RivalsConfig {
    pub threat_radius: i32,
    pub prey_margin: usize,
    pub emergency_threat_distance: i32,
    pub prediction_depth: usize,
    pub deviation_kill_threshold: u32,
    pub deviation_chance_per_kill: f64,
    pub deviation_chance_max: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HuntingConfig {
    /// Post-move space required per body segment before hunting is allowed
    pub space_per_length: f64,
    pub min_safe_distance: i32,
    pub weight_size_diff: f64,
    pub weight_proximity: f64,
    pub weight_escape_cut: f64,
    pub min_score: f64,
}

/// General scoring weights
#[derive(Debug, Deserialize, Clone)]
pub struct ScoresConfig {
    pub weight_space: f64,
    pub weight_future_space: f64,
    pub weight_goal: f64,
    pub weight_threat_distance: f64,
    pub weight_prey_closing: f64,
    pub head_to_head_win_bonus: f64,
    pub head_to_head_loss_penalty: f64,
    pub lethal_apple_penalty: f64,

    // Wall proximity penalty
    pub wall_penalty_base: f64,
    pub safe_distance_from_wall: i32,
    pub corner_penalty: f64,

    pub center_bias_multiplier: f64,

    // Emergency tier
    pub emergency_weight_space: f64,
    pub emergency_weight_threat_distance: f64,
}

/// Minimum reachable space a candidate needs to be accepted by each tier
#[derive(Debug, Deserialize, Clone)]
pub struct FloorsConfig {
    pub emergency: usize,
    pub goal: usize,
    pub hazard: usize,
    pub hunting: usize,
    pub general: usize,
    pub space_filling: usize,
}

/// Direction encoding constants
#[derive(Debug, Deserialize, Clone)]
pub struct DirectionEncodingConfig {
    pub direction_up_index: u8,
    pub direction_down_index: u8,
    pub direction_left_index: u8,
    pub direction_right_index: u8,
}

impl DirectionEncodingConfig {
    /// Converts a direction to its wire code
    pub fn encode(&self, dir: Direction) -> u8 {
        match dir {
            Direction::Up => self.direction_up_index,
            Direction::Down => self.direction_down_index,
            Direction::Left => self.direction_left_index,
            Direction::Right => self.direction_right_index,
        }
    }

    /// Converts a wire code back to a direction
    pub fn decode(&self, code: u8) -> Option<Direction> {
        Direction::all().into_iter().find(|&d| self.encode(d) == code)
    }
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone)]
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
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        toml::from_str(&contents).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Loads default configuration from Snake.toml in the working directory
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Snake.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Snake.toml
    pub fn default_hardcoded() -> Self {
        Config {
            timing: TimingConfig {
                turn_budget_ms: 40,
                fallback_reserve_ms: 5,
            },
            engine: EngineConfig {
                rng_seed: None,
                scoring_policy: "weighted".to_string(),
            },
            board: BoardConfig {
                edge_cells_are_walls: true,
            },
            reachability: ReachabilityConfig {
                visit_cap: 50,
                future_depth: 4,
                future_discount: 0.7,
                local_space_cap: 8,
            },
            pathfinding: PathfindingConfig {
                max_expansions: 2500,
                base_step_cost: 10,
                proximity_radius: 4,
                proximity_weight: 6,
                space_discount: 4,
            },
            apple: AppleConfig {
                base_value: 5,
                ticks_per_point: 10,
                lethal_value: -4,
                close_distance: 10,
                decisive_lead: 5,
                hazard_radius: 10,
            },
            rivals: RivalsConfig {
                threat_radius: 10,
                prey_margin: 3,
                emergency_threat_distance: 2,
                prediction_depth: 3,
                deviation_kill_threshold: 3,
                deviation_chance_per_kill: 0.05,
                deviation_chance_max: 0.3,
            },
            hunting: HuntingConfig {
                space_per_length: 1.0,
                min_safe_distance: 2,
                weight_size_diff: 2.0,
                weight_proximity: 30.0,
                weight_escape_cut: 15.0,
                min_score: 10.0,
            },
            scores: ScoresConfig {
                weight_space: 4.0,
                weight_future_space: 1.0,
                weight_goal: 40.0,
                weight_threat_distance: 3.0,
                weight_prey_closing: 20.0,
                head_to_head_win_bonus: 50.0,
                head_to_head_loss_penalty: -5000.0,
                lethal_apple_penalty: -100000.0,
                wall_penalty_base: 30.0,
                safe_distance_from_wall: 2,
                corner_penalty: 40.0,
                center_bias_multiplier: 10.0,
                emergency_weight_space: 10.0,
                emergency_weight_threat_distance: 5.0,
            },
            floors: FloorsConfig {
                emergency: 1,
                goal: 6,
                hazard: 4,
                hunting: 6,
                general: 3,
                space_filling: 1,
            },
            direction_encoding: DirectionEncodingConfig {
                direction_up_index: 0,
                direction_down_index: 1,
                direction_left_index: 2,
                direction_right_index: 3,
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "snake_agent_debug.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            log::warn!("Could not load Snake.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }
}
