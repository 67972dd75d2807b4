//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support and default values.

use crate::defaults;
use serde::Deserialize;

// ============================================================================
// Serde default functions (required for #[serde(default = "...")])
// These call the accessor functions from defaults module
// ============================================================================

fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_seed() -> u64 {
    defaults::seed()
}
fn d_game_mode() -> String {
    defaults::game_mode().into()
}
fn d_board_size() -> usize {
    defaults::board_size()
}
fn d_max_ticks() -> u32 {
    defaults::max_ticks()
}
fn d_vision_range() -> i32 {
    defaults::vision_range()
}
fn d_wood_density() -> f64 {
    defaults::wood_density()
}
fn d_k() -> f64 {
    defaults::mcts_k()
}
fn d_epsilon() -> f64 {
    defaults::mcts_epsilon()
}
fn d_rollout_depth() -> u32 {
    defaults::rollout_depth()
}
fn d_stop_type() -> String {
    defaults::stop_type().into()
}
fn d_num_iterations() -> u32 {
    defaults::num_iterations()
}
fn d_num_fmcalls() -> u32 {
    defaults::num_fmcalls()
}
fn d_num_time_ms() -> u64 {
    defaults::num_time_ms()
}
fn d_time_floor_ms() -> u64 {
    defaults::time_floor_ms()
}
fn d_heuristic() -> String {
    defaults::heuristic().into()
}
fn d_rollout_policy() -> String {
    defaults::rollout_policy().into()
}
fn d_decision_time_ms() -> u64 {
    defaults::decision_time_ms()
}
fn d_parallel() -> bool {
    defaults::parallel()
}
fn d_check_decision_time() -> bool {
    defaults::check_decision_time()
}
fn d_enforce_parallel_deadline() -> bool {
    defaults::enforce_parallel_deadline()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Root configuration structure matching config.toml
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CentralConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub mcts: MctsSettings,
    #[serde(default)]
    pub orchestrator: OrchestratorSettings,
}

/// Common configuration shared by all components
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommonConfig {
    #[serde(default = "d_log_level")]
    pub log_level: String,
    #[serde(default = "d_seed")]
    pub seed: u64,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::log_level().into(),
            seed: defaults::seed(),
        }
    }
}

/// Game setup for the reference forward model and the tick loop
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GameConfig {
    /// ffa, team or team_radio
    #[serde(default = "d_game_mode")]
    pub mode: String,
    #[serde(default = "d_board_size")]
    pub board_size: usize,
    #[serde(default = "d_max_ticks")]
    pub max_ticks: u32,
    /// Chebyshev vision radius; negative means fully observable
    #[serde(default = "d_vision_range")]
    pub vision_range: i32,
    #[serde(default = "d_wood_density")]
    pub wood_density: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            mode: defaults::game_mode().into(),
            board_size: defaults::board_size(),
            max_ticks: defaults::max_ticks(),
            vision_range: defaults::vision_range(),
            wood_density: defaults::wood_density(),
        }
    }
}

/// Search settings as written in config.toml
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MctsSettings {
    /// UCT exploration constant
    #[serde(default = "d_k")]
    pub k: f64,
    /// Division guard and tie-break noise scale
    #[serde(default = "d_epsilon")]
    pub epsilon: f64,
    #[serde(default = "d_rollout_depth")]
    pub rollout_depth: u32,
    /// time, iterations or fm_calls
    #[serde(default = "d_stop_type")]
    pub stop_type: String,
    #[serde(default = "d_num_iterations")]
    pub num_iterations: u32,
    #[serde(default = "d_num_fmcalls")]
    pub num_fmcalls: u32,
    #[serde(default = "d_num_time_ms")]
    pub num_time_ms: u64,
    #[serde(default = "d_time_floor_ms")]
    pub time_floor_ms: u64,
    /// board_stats or win_loss
    #[serde(default = "d_heuristic")]
    pub heuristic: String,
    /// linear, random or safe_random
    #[serde(default = "d_rollout_policy")]
    pub rollout_policy: String,
}

impl Default for MctsSettings {
    fn default() -> Self {
        Self {
            k: defaults::mcts_k(),
            epsilon: defaults::mcts_epsilon(),
            rollout_depth: defaults::rollout_depth(),
            stop_type: defaults::stop_type().into(),
            num_iterations: defaults::num_iterations(),
            num_fmcalls: defaults::num_fmcalls(),
            num_time_ms: defaults::num_time_ms(),
            time_floor_ms: defaults::time_floor_ms(),
            heuristic: defaults::heuristic().into(),
            rollout_policy: defaults::rollout_policy().into(),
        }
    }
}

/// Per-tick decision collection settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// Per-agent wall-clock budget for one decision
    #[serde(default = "d_decision_time_ms")]
    pub decision_time_ms: u64,
    /// Run each agent in its own worker thread
    #[serde(default = "d_parallel")]
    pub parallel: bool,
    /// Replace overrunning decisions with STOP and count the overrun
    #[serde(default = "d_check_decision_time")]
    pub check_decision_time: bool,
    /// Stop waiting for workers at the deadline instead of joining on all
    #[serde(default = "d_enforce_parallel_deadline")]
    pub enforce_parallel_deadline: bool,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            decision_time_ms: defaults::decision_time_ms(),
            parallel: defaults::parallel(),
            check_decision_time: defaults::check_decision_time(),
            enforce_parallel_deadline: defaults::enforce_parallel_deadline(),
        }
    }
}
