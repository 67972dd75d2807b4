//! Default configuration values loaded from config.defaults.toml.
//!
//! This module loads defaults from the shared TOML file at compile time,
//! so the runner and the library crates agree on every default.

use once_cell::sync::Lazy;
use serde::Deserialize;

/// The embedded defaults TOML file (loaded at compile time)
const DEFAULTS_TOML: &str = include_str!("../../../config.defaults.toml");

/// Parsed defaults structure (parsed once at first use)
static DEFAULTS: Lazy<DefaultsConfig> = Lazy::new(|| {
    toml::from_str(DEFAULTS_TOML).expect("config.defaults.toml should be valid TOML")
});

// ============================================================================
// Internal structs for parsing config.defaults.toml
// ============================================================================

#[derive(Debug, Deserialize)]
struct DefaultsConfig {
    common: CommonDefaults,
    game: GameDefaults,
    mcts: MctsDefaults,
    orchestrator: OrchestratorDefaults,
}

#[derive(Debug, Deserialize)]
struct CommonDefaults {
    log_level: String,
    seed: u64,
}

#[derive(Debug, Deserialize)]
struct GameDefaults {
    mode: String,
    board_size: usize,
    max_ticks: u32,
    vision_range: i32,
    wood_density: f64,
}

#[derive(Debug, Deserialize)]
struct MctsDefaults {
    k: f64,
    epsilon: f64,
    rollout_depth: u32,
    stop_type: String,
    num_iterations: u32,
    num_fmcalls: u32,
    num_time_ms: u64,
    time_floor_ms: u64,
    heuristic: String,
    rollout_policy: String,
}

#[derive(Debug, Deserialize)]
struct OrchestratorDefaults {
    decision_time_ms: u64,
    parallel: bool,
    check_decision_time: bool,
    enforce_parallel_deadline: bool,
}

// ============================================================================
// Public accessor functions
// ============================================================================

// Common
pub fn log_level() -> &'static str {
    &DEFAULTS.common.log_level
}
pub fn seed() -> u64 {
    DEFAULTS.common.seed
}

// Game
pub fn game_mode() -> &'static str {
    &DEFAULTS.game.mode
}
pub fn board_size() -> usize {
    DEFAULTS.game.board_size
}
pub fn max_ticks() -> u32 {
    DEFAULTS.game.max_ticks
}
pub fn vision_range() -> i32 {
    DEFAULTS.game.vision_range
}
pub fn wood_density() -> f64 {
    DEFAULTS.game.wood_density
}

// MCTS
pub fn mcts_k() -> f64 {
    DEFAULTS.mcts.k
}
pub fn mcts_epsilon() -> f64 {
    DEFAULTS.mcts.epsilon
}
pub fn rollout_depth() -> u32 {
    DEFAULTS.mcts.rollout_depth
}
pub fn stop_type() -> &'static str {
    &DEFAULTS.mcts.stop_type
}
pub fn num_iterations() -> u32 {
    DEFAULTS.mcts.num_iterations
}
pub fn num_fmcalls() -> u32 {
    DEFAULTS.mcts.num_fmcalls
}
pub fn num_time_ms() -> u64 {
    DEFAULTS.mcts.num_time_ms
}
pub fn time_floor_ms() -> u64 {
    DEFAULTS.mcts.time_floor_ms
}
pub fn heuristic() -> &'static str {
    &DEFAULTS.mcts.heuristic
}
pub fn rollout_policy() -> &'static str {
    &DEFAULTS.mcts.rollout_policy
}

// Orchestrator
pub fn decision_time_ms() -> u64 {
    DEFAULTS.orchestrator.decision_time_ms
}
pub fn parallel() -> bool {
    DEFAULTS.orchestrator.parallel
}
pub fn check_decision_time() -> bool {
    DEFAULTS.orchestrator.check_decision_time
}
pub fn enforce_parallel_deadline() -> bool {
    DEFAULTS.orchestrator.enforce_parallel_deadline
}
