//! Configuration loading logic.
//!
//! Handles loading config from files and applying environment variable overrides.

use crate::CentralConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Standard locations to search for config.toml
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "config.toml",    // Current directory
    "../config.toml", // Parent directory (when running from a crate directory)
];

/// Errors raised when a config file is explicitly requested.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Load the central configuration from config.toml.
///
/// Searches for config.toml in the following order:
/// 1. Path specified by BLASTGRID_CONFIG environment variable
/// 2. Current directory (config.toml)
/// 3. Parent directory (../config.toml)
///
/// After loading, environment variable overrides are applied.
pub fn load_config() -> CentralConfig {
    // Check for explicit config path
    if let Ok(path) = std::env::var("BLASTGRID_CONFIG") {
        let path = PathBuf::from(&path);
        if path.exists() {
            info!("Loading config from BLASTGRID_CONFIG: {}", path.display());
            return load_from_path(&path);
        }
        warn!(
            "BLASTGRID_CONFIG={} not found, searching defaults",
            path.display()
        );
    }

    // Search default locations
    for path_str in CONFIG_SEARCH_PATHS {
        let path = PathBuf::from(path_str);
        if path.exists() {
            info!("Loading config from {}", path.display());
            return load_from_path(&path);
        }
    }

    // Fall back to defaults
    debug!("No config.toml found, using built-in defaults");
    apply_env_overrides(CentralConfig::default())
}

/// Load configuration from a specific path, falling back to defaults on error.
pub fn load_from_path(path: &Path) -> CentralConfig {
    match try_load_from_path(path) {
        Ok(config) => config,
        Err(e) => {
            warn!("{}, using defaults", e);
            apply_env_overrides(CentralConfig::default())
        }
    }
}

/// Load configuration from a specific path, reporting read and parse errors.
pub fn try_load_from_path(path: &Path) -> Result<CentralConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: CentralConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(apply_env_overrides(config))
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // String field
    ($config:expr, $section:ident . $field:ident, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $config.$section.$field = v;
        }
    };
    // Parseable field (u32, u64, f64, bool, etc.)
    ($config:expr, $section:ident . $field:ident, $key:expr, parse) => {
        if let Ok(v) =
            std::env::var($key).and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent))
        {
            $config.$section.$field = v;
        }
    };
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: BLASTGRID_<SECTION>_<KEY>
pub fn apply_env_overrides(mut config: CentralConfig) -> CentralConfig {
    // Common
    env_override!(config, common.log_level, "BLASTGRID_COMMON_LOG_LEVEL");
    env_override!(config, common.seed, "BLASTGRID_COMMON_SEED", parse);

    // Game
    env_override!(config, game.mode, "BLASTGRID_GAME_MODE");
    env_override!(config, game.board_size, "BLASTGRID_GAME_BOARD_SIZE", parse);
    env_override!(config, game.max_ticks, "BLASTGRID_GAME_MAX_TICKS", parse);
    env_override!(
        config,
        game.vision_range,
        "BLASTGRID_GAME_VISION_RANGE",
        parse
    );
    env_override!(
        config,
        game.wood_density,
        "BLASTGRID_GAME_WOOD_DENSITY",
        parse
    );

    // MCTS
    env_override!(config, mcts.k, "BLASTGRID_MCTS_K", parse);
    env_override!(config, mcts.epsilon, "BLASTGRID_MCTS_EPSILON", parse);
    env_override!(
        config,
        mcts.rollout_depth,
        "BLASTGRID_MCTS_ROLLOUT_DEPTH",
        parse
    );
    env_override!(config, mcts.stop_type, "BLASTGRID_MCTS_STOP_TYPE");
    env_override!(
        config,
        mcts.num_iterations,
        "BLASTGRID_MCTS_NUM_ITERATIONS",
        parse
    );
    env_override!(
        config,
        mcts.num_fmcalls,
        "BLASTGRID_MCTS_NUM_FMCALLS",
        parse
    );
    env_override!(
        config,
        mcts.num_time_ms,
        "BLASTGRID_MCTS_NUM_TIME_MS",
        parse
    );
    env_override!(
        config,
        mcts.time_floor_ms,
        "BLASTGRID_MCTS_TIME_FLOOR_MS",
        parse
    );
    env_override!(config, mcts.heuristic, "BLASTGRID_MCTS_HEURISTIC");
    env_override!(
        config,
        mcts.rollout_policy,
        "BLASTGRID_MCTS_ROLLOUT_POLICY"
    );

    // Orchestrator
    env_override!(
        config,
        orchestrator.decision_time_ms,
        "BLASTGRID_ORCHESTRATOR_DECISION_TIME_MS",
        parse
    );
    env_override!(
        config,
        orchestrator.parallel,
        "BLASTGRID_ORCHESTRATOR_PARALLEL",
        parse
    );
    env_override!(
        config,
        orchestrator.check_decision_time,
        "BLASTGRID_ORCHESTRATOR_CHECK_DECISION_TIME",
        parse
    );
    env_override!(
        config,
        orchestrator.enforce_parallel_deadline,
        "BLASTGRID_ORCHESTRATOR_ENFORCE_PARALLEL_DEADLINE",
        parse
    );

    config
}
