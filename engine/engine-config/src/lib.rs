//! Blastgrid configuration: one TOML file shared by the search engine and
//! the arena runner.
//!
//! Values resolve in this order, first hit wins:
//! 1. `BLASTGRID_<SECTION>_<KEY>` environment variables
//! 2. `config.toml` (or the file named by `BLASTGRID_CONFIG`)
//! 3. `config.defaults.toml`, embedded at compile time
//!
//! ```text
//! BLASTGRID_COMMON_SEED=7
//! BLASTGRID_GAME_MODE=team_radio
//! BLASTGRID_MCTS_STOP_TYPE=iterations
//! BLASTGRID_ORCHESTRATOR_PARALLEL=true
//! ```

mod defaults;
mod loader;
mod structs;

pub use defaults::*;
pub use loader::{
    apply_env_overrides, load_config, load_from_path, try_load_from_path, ConfigError,
    CONFIG_SEARCH_PATHS,
};
pub use structs::*;
