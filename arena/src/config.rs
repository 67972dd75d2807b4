//! Configuration for the arena runner
//!
//! Defaults come from the central config (config.toml plus `BLASTGRID_*`
//! environment overrides). CLI arguments take highest priority.

use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser};
use engine_config::{load_config, CentralConfig, MctsSettings, OrchestratorSettings};
use engine_core::GameMode;
use games_bomberman::{BombermanConfig, BombermanState};
use mcts::MctsConfig;
use once_cell::sync::Lazy;
use std::time::Duration;
use tracing::level_filters::LevelFilter;

use crate::agent::{Agent, DoNothingAgent, RandomAgent};
use crate::mcts_agent::MctsAgent;
use crate::orchestrator::OrchestratorOptions;

// Load central config once at startup
static CENTRAL_CONFIG: Lazy<CentralConfig> = Lazy::new(load_config);

/// Agent kinds accepted in the line-up.
pub const AGENT_KINDS: [&str; 3] = ["mcts", "random", "idle"];

fn default_log_level() -> String {
    CENTRAL_CONFIG.common.log_level.clone()
}

fn default_seed() -> u64 {
    CENTRAL_CONFIG.common.seed
}

fn default_mode() -> String {
    CENTRAL_CONFIG.game.mode.clone()
}

fn default_board_size() -> usize {
    CENTRAL_CONFIG.game.board_size
}

fn default_max_ticks() -> u32 {
    CENTRAL_CONFIG.game.max_ticks
}

fn default_vision_range() -> i32 {
    CENTRAL_CONFIG.game.vision_range
}

fn default_wood_density() -> f64 {
    CENTRAL_CONFIG.game.wood_density
}

fn default_decision_time_ms() -> u64 {
    CENTRAL_CONFIG.orchestrator.decision_time_ms
}

fn default_parallel() -> bool {
    CENTRAL_CONFIG.orchestrator.parallel
}

fn default_check_decision_time() -> bool {
    CENTRAL_CONFIG.orchestrator.check_decision_time
}

fn default_enforce_parallel_deadline() -> bool {
    CENTRAL_CONFIG.orchestrator.enforce_parallel_deadline
}

fn default_stop_type() -> String {
    CENTRAL_CONFIG.mcts.stop_type.clone()
}

fn default_num_iterations() -> u32 {
    CENTRAL_CONFIG.mcts.num_iterations
}

fn default_num_fmcalls() -> u32 {
    CENTRAL_CONFIG.mcts.num_fmcalls
}

fn default_num_time_ms() -> u64 {
    CENTRAL_CONFIG.mcts.num_time_ms
}

fn default_rollout_depth() -> u32 {
    CENTRAL_CONFIG.mcts.rollout_depth
}

fn default_heuristic() -> String {
    CENTRAL_CONFIG.mcts.heuristic.clone()
}

fn default_rollout_policy() -> String {
    CENTRAL_CONFIG.mcts.rollout_policy.clone()
}

#[derive(Parser, Debug, Clone)]
#[command(name = "arena")]
#[command(about = "Blastgrid arena - plays one game between configured agents")]
#[command(
    long_about = "Runs a single Bomberman game with the given agent line-up, collecting
one decision per agent per tick under a wall-clock budget.

Configuration is loaded from config.toml with environment variable overrides.
CLI arguments take highest priority."
)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = default_log_level())]
    pub log_level: String,

    /// Seed for board generation and agents
    #[arg(long, default_value_t = default_seed())]
    pub seed: u64,

    /// Game mode (ffa, team, team_radio)
    #[arg(long, default_value_t = default_mode())]
    pub mode: String,

    /// Comma-separated agent line-up, one of mcts, random, idle per slot
    #[arg(long, value_delimiter = ',', default_value = "mcts,random,random,random")]
    pub agents: Vec<String>,

    #[arg(long, default_value_t = default_board_size())]
    pub board_size: usize,

    #[arg(long, default_value_t = default_max_ticks())]
    pub max_ticks: u32,

    /// Chebyshev vision radius, negative for full observability
    #[arg(long, default_value_t = default_vision_range(), allow_negative_numbers = true)]
    pub vision_range: i32,

    #[arg(long, default_value_t = default_wood_density())]
    pub wood_density: f64,

    /// Wall-clock budget per decision in milliseconds
    #[arg(long, default_value_t = default_decision_time_ms())]
    pub decision_time_ms: u64,

    /// Run each agent on its own worker thread
    #[arg(long, default_value_t = default_parallel(), action = ArgAction::Set)]
    pub parallel: bool,

    /// Replace late decisions with STOP
    #[arg(long, default_value_t = default_check_decision_time(), action = ArgAction::Set)]
    pub check_decision_time: bool,

    /// Stop waiting for workers at the deadline instead of joining on all
    #[arg(long, default_value_t = default_enforce_parallel_deadline(), action = ArgAction::Set)]
    pub enforce_parallel_deadline: bool,

    /// Capture training samples for the linear rollout policy
    #[arg(long)]
    pub record_samples: bool,

    /// MCTS budget type (time, iterations, fm_calls)
    #[arg(long, default_value_t = default_stop_type())]
    pub stop_type: String,

    #[arg(long, default_value_t = default_num_iterations())]
    pub num_iterations: u32,

    #[arg(long, default_value_t = default_num_fmcalls())]
    pub num_fmcalls: u32,

    #[arg(long, default_value_t = default_num_time_ms())]
    pub num_time_ms: u64,

    #[arg(long, default_value_t = default_rollout_depth())]
    pub rollout_depth: u32,

    /// Leaf evaluation (board_stats, win_loss)
    #[arg(long, default_value_t = default_heuristic())]
    pub heuristic: String,

    /// Rollout policy (linear, random, safe_random)
    #[arg(long, default_value_t = default_rollout_policy())]
    pub rollout_policy: String,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        let mode = self.game_mode()?;

        if !(2..=4).contains(&self.agents.len()) {
            return Err(anyhow!(
                "agents must list 2 to 4 entries, got {}",
                self.agents.len()
            ));
        }
        if let Some(kind) = self
            .agents
            .iter()
            .find(|kind| !AGENT_KINDS.contains(&kind.as_str()))
        {
            return Err(anyhow!(
                "unknown agent '{}', expected one of {}",
                kind,
                AGENT_KINDS.join(", ")
            ));
        }
        if mode.is_team() && self.agents.len() != 4 {
            return Err(anyhow!("team modes need exactly 4 agents"));
        }

        if self.board_size < 5 {
            return Err(anyhow!("board_size must be at least 5"));
        }

        if self.max_ticks == 0 {
            return Err(anyhow!("max_ticks must be greater than 0"));
        }

        if self.decision_time_ms == 0 {
            return Err(anyhow!("decision_time_ms must be greater than 0"));
        }

        if !(0.0..=1.0).contains(&self.wood_density) {
            return Err(anyhow!("wood_density must be between 0 and 1"));
        }

        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }

        self.mcts_config()?;
        Ok(())
    }

    pub fn game_mode(&self) -> Result<GameMode> {
        self.mode.parse().map_err(|e: String| anyhow!(e))
    }

    pub fn decision_time(&self) -> Duration {
        Duration::from_millis(self.decision_time_ms)
    }

    /// Search settings: central config with the CLI's overrides applied.
    pub fn mcts_settings(&self) -> MctsSettings {
        MctsSettings {
            stop_type: self.stop_type.clone(),
            num_iterations: self.num_iterations,
            num_fmcalls: self.num_fmcalls,
            num_time_ms: self.num_time_ms,
            rollout_depth: self.rollout_depth,
            heuristic: self.heuristic.clone(),
            rollout_policy: self.rollout_policy.clone(),
            ..CENTRAL_CONFIG.mcts.clone()
        }
    }

    pub fn mcts_config(&self) -> Result<MctsConfig> {
        Ok(MctsConfig::try_from(&self.mcts_settings())?)
    }

    pub fn orchestrator_options(&self) -> OrchestratorOptions {
        OrchestratorOptions::from(&OrchestratorSettings {
            decision_time_ms: self.decision_time_ms,
            parallel: self.parallel,
            check_decision_time: self.check_decision_time,
            enforce_parallel_deadline: self.enforce_parallel_deadline,
        })
    }

    pub fn bomberman_config(&self) -> Result<BombermanConfig> {
        Ok(BombermanConfig {
            board_size: self.board_size,
            num_agents: self.agents.len(),
            mode: self.game_mode()?,
            max_ticks: self.max_ticks,
            vision_range: u32::try_from(self.vision_range).ok(),
            wood_density: self.wood_density,
            ..BombermanConfig::default()
        })
    }

    /// Build the agent line-up. Each agent gets its own seed derived from
    /// the game seed.
    pub fn build_agents(&self) -> Result<Vec<Box<dyn Agent<BombermanState>>>> {
        let search = self.mcts_config()?;
        self.agents
            .iter()
            .enumerate()
            .map(|(slot, kind)| {
                let seed = self.seed.wrapping_add(slot as u64 + 1);
                let agent: Box<dyn Agent<BombermanState>> = match kind.as_str() {
                    "mcts" => Box::new(MctsAgent::with_seed(search.clone(), seed)),
                    "random" => Box::new(RandomAgent::with_seed(seed)),
                    "idle" => Box::new(DoNothingAgent),
                    other => return Err(anyhow!("unknown agent '{}'", other)),
                };
                Ok(agent)
            })
            .collect()
    }
}
