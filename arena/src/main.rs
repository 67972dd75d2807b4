//! Arena - runs one Blastgrid game
//!
//! 1. Loads config.toml (with env overrides) and CLI arguments
//! 2. Builds the board and the agent line-up
//! 3. Plays the game tick by tick under the per-decision budget
//! 4. Logs each agent's result, reward and overrun count

use anyhow::Result;
use arena::{Config, Game};
use clap::Parser;
use games_bomberman::BombermanState;
use tracing::info;

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let config = Config::parse();
    config.validate()?;

    init_tracing(&config.log_level)?;
    info!(log_level = %config.log_level, "Tracing initialized");

    let options = config.orchestrator_options();
    info!(
        mode = %config.mode,
        agents = ?config.agents,
        seed = config.seed,
        execution = ?options.mode,
        decision_time_ms = config.decision_time_ms,
        "Starting game"
    );

    let state = BombermanState::new(config.bomberman_config()?, config.seed);
    let mut game = Game::new(state, config.build_agents()?, options, config.max_ticks)?;
    if config.record_samples {
        game = game.with_sample_recording();
    }
    let outcome = game.run()?;

    for (id, kind) in config.agents.iter().enumerate() {
        info!(
            agent = id,
            kind = %kind,
            result = %outcome.results[id],
            reward = outcome.rewards[id],
            overruns = outcome.overruns[id],
            "Final standing"
        );
    }
    if config.record_samples {
        info!(samples = game.samples().len(), "Training samples kept");
    }
    info!(ticks = outcome.ticks, "Arena finished");

    Ok(())
}
