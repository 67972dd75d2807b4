//! MCTS-based agent
//!
//! Runs a fresh search from its observation every tick. Time-budgeted searches
//! are additionally capped at the tick's decision deadline.

use std::time::Instant;

use engine_core::{Action, ForwardModel};
use mcts::{MctsConfig, MctsSearch};
use rand::prelude::*;
use rand_chacha::ChaCha20Rng;
use tracing::{debug, warn};

use crate::agent::Agent;

/// Agent that picks actions with Monte Carlo Tree Search.
#[derive(Debug, Clone)]
pub struct MctsAgent {
    config: MctsConfig,
    /// Seeds each search
    rng: ChaCha20Rng,
    searches: u32,
}

impl MctsAgent {
    pub fn new(config: MctsConfig) -> Self {
        Self {
            config,
            rng: ChaCha20Rng::from_entropy(),
            searches: 0,
        }
    }

    /// Create with a specific seed for determinism (used in tests)
    pub fn with_seed(config: MctsConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha20Rng::seed_from_u64(seed),
            searches: 0,
        }
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Number of searches run so far.
    pub fn searches(&self) -> u32 {
        self.searches
    }
}

impl<M: ForwardModel> Agent<M> for MctsAgent {
    fn act(&mut self, observation: &M, deadline: Instant) -> Action {
        let seed = self.rng.gen();
        let search = match MctsSearch::new(observation.clone(), self.config.clone(), seed) {
            Ok(search) => search,
            Err(e) => {
                warn!(agent = observation.current_agent(), error = %e, "MCTS search not started");
                return Action::Stop;
            }
        };

        let mut search = search.with_deadline(deadline);
        let result = search.run();
        self.searches += 1;
        debug!(
            agent = observation.current_agent(),
            tick = observation.tick(),
            action = %result.game_action(),
            iterations = result.iterations,
            "MCTS decision"
        );
        result.game_action()
    }

    fn box_clone(&self) -> Box<dyn Agent<M>> {
        Box::new(self.clone())
    }

    fn name(&self) -> &str {
        "mcts"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::NUM_ACTIONS;
    use games_bomberman::{BombermanConfig, BombermanState};
    use std::time::Duration;

    #[test]
    fn mcts_agent_returns_valid_action() {
        let state = BombermanState::new(BombermanConfig::default(), 8).observation_for(0);
        let mut agent = MctsAgent::with_seed(MctsConfig::for_testing(), 1);

        let action = agent.act(&state, Instant::now() + Duration::from_secs(1));
        assert!(action.index() < NUM_ACTIONS);
        assert_eq!(agent.searches(), 1);
    }

    #[test]
    fn time_mode_respects_decision_deadline() {
        let state = BombermanState::new(BombermanConfig::default(), 8).observation_for(1);
        let config = MctsConfig::default().with_time(Duration::from_secs(10));
        let mut agent = MctsAgent::with_seed(config, 2);

        let start = Instant::now();
        agent.act(&state, start + Duration::from_millis(40));
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn unusable_observation_yields_stop() {
        let state = BombermanState::new(BombermanConfig::default(), 8).observation_for(9);
        let mut agent = MctsAgent::with_seed(MctsConfig::for_testing(), 3);
        assert_eq!(
            agent.act(&state, Instant::now() + Duration::from_secs(1)),
            Action::Stop
        );
        assert_eq!(agent.searches(), 0);
    }
}
