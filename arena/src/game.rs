//! Tick loop
//!
//! Owns the authoritative game state. Each tick collects a joint action,
//! advances the state, relays team-radio messages and hands every agent a
//! fresh observation. When the game ends the final rewards are delivered once.

use engine_core::{
    final_rewards, is_ended, teammate_of, ForwardModel, GameMode, GameResult, MESSAGE_LENGTH,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::agent::Agent;
use crate::orchestrator::{Orchestrator, OrchestratorError, OrchestratorOptions};
use crate::samples::{SampleRecorder, TrainingSample};

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error("Game has {slots} agent slots but {agents} agents were supplied")]
    AgentCountMismatch { agents: usize, slots: usize },
}

/// Final state of a finished game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameOutcome {
    pub results: Vec<GameResult>,
    pub rewards: Vec<f64>,
    pub overruns: Vec<u32>,
    pub ticks: u32,
}

pub struct Game<M: ForwardModel> {
    state: M,
    orchestrator: Orchestrator<M>,
    observations: Vec<M>,
    /// Latest known result per agent
    results: Vec<GameResult>,
    max_ticks: u32,
    outcome: Option<GameOutcome>,
    recorder: Option<SampleRecorder>,
    samples: Vec<TrainingSample>,
}

impl<M: ForwardModel> Game<M> {
    pub fn new(
        state: M,
        agents: Vec<Box<dyn Agent<M>>>,
        options: OrchestratorOptions,
        max_ticks: u32,
    ) -> Result<Self, GameError> {
        let slots = state.num_agents();
        if agents.len() != slots {
            return Err(GameError::AgentCountMismatch {
                agents: agents.len(),
                slots,
            });
        }

        let orchestrator = Orchestrator::new(agents, options)?;
        let observations = (0..slots).map(|id| state.observation_for(id)).collect();
        let results = (0..slots).map(|id| state.winner_of(id)).collect();

        Ok(Self {
            state,
            orchestrator,
            observations,
            results,
            max_ticks,
            outcome: None,
            recorder: None,
            samples: Vec::new(),
        })
    }

    /// Capture a training sample per agent per tick. The filtered samples are
    /// available from `samples()` once the game has ended.
    pub fn with_sample_recording(mut self) -> Self {
        self.recorder = Some(SampleRecorder::new());
        self
    }

    /// Play one tick. Returns `false` once the game has ended; further calls
    /// do nothing.
    pub fn tick(&mut self) -> Result<bool, GameError> {
        if self.outcome.is_some() {
            return Ok(false);
        }

        let tick = self.state.tick();
        let joint = self
            .orchestrator
            .collect_actions(tick, &self.observations, &self.results)?;
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.record(&self.observations, &self.results, &joint);
        }
        self.state.next(&joint);
        debug!(tick, actions = ?joint, "tick played");

        if self.state.game_mode() == GameMode::TeamRadio {
            self.relay_messages();
        }

        let n = self.state.num_agents();
        for id in 0..n {
            self.results[id] = self.state.winner_of(id);
            self.observations[id] = self.state.observation_for(id);
        }

        let alive = self.state.alive_agents();
        let ended = is_ended(
            self.state.tick(),
            self.max_ticks,
            self.state.game_mode(),
            &alive,
        ) || self.state.is_terminal();

        if ended {
            self.finish()?;
        }
        Ok(!ended)
    }

    /// Play until the game ends.
    pub fn run(&mut self) -> Result<GameOutcome, GameError> {
        loop {
            if let Some(outcome) = &self.outcome {
                return Ok(outcome.clone());
            }
            self.tick()?;
        }
    }

    /// Each agent's inbox becomes its teammate's latest outbox, or silence if
    /// the teammate was already out before this tick. Runs before `results`
    /// is refreshed, so a teammate eliminated this tick still gets its last
    /// message through.
    fn relay_messages(&mut self) {
        let n = self.state.num_agents();
        for id in 0..n {
            let mate = teammate_of(id, n);
            let message = if self.results[mate].is_incomplete() {
                self.orchestrator.outbox(mate)
            } else {
                [0; MESSAGE_LENGTH]
            };
            self.state.set_message(id, message);
        }
    }

    fn finish(&mut self) -> Result<(), GameError> {
        let results: Vec<GameResult> = self
            .results
            .iter()
            .map(|r| if r.is_incomplete() { GameResult::Tie } else { *r })
            .collect();
        let rewards = final_rewards(&results);
        if let Some(recorder) = self.recorder.as_mut() {
            self.samples = recorder.finish(&results);
        }

        self.outcome = Some(GameOutcome {
            results: results.clone(),
            rewards: rewards.clone(),
            overruns: self.orchestrator.overruns().to_vec(),
            ticks: self.state.tick(),
        });
        self.orchestrator.finish(&rewards)?;

        info!(
            ticks = self.state.tick(),
            ?results,
            ?rewards,
            overruns = ?self.orchestrator.overruns(),
            samples = self.samples.len(),
            "game over"
        );
        Ok(())
    }

    pub fn is_ended(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<&GameOutcome> {
        self.outcome.as_ref()
    }

    pub fn state(&self) -> &M {
        &self.state
    }

    pub fn observations(&self) -> &[M] {
        &self.observations
    }

    pub fn orchestrator(&self) -> &Orchestrator<M> {
        &self.orchestrator
    }

    /// Training samples kept at the end of a recorded game.
    pub fn samples(&self) -> &[TrainingSample] {
        &self.samples
    }
}
