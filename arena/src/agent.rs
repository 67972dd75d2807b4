//! Agents that take part in a game
//!
//! An agent is asked for one action per tick with its own observation and an
//! absolute deadline, may broadcast a radio message, and is told its final
//! reward exactly once when the game ends.

use std::time::Instant;

use engine_core::{Action, ForwardModel, Message, MESSAGE_LENGTH};
use rand::prelude::*;
use rand_chacha::ChaCha20Rng;

/// A decision maker occupying one agent slot.
pub trait Agent<M: ForwardModel>: Send {
    /// Choose an action for the current tick. Implementations should return
    /// before `deadline`; late answers are replaced by `Stop`.
    fn act(&mut self, observation: &M, deadline: Instant) -> Action;

    /// Final reward for the game, delivered once.
    fn result(&mut self, _reward: f64) {}

    /// Message to send to a teammate after the latest decision.
    fn message(&self) -> Message {
        [0; MESSAGE_LENGTH]
    }

    /// Independent copy of this agent.
    fn box_clone(&self) -> Box<dyn Agent<M>>;

    fn name(&self) -> &str;
}

impl<M: ForwardModel> Clone for Box<dyn Agent<M>> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Agent that selects actions uniformly at random.
#[derive(Debug, Clone)]
pub struct RandomAgent {
    rng: ChaCha20Rng,
}

impl RandomAgent {
    pub fn new() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ForwardModel> Agent<M> for RandomAgent {
    fn act(&mut self, observation: &M, _deadline: Instant) -> Action {
        let n = observation.legal_action_count().max(1);
        Action::from_index(self.rng.gen_range(0..n)).unwrap_or_default()
    }

    fn box_clone(&self) -> Box<dyn Agent<M>> {
        Box::new(self.clone())
    }

    fn name(&self) -> &str {
        "random"
    }
}

/// Agent that always stops.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoNothingAgent;

impl<M: ForwardModel> Agent<M> for DoNothingAgent {
    fn act(&mut self, _observation: &M, _deadline: Instant) -> Action {
        Action::Stop
    }

    fn box_clone(&self) -> Box<dyn Agent<M>> {
        Box::new(*self)
    }

    fn name(&self) -> &str {
        "idle"
    }
}
