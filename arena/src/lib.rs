//! Blastgrid arena
//!
//! Plays games between agents on any `ForwardModel`:
//! - `Agent`: the per-slot decision maker (`RandomAgent`, `DoNothingAgent`, `MctsAgent`)
//! - `Orchestrator`: collects one action per agent per tick under a wall-clock
//!   budget, sequentially or on one worker thread per agent
//! - `Game`: the tick loop that owns the authoritative state, relays team
//!   radio messages and delivers final rewards
//! - `SampleRecorder`: optional per-tick capture of training samples

pub mod agent;
pub mod config;
pub mod game;
pub mod mcts_agent;
pub mod orchestrator;
pub mod samples;
pub mod worker;

pub use agent::{Agent, DoNothingAgent, RandomAgent};
pub use config::Config;
pub use game::{Game, GameError, GameOutcome};
pub use mcts_agent::MctsAgent;
pub use orchestrator::{ExecutionMode, Orchestrator, OrchestratorError, OrchestratorOptions};
pub use samples::{SampleRecorder, TrainingSample, WINDOW_SPANS};
pub use worker::{Worker, WorkerReply, WorkerRequest};
