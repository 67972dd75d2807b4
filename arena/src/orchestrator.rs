//! Per-tick decision collection under a wall-clock budget
//!
//! Every tick the orchestrator asks each live agent for one action, either in
//! turn on the calling thread or concurrently on one worker thread per agent.
//! Late decisions are replaced by `Stop` and counted as overruns.

use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use engine_config::OrchestratorSettings;
use engine_core::{Action, AgentId, ForwardModel, GameResult, JointAction, Message, MESSAGE_LENGTH};
use thiserror::Error;
use tracing::{debug, warn};

use crate::agent::Agent;
use crate::worker::{Worker, WorkerRequest};

/// How agents are invoked each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One agent after another on the tick loop's thread.
    Sequential,
    /// Each agent on its own worker thread. With `enforce_deadline` the
    /// orchestrator stops waiting at the tick deadline; otherwise it waits
    /// for every worker and checks the decision times afterwards.
    Parallel { enforce_deadline: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorOptions {
    /// Wall-clock budget for one decision
    pub decision_time: Duration,
    pub mode: ExecutionMode,
    /// Substitute `Stop` for late decisions. When off, every decision is
    /// awaited and accepted.
    pub check_decision_time: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            decision_time: Duration::from_millis(100),
            mode: ExecutionMode::Sequential,
            check_decision_time: true,
        }
    }
}

impl From<&OrchestratorSettings> for OrchestratorOptions {
    fn from(settings: &OrchestratorSettings) -> Self {
        let mode = if settings.parallel {
            ExecutionMode::Parallel {
                enforce_deadline: settings.enforce_parallel_deadline,
            }
        } else {
            ExecutionMode::Sequential
        };
        Self {
            decision_time: Duration::from_millis(settings.decision_time_ms),
            mode,
            check_decision_time: settings.check_decision_time,
        }
    }
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Worker for agent {agent} failed")]
    WorkerFailed { agent: AgentId },

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Expected {expected} observations, got {got}")]
    ObservationCount { expected: usize, got: usize },
}

enum Seat<M: ForwardModel> {
    Local(Box<dyn Agent<M>>),
    Remote(Worker<M>),
}

/// Collects one action per agent slot each tick.
pub struct Orchestrator<M: ForwardModel> {
    seats: Vec<Seat<M>>,
    names: Vec<String>,
    options: OrchestratorOptions,
    /// Late decisions per agent, monotone over the game
    overruns: Vec<u32>,
    /// Message each agent produced with its latest decision
    outboxes: Vec<Message>,
    finished: bool,
}

impl<M: ForwardModel> Orchestrator<M> {
    pub fn new(
        agents: Vec<Box<dyn Agent<M>>>,
        options: OrchestratorOptions,
    ) -> Result<Self, OrchestratorError> {
        let names: Vec<String> = agents.iter().map(|a| a.name().to_string()).collect();
        let n = agents.len();

        let seats = match options.mode {
            ExecutionMode::Sequential => agents.into_iter().map(Seat::Local).collect(),
            ExecutionMode::Parallel { .. } => agents
                .into_iter()
                .enumerate()
                .map(|(id, agent)| Worker::spawn(id, agent).map(Seat::Remote))
                .collect::<Result<Vec<_>, _>>()?,
        };

        debug!(agents = n, mode = ?options.mode, "orchestrator ready");
        Ok(Self {
            seats,
            names,
            options,
            overruns: vec![0; n],
            outboxes: vec![[0; MESSAGE_LENGTH]; n],
            finished: false,
        })
    }

    pub fn num_agents(&self) -> usize {
        self.seats.len()
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn overruns(&self) -> &[u32] {
        &self.overruns
    }

    /// Message agent `id` produced with its latest decision.
    pub fn outbox(&self, id: AgentId) -> Message {
        self.outboxes
            .get(id)
            .copied()
            .unwrap_or([0; MESSAGE_LENGTH])
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Gather the joint action for `tick`. Agents whose result is already
    /// decided play `Stop` and are not asked.
    pub fn collect_actions(
        &mut self,
        tick: u32,
        observations: &[M],
        results: &[GameResult],
    ) -> Result<JointAction, OrchestratorError> {
        let n = self.seats.len();
        if observations.len() != n {
            return Err(OrchestratorError::ObservationCount {
                expected: n,
                got: observations.len(),
            });
        }

        let live: Vec<bool> = (0..n)
            .map(|id| results.get(id).map_or(true, |r| r.is_incomplete()))
            .collect();

        match self.options.mode {
            ExecutionMode::Sequential => Ok(self.collect_sequential(tick, observations, &live)),
            ExecutionMode::Parallel { enforce_deadline } => {
                let deadline = Instant::now() + self.options.decision_time;
                let enforce = enforce_deadline && self.options.check_decision_time;
                self.collect_parallel(tick, observations, &live, deadline, enforce)
            }
        }
    }

    fn collect_sequential(
        &mut self,
        tick: u32,
        observations: &[M],
        live: &[bool],
    ) -> JointAction {
        let mut joint = vec![Action::Stop; self.seats.len()];
        for (id, seat) in self.seats.iter_mut().enumerate() {
            let Seat::Local(agent) = seat else { continue };
            if !live[id] {
                continue;
            }

            // Each agent's budget starts when it is asked.
            let start = Instant::now();
            let action = agent.act(&observations[id], start + self.options.decision_time);
            let elapsed = start.elapsed();
            self.outboxes[id] = agent.message();

            if self.options.check_decision_time && elapsed > self.options.decision_time {
                self.overruns[id] += 1;
                warn!(
                    agent = id,
                    tick,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = self.options.decision_time.as_millis() as u64,
                    "decision overran its budget, playing STOP"
                );
                continue;
            }
            joint[id] = action;
        }
        joint
    }

    fn collect_parallel(
        &mut self,
        tick: u32,
        observations: &[M],
        live: &[bool],
        deadline: Instant,
        enforce: bool,
    ) -> Result<JointAction, OrchestratorError> {
        let mut joint = vec![Action::Stop; self.seats.len()];

        for (id, seat) in self.seats.iter().enumerate() {
            let Seat::Remote(worker) = seat else { continue };
            if !live[id] {
                continue;
            }
            let request = WorkerRequest::Decide {
                tick,
                observation: observations[id].clone(),
                deadline,
            };
            if !worker.send(request) {
                return Err(OrchestratorError::WorkerFailed { agent: id });
            }
        }

        for (id, seat) in self.seats.iter().enumerate() {
            let Seat::Remote(worker) = seat else { continue };
            if !live[id] {
                continue;
            }

            if enforce {
                match worker.recv_until(tick, deadline) {
                    Ok(reply) => {
                        self.outboxes[id] = reply.message;
                        joint[id] = reply.action;
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        self.overruns[id] += 1;
                        warn!(agent = id, tick, "no decision by the deadline, playing STOP");
                    }
                    Err(RecvTimeoutError::Disconnected) => {
                        return Err(OrchestratorError::WorkerFailed { agent: id });
                    }
                }
            } else {
                let reply = worker
                    .recv(tick)
                    .ok_or(OrchestratorError::WorkerFailed { agent: id })?;
                self.outboxes[id] = reply.message;
                if self.options.check_decision_time && reply.elapsed > self.options.decision_time {
                    self.overruns[id] += 1;
                    warn!(
                        agent = id,
                        tick,
                        elapsed_ms = reply.elapsed.as_millis() as u64,
                        "decision overran its budget, playing STOP"
                    );
                } else {
                    joint[id] = reply.action;
                }
            }
        }

        Ok(joint)
    }

    /// Deliver the final rewards to every agent and shut the workers down.
    /// Only the first call has any effect.
    pub fn finish(&mut self, rewards: &[f64]) -> Result<(), OrchestratorError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        let mut failed = None;
        for (id, seat) in self.seats.iter_mut().enumerate() {
            let reward = rewards.get(id).copied().unwrap_or(0.0);
            match seat {
                Seat::Local(agent) => agent.result(reward),
                Seat::Remote(worker) => {
                    let delivered = worker.send(WorkerRequest::Finish { reward });
                    if worker.join().is_none() || !delivered {
                        failed.get_or_insert(id);
                    }
                }
            }
        }

        match failed {
            Some(agent) => Err(OrchestratorError::WorkerFailed { agent }),
            None => Ok(()),
        }
    }
}
