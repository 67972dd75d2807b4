//! Dedicated decision thread for one agent
//!
//! A worker owns its agent for the whole game. Requests and replies travel
//! over std mpsc channels; dropping the request sender ends the thread, which
//! hands the agent back through its join handle.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use engine_core::{Action, AgentId, ForwardModel, Message};
use tracing::{debug, trace};

use crate::agent::Agent;

/// Work sent to a worker thread.
pub enum WorkerRequest<M> {
    /// Decide an action for `tick` before `deadline`.
    Decide {
        tick: u32,
        observation: M,
        deadline: Instant,
    },
    /// Deliver the final reward.
    Finish { reward: f64 },
}

/// Answer to a `Decide` request.
#[derive(Debug, Clone, Copy)]
pub struct WorkerReply {
    pub tick: u32,
    pub action: Action,
    pub message: Message,
    /// Time the agent spent inside `act`
    pub elapsed: Duration,
}

/// Handle to an agent running on its own thread.
pub struct Worker<M: ForwardModel> {
    id: AgentId,
    requests: Option<Sender<WorkerRequest<M>>>,
    replies: Receiver<WorkerReply>,
    handle: Option<JoinHandle<Box<dyn Agent<M>>>>,
}

impl<M: ForwardModel + 'static> Worker<M> {
    pub fn spawn(id: AgentId, mut agent: Box<dyn Agent<M>>) -> std::io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<WorkerRequest<M>>();
        let (reply_tx, reply_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name(format!("agent-{id}"))
            .spawn(move || {
                for request in request_rx {
                    match request {
                        WorkerRequest::Decide {
                            tick,
                            observation,
                            deadline,
                        } => {
                            let start = Instant::now();
                            let action = agent.act(&observation, deadline);
                            let reply = WorkerReply {
                                tick,
                                action,
                                message: agent.message(),
                                elapsed: start.elapsed(),
                            };
                            if reply_tx.send(reply).is_err() {
                                break;
                            }
                        }
                        WorkerRequest::Finish { reward } => agent.result(reward),
                    }
                }
                trace!(agent = id, "worker exiting");
                agent
            })?;

        debug!(agent = id, "worker spawned");
        Ok(Self {
            id,
            requests: Some(request_tx),
            replies: reply_rx,
            handle: Some(handle),
        })
    }
}

impl<M: ForwardModel> Worker<M> {
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Queue a request. Returns false if the thread is gone.
    pub fn send(&self, request: WorkerRequest<M>) -> bool {
        self.requests
            .as_ref()
            .is_some_and(|tx| tx.send(request).is_ok())
    }

    /// Wait for the reply to `tick` until `deadline`, discarding late replies
    /// to earlier ticks.
    pub fn recv_until(&self, tick: u32, deadline: Instant) -> Result<WorkerReply, RecvTimeoutError> {
        loop {
            let timeout = deadline.saturating_duration_since(Instant::now());
            let reply = self.replies.recv_timeout(timeout)?;
            if reply.tick == tick {
                return Ok(reply);
            }
            trace!(agent = self.id, stale = reply.tick, tick, "dropping stale reply");
        }
    }

    /// Block until the reply to `tick` arrives. `None` if the thread is gone.
    pub fn recv(&self, tick: u32) -> Option<WorkerReply> {
        loop {
            let reply = self.replies.recv().ok()?;
            if reply.tick == tick {
                return Some(reply);
            }
        }
    }

    /// Close the request channel and wait for the thread. Returns the agent,
    /// or `None` if the thread panicked.
    pub fn join(&mut self) -> Option<Box<dyn Agent<M>>> {
        self.requests.take();
        self.handle.take()?.join().ok()
    }
}

impl<M: ForwardModel> Drop for Worker<M> {
    fn drop(&mut self) {
        // Closing the channel lets the thread exit once `act` returns; a
        // thread still stuck in a late decision is left detached.
        self.requests.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::DoNothingAgent;
    use games_bomberman::{BombermanConfig, BombermanState};

    fn observation() -> BombermanState {
        BombermanState::new(BombermanConfig::default(), 0)
    }

    #[test]
    fn worker_answers_decide_requests() {
        let agent: Box<dyn Agent<BombermanState>> = Box::new(DoNothingAgent);
        let mut worker = Worker::spawn(0, agent).unwrap();
        let deadline = Instant::now() + Duration::from_secs(1);

        assert!(worker.send(WorkerRequest::Decide {
            tick: 3,
            observation: observation(),
            deadline,
        }));
        let reply = worker.recv_until(3, deadline).unwrap();
        assert_eq!(reply.tick, 3);
        assert_eq!(reply.action, Action::Stop);

        let agent = worker.join().unwrap();
        assert_eq!(agent.name(), "idle");
    }

    #[test]
    fn recv_until_times_out_without_request() {
        let agent: Box<dyn Agent<BombermanState>> = Box::new(DoNothingAgent);
        let mut worker = Worker::spawn(1, agent).unwrap();
        let err = worker
            .recv_until(0, Instant::now() + Duration::from_millis(10))
            .unwrap_err();
        assert_eq!(err, RecvTimeoutError::Timeout);
        assert!(worker.join().is_some());
    }
}
