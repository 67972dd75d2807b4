//! MCTS search implementation.
//!
//! Each iteration:
//! 1. Tree policy: from a fresh copy of the root state, descend with UCT,
//!    expanding the first node that still has an empty child slot
//! 2. Rollout: play on with the rollout policy until the depth limit or a
//!    terminal state, then score the state with the heuristic
//! 3. Backpropagation: add the score to every node on the path
//!
//! The searching agent plays the tree or rollout action at every simulated
//! tick; every other agent plays uniformly at random.

use std::time::{Duration, Instant};

use engine_core::{Action, AgentId, ForwardModel, JointAction, NUM_ACTIONS};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::config::{MctsConfig, StopCondition};
use crate::heuristic::{self, StateHeuristic};
use crate::node::NodeId;
use crate::rollout::{self, random_action, RolloutPolicy};
use crate::tree::{MctsTree, TreeStats};

/// Errors that can occur while setting up an MCTS search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid MCTS configuration: {0}")]
    InvalidConfig(String),

    #[error("Root state offers no actions")]
    NoLegalMoves,

    #[error("Searching agent {agent} is not in a game of {num_agents} agents")]
    UnknownAgent { agent: AgentId, num_agents: usize },
}

/// Result of an MCTS search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Recommended action index
    pub action: usize,

    /// Number of completed iterations
    pub iterations: u32,

    /// Forward-model calls charged against the budget
    pub fm_calls: u32,

    /// Statistics of the finished tree
    pub stats: TreeStats,
}

impl SearchResult {
    /// The recommended action as a game action.
    pub fn game_action(&self) -> Action {
        Action::from_index(self.action).unwrap_or_default()
    }
}

/// MCTS search state. One instance runs exactly one search.
pub struct MctsSearch<M: ForwardModel> {
    tree: MctsTree,
    root_state: M,
    agent: AgentId,
    num_actions: usize,
    config: MctsConfig,
    heuristic: Box<dyn StateHeuristic<M>>,
    rollout_policy: Box<dyn RolloutPolicy<M>>,
    rng: ChaCha20Rng,
    deadline: Option<Instant>,
    fm_calls: u32,
}

impl<M: ForwardModel> MctsSearch<M> {
    /// Create a new search from the given root state. The searching agent is
    /// the root state's observer.
    pub fn new(root_state: M, config: MctsConfig, seed: u64) -> Result<Self, SearchError> {
        let num_actions = root_state.legal_action_count().min(NUM_ACTIONS);
        if num_actions == 0 {
            return Err(SearchError::NoLegalMoves);
        }
        if config.rollout_depth == 0 {
            return Err(SearchError::InvalidConfig(
                "rollout_depth must be at least 1".into(),
            ));
        }
        let agent = root_state.current_agent();
        if agent >= root_state.num_agents() {
            return Err(SearchError::UnknownAgent {
                agent,
                num_agents: root_state.num_agents(),
            });
        }

        let heuristic = heuristic::build(config.heuristic, &root_state, agent);
        let rollout_policy = rollout::build(config.rollout);

        Ok(Self {
            tree: MctsTree::new(num_actions),
            root_state,
            agent,
            num_actions,
            config,
            heuristic,
            rollout_policy,
            rng: ChaCha20Rng::seed_from_u64(seed),
            deadline: None,
            fm_calls: 0,
        })
    }

    /// Cap a time-budgeted search at an absolute instant, such as the
    /// caller's decision deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Run the search until the configured budget is spent and recommend an
    /// action. Always performs at least one iteration.
    pub fn run(&mut self) -> SearchResult {
        let start = Instant::now();
        let deadline = match self.config.stop {
            StopCondition::Time(budget) => {
                let own = start + budget;
                Some(self.deadline.map_or(own, |d| d.min(own)))
            }
            _ => None,
        };

        let mut iterations = 0u32;
        let mut total_time = Duration::ZERO;
        loop {
            let iteration_start = Instant::now();
            let mut state = self.root_state.clone();
            let selected = self.tree_policy(&mut state);
            let value = self.rollout(selected, &mut state);
            self.tree.backpropagate(selected, value);
            iterations += 1;

            trace!(
                node = selected.0,
                depth = self.tree.get(selected).depth,
                value,
                "MCTS iteration complete"
            );

            let stop = match self.config.stop {
                StopCondition::Time(_) => {
                    total_time += iteration_start.elapsed();
                    let avg = total_time / iterations;
                    let remaining = deadline
                        .map(|d| d.saturating_duration_since(Instant::now()))
                        .unwrap_or_default();
                    remaining <= avg * 2 || remaining <= self.config.time_floor
                }
                StopCondition::Iterations(n) => iterations >= n,
                StopCondition::FmCalls(budget) => {
                    self.fm_calls += self.config.rollout_depth;
                    self.fm_calls + self.config.rollout_depth > budget
                }
            };
            if stop {
                break;
            }
        }

        let action = self
            .tree
            .most_visited_action(self.config.epsilon, &mut self.rng);
        let stats = self.tree.stats();
        debug!(
            agent = self.agent,
            action,
            iterations,
            nodes = stats.total_nodes,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "MCTS search finished"
        );

        SearchResult {
            action,
            iterations,
            fm_calls: self.fm_calls,
            stats,
        }
    }

    /// Descend from the root, expanding the first node with an empty slot.
    fn tree_policy(&mut self, state: &mut M) -> NodeId {
        let mut current = self.tree.root();

        while !state.is_terminal() && self.tree.get(current).depth < self.config.rollout_depth {
            if let Some(action) = self.tree.pick_unexpanded(current, &mut self.rng) {
                self.roll(state, action);
                return self.tree.add_child(current, action);
            }
            match self
                .tree
                .uct_select(current, self.config.k, self.config.epsilon, &mut self.rng)
            {
                Some(child) => {
                    let action = self.tree.get(child).action as usize;
                    self.roll(state, action);
                    current = child;
                }
                None => {
                    let bounds = self.tree.get(current).bounds;
                    warn!(node = current.0, ?bounds, "UCT selected no child");
                    break;
                }
            }
        }
        current
    }

    /// Play on from `node` and score the final state.
    fn rollout(&mut self, node: NodeId, state: &mut M) -> f64 {
        let mut depth = self.tree.get(node).depth;
        while depth < self.config.rollout_depth && !state.is_terminal() {
            let action = self.rollout_policy.choose(state, self.agent, &mut self.rng);
            self.roll(state, action.index());
            depth += 1;
        }
        self.heuristic.evaluate_state(state)
    }

    /// Advance `state` one tick: the searching agent plays `action`, everyone
    /// else plays uniformly at random.
    fn roll(&mut self, state: &mut M, action: usize) {
        let joint: JointAction = (0..state.num_agents())
            .map(|id| {
                if id == self.agent {
                    Action::from_index(action).unwrap_or_default()
                } else {
                    random_action(state, &mut self.rng)
                }
            })
            .collect();
        state.next(&joint);
    }

    /// Get the search tree (for inspection/debugging).
    pub fn tree(&self) -> &MctsTree {
        &self.tree
    }

    pub fn num_actions(&self) -> usize {
        self.num_actions
    }
}

/// Convenience function to run a single MCTS search.
pub fn run_mcts<M: ForwardModel>(
    root_state: M,
    config: MctsConfig,
    seed: u64,
) -> Result<SearchResult, SearchError> {
    let mut search = MctsSearch::new(root_state, config, seed)?;
    Ok(search.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HeuristicKind, RolloutKind};
    use games_bomberman::{BombermanConfig, BombermanState};

    fn opening() -> BombermanState {
        BombermanState::new(BombermanConfig::default(), 42)
    }

    #[test]
    fn test_mcts_basic_search() {
        let config = MctsConfig::for_testing().with_iterations(30);
        let result = run_mcts(opening(), config, 42).unwrap();

        assert!(result.action < NUM_ACTIONS);
        assert_eq!(result.iterations, 30);
        assert_eq!(result.stats.root_visits, 30);
        assert!(result.stats.total_nodes > 1);
    }

    #[test]
    fn test_search_is_deterministic_for_a_seed() {
        let config = MctsConfig::for_testing().with_iterations(40);
        let a = run_mcts(opening(), config.clone(), 7).unwrap();
        let b = run_mcts(opening(), config, 7).unwrap();

        assert_eq!(a.action, b.action);
        assert_eq!(a.stats.total_nodes, b.stats.total_nodes);
    }

    #[test]
    fn test_fm_call_budget() {
        let config = MctsConfig::default()
            .with_rollout_depth(10)
            .with_fm_calls(100);
        let result = run_mcts(opening(), config, 1).unwrap();

        assert_eq!(result.iterations, 10);
        assert_eq!(result.fm_calls, 100);
    }

    #[test]
    fn test_tree_depth_bounded_by_rollout_depth() {
        let config = MctsConfig::for_testing()
            .with_rollout_depth(3)
            .with_iterations(300);
        let result = run_mcts(opening(), config, 3).unwrap();
        assert!(result.stats.max_depth <= 3);
    }

    #[test]
    fn test_time_budget_is_respected() {
        let config = MctsConfig::default().with_time(Duration::from_millis(30));
        let start = Instant::now();
        let result = run_mcts(opening(), config, 5).unwrap();

        assert!(result.iterations >= 1);
        assert!(start.elapsed() < Duration::from_millis(250));
    }

    #[test]
    fn test_expired_deadline_runs_one_iteration() {
        let config = MctsConfig::default().with_time(Duration::from_secs(5));
        let mut search = MctsSearch::new(opening(), config, 5)
            .unwrap()
            .with_deadline(Instant::now());
        let result = search.run();
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn test_every_heuristic_and_rollout_combination_runs() {
        for heuristic in [HeuristicKind::WinLoss, HeuristicKind::BoardStats] {
            for rollout in [RolloutKind::Random, RolloutKind::SafeRandom, RolloutKind::Linear] {
                let config = MctsConfig::for_testing()
                    .with_iterations(20)
                    .with_heuristic(heuristic)
                    .with_rollout(rollout);
                let result = run_mcts(opening(), config, 11).unwrap();
                assert!(result.action < NUM_ACTIONS);
            }
        }
    }

    #[test]
    fn test_search_leaves_root_state_untouched() {
        let state = opening();
        let before = state.clone();
        let mut search = MctsSearch::new(state.clone(), MctsConfig::for_testing(), 2).unwrap();
        search.run();

        assert_eq!(state.tick(), before.tick());
        assert_eq!(state.board(), before.board());
        assert_eq!(search.root_state.tick(), 0);
    }

    #[test]
    fn test_root_children_respect_action_count() {
        let mut search = MctsSearch::new(opening(), MctsConfig::for_testing(), 9).unwrap();
        search.run();
        let root = search.tree().get(search.tree().root());
        assert_eq!(root.children.len(), search.num_actions());
        // 50 iterations are enough to try every root action
        assert_eq!(root.expanded_count(), NUM_ACTIONS);
    }

    #[test]
    fn test_unknown_searching_agent() {
        let observation = opening().observation_for(7);
        assert!(matches!(
            MctsSearch::new(observation, MctsConfig::for_testing(), 0),
            Err(SearchError::UnknownAgent { agent: 7, .. })
        ));
    }
}
