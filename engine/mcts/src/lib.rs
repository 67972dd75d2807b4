//! Rollout-based Monte Carlo Tree Search for Blastgrid agents.
//!
//! This crate provides an MCTS implementation that works with any game
//! implementing the `engine-core` ForwardModel trait.
//!
//! # Overview
//!
//! Every iteration copies the root state and runs three phases:
//!
//! 1. **Tree policy**: descend with UCT (values normalised by the parent's
//!    observed bounds, tie-breaking noise), expanding the first node that
//!    still has an empty child slot
//! 2. **Rollout**: keep simulating with a [`RolloutPolicy`] until the depth
//!    limit or the end of the game, then score the state with a
//!    [`StateHeuristic`] built from the root
//! 3. **Backpropagation**: add the score, and update min/max bounds, on every
//!    node from the leaf to the root
//!
//! Searches stop on a wall-clock budget, an iteration count or a
//! forward-model call budget, and recommend the most visited root action.
//!
//! # Usage
//!
//! ```rust,ignore
//! use games_bomberman::{BombermanConfig, BombermanState};
//! use mcts::{run_mcts, MctsConfig};
//!
//! let state = BombermanState::new(BombermanConfig::default(), 42);
//! let config = MctsConfig::for_testing().with_iterations(200);
//!
//! let result = run_mcts(state.observation_for(0), config, 42).unwrap();
//! println!("Best action: {}", result.game_action());
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         MctsSearch                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │  MctsTree   │  │ root state  │  │ RolloutPolicy +     │  │
//! │  │  (arena)    │  │ (M: Clone)  │  │ StateHeuristic      │  │
//! │  └──────┬──────┘  └──────┬──────┘  └──────────┬──────────┘  │
//! │         │                │                    │             │
//! │         ▼                ▼                    ▼             │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │        tree policy → rollout → backpropagate         │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod heuristic;
pub mod node;
pub mod rollout;
pub mod search;
pub mod tree;

// Re-export main types
pub use config::{HeuristicKind, MctsConfig, RolloutKind, StopCondition};
pub use heuristic::{BoardStats, BoardStatsHeuristic, StateHeuristic, WinLossHeuristic};
pub use node::{MctsNode, NodeId};
pub use rollout::{
    features, lookup_action, position_fraction, softmax, LinearRolloutPolicy, RandomRollout,
    RolloutPolicy, SafeRandomRollout, ACTION_LOOKUP,
};
pub use search::{run_mcts, MctsSearch, SearchError, SearchResult};
pub use tree::{noise, normalise, MctsTree, TreeStats};
