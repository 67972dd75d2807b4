//! Core traits and types for the Blastgrid decision engine
//!
//! This crate provides the abstractions shared by every other crate:
//! - `ForwardModel`: cloneable game state that advances one tick per joint action
//! - `Action` / `JointAction`: the discrete action set in native engine order
//! - `Board` / `Tile`: square tile grid with clamped window extraction
//! - `GameResult` / `GameMode`: per-agent outcomes and end-of-game rules

pub mod action;
pub mod board;
pub mod model;
pub mod rules;

// Re-export main types for convenience
pub use action::{
    idle_joint_action, Action, AgentId, JointAction, Message, MESSAGE_LENGTH, NUM_ACTIONS,
};
pub use board::{Board, Position, Tile};
pub use model::ForwardModel;
pub use rules::{
    final_rewards, is_ended, same_team, team_of, teammate_of, GameMode, GameResult,
};
