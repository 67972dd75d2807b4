//! Forward model trait consumed by the search engine and the tick loop.
//!
//! A forward model is a complete, cloneable game state that knows how to
//! advance itself given one action per agent. Cloning must produce an
//! independent deep copy: searches mutate their own copies freely and never
//! touch the authoritative state owned by the tick loop.

use crate::action::{Action, AgentId, Message};
use crate::board::{Board, Position};
use crate::rules::{GameMode, GameResult};

/// Game state plus rules, advanced one tick at a time.
///
/// `Clone` is the `copy()` capability. Implementations must be deterministic
/// given the state (including any internal RNG seed) and the joint action.
pub trait ForwardModel: Clone + Send + std::fmt::Debug + 'static {
    /// Advance the state by one tick. `actions` holds one entry per agent
    /// slot; eliminated agents' entries are ignored.
    fn next(&mut self, actions: &[Action]);

    /// Whether the game has finished for every agent.
    fn is_terminal(&self) -> bool;

    /// Current tick count.
    fn tick(&self) -> u32;

    /// Mode the state was created with.
    fn game_mode(&self) -> GameMode;

    /// Number of agent slots, alive or not.
    fn num_agents(&self) -> usize;

    /// Agent whose point of view this copy represents.
    fn current_agent(&self) -> AgentId;

    /// Number of actions available to an agent on every tick.
    fn legal_action_count(&self) -> usize;

    /// Board snapshot, as seen by `current_agent` when partially observable.
    fn board(&self) -> &Board;

    /// Cell occupied by the agent.
    fn agent_position(&self, id: AgentId) -> Position;

    /// Result for the agent; `Incomplete` while it is still playing.
    fn winner_of(&self, id: AgentId) -> GameResult;

    /// Agents still alive.
    fn alive_agents(&self) -> Vec<AgentId>;

    /// Bomb blast strength currently held by the agent.
    fn blast_strength(&self, id: AgentId) -> u32;

    /// Copy of this state filtered for what `id` is allowed to see, with
    /// `current_agent` set to `id`.
    fn observation_for(&self, id: AgentId) -> Self;

    /// Replace the agent's radio inbox.
    fn set_message(&mut self, id: AgentId, message: Message);

    /// Agent's radio inbox.
    fn message_of(&self, id: AgentId) -> Message;

    /// Tile codes of the window of `radius` centred on `pos`, clamped at the
    /// board edge.
    fn board_window(&self, pos: Position, radius: usize) -> Vec<i32> {
        self.board().window(pos, radius)
    }
}
