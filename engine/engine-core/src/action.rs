//! Agent actions and joint actions.

use serde::{Deserialize, Serialize};

/// Number of actions every agent can take on any tick.
pub const NUM_ACTIONS: usize = 6;

/// Length of a team-radio message.
pub const MESSAGE_LENGTH: usize = 2;

/// Index of an agent slot (0-based).
pub type AgentId = usize;

/// Team-radio payload exchanged between teammates once per tick.
pub type Message = [i32; MESSAGE_LENGTH];

/// One action per agent slot, applied atomically by the forward model.
pub type JointAction = Vec<Action>;

/// Discrete agent action, in the engine's native ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    /// No-op. Also the forced action for eliminated or overrunning agents.
    #[default]
    Stop = 0,
    Up = 1,
    Down = 2,
    Left = 3,
    Right = 4,
    Bomb = 5,
}

impl Action {
    /// All actions in native index order.
    pub const ALL: [Action; NUM_ACTIONS] = [
        Action::Stop,
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
        Action::Bomb,
    ];

    /// Native action index.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up an action by native index.
    pub fn from_index(index: usize) -> Option<Action> {
        Self::ALL.get(index).copied()
    }

    /// Grid displacement `(dx, dy)` of this action. `y` grows downwards.
    pub fn direction(self) -> (i32, i32) {
        match self {
            Action::Up => (0, -1),
            Action::Down => (0, 1),
            Action::Left => (-1, 0),
            Action::Right => (1, 0),
            Action::Stop | Action::Bomb => (0, 0),
        }
    }

    /// Whether this action moves the agent.
    pub fn is_move(self) -> bool {
        self.direction() != (0, 0)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Action::Stop => "STOP",
            Action::Up => "UP",
            Action::Down => "DOWN",
            Action::Left => "LEFT",
            Action::Right => "RIGHT",
            Action::Bomb => "BOMB",
        };
        f.write_str(name)
    }
}

/// Build a joint action where every slot is [`Action::Stop`].
pub fn idle_joint_action(num_agents: usize) -> JointAction {
    vec![Action::Stop; num_agents]
}
