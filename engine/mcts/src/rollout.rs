//! Rollout policies.
//!
//! A rollout policy picks the searching agent's action at each simulated step
//! below the tree. Every other agent always plays uniformly at random.

use engine_core::{Action, AgentId, ForwardModel, Position, Tile, NUM_ACTIONS};
use rand::Rng;
use rand_chacha::ChaCha20Rng;

use crate::config::RolloutKind;

/// Chooses the searching agent's action during a rollout.
pub trait RolloutPolicy<M: ForwardModel>: Send {
    fn choose(&self, state: &M, agent: AgentId, rng: &mut ChaCha20Rng) -> Action;
}

/// Build the policy selected in the config.
pub fn build<M: ForwardModel>(kind: RolloutKind) -> Box<dyn RolloutPolicy<M>> {
    match kind {
        RolloutKind::Random => Box::new(RandomRollout),
        RolloutKind::SafeRandom => Box::new(SafeRandomRollout),
        RolloutKind::Linear => Box::new(LinearRolloutPolicy::pretrained()),
    }
}

/// Uniform over the state's legal actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomRollout;

impl<M: ForwardModel> RolloutPolicy<M> for RandomRollout {
    fn choose(&self, state: &M, _agent: AgentId, rng: &mut ChaCha20Rng) -> Action {
        random_action(state, rng)
    }
}

pub(crate) fn random_action<M: ForwardModel>(state: &M, rng: &mut ChaCha20Rng) -> Action {
    let n = state.legal_action_count().clamp(1, NUM_ACTIONS);
    Action::from_index(rng.gen_range(0..n)).unwrap_or_default()
}

/// Random action that never steps off the board or into flames.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafeRandomRollout;

impl<M: ForwardModel> RolloutPolicy<M> for SafeRandomRollout {
    fn choose(&self, state: &M, agent: AgentId, rng: &mut ChaCha20Rng) -> Action {
        let pos = state.agent_position(agent);
        let board = state.board();
        let mut candidates: Vec<Action> = Action::ALL.to_vec();

        while !candidates.is_empty() {
            let pick = rng.gen_range(0..candidates.len());
            let action = candidates[pick];
            match board.get(pos.offset(action.direction())) {
                Some(tile) if tile != Tile::Flames => return action,
                _ => {
                    candidates.swap_remove(pick);
                }
            }
        }
        random_action(state, rng)
    }
}

/// Native action indices for the linear policy's five outputs, in output
/// order: BOMB, DOWN, LEFT, RIGHT, UP.
pub const ACTION_LOOKUP: [usize; 5] = [5, 2, 3, 4, 1];

/// Window radius around the agent fed to the linear policy.
pub const WINDOW_RADIUS: usize = 1;

/// Number of input features: the 3x3 window plus the position fraction.
pub const NUM_FEATURES: usize = (2 * WINDOW_RADIUS + 1) * (2 * WINDOW_RADIUS + 1) + 1;

const PRETRAINED_WEIGHTS: [[f64; NUM_FEATURES]; 5] = [
    [
        2.19717309e+00, 4.64529639e+00, 2.77838425e+00, 3.06246351e+00, 7.41721097e-01,
        1.87122520e+00, 1.45809931e+00, 3.64424456e+00, 2.23077307e+00, -1.52512944e-01,
    ],
    [
        -9.55801330e-02, -1.40246906e+00, -4.81308985e-01, -6.75002477e-01, 1.11072134e-01,
        -7.74992338e-01, 7.93618695e-03, -1.56797015e+00, 2.58024242e-01, -1.49090382e-02,
    ],
    [
        -1.34868612e-01, -8.18542144e-01, -1.52756295e+00, -7.88978566e-01, 3.88948649e-02,
        3.35652343e-01, 2.44020076e-01, -4.89691340e-01, 5.57369693e-01, 2.47142935e-01,
    ],
    [
        -2.20120303e+00, -5.98006665e-01, -1.42887656e-01, -1.07052096e+00, 9.23005511e-01,
        -5.91510628e-01, -5.11005727e-01, 1.43067703e-01, 5.29314016e-01, -7.95374392e-02,
    ],
    [
        2.34478690e-01, -1.82627851e+00, -6.26624657e-01, -5.27961511e-01, 3.13174159e-02,
        -8.40374573e-01, -1.19904985e+00, -1.72965078e+00, 8.86065121e-01, -1.83513696e-04,
    ],
];

/// Map a linear-policy output slot to the game action it stands for.
pub fn lookup_action(slot: usize) -> Action {
    ACTION_LOOKUP
        .get(slot)
        .and_then(|&native| Action::from_index(native))
        .unwrap_or_default()
}

/// Normalised exponentials. Shifts by the max before exponentiating.
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Feature vector for `agent`: the tile codes of the window centred on the
/// agent (row-major, off-board cells read as rigid) followed by the position
/// fraction `(x + y) / size²`.
pub fn features<M: ForwardModel>(state: &M, agent: AgentId) -> [f64; NUM_FEATURES] {
    let pos = state.agent_position(agent);
    let window = state.board_window(pos, WINDOW_RADIUS);

    let mut out = [0.0; NUM_FEATURES];
    for (slot, code) in out.iter_mut().zip(window) {
        *slot = code as f64;
    }
    out[NUM_FEATURES - 1] = position_fraction(pos, state.board().size());
    out
}

/// Where the agent stands on the board as `(x + y) / size²`.
pub fn position_fraction(pos: Position, size: usize) -> f64 {
    let size = size.max(1) as f64;
    (pos.x + pos.y) as f64 / (size * size)
}

/// Fixed pretrained linear policy: `exp(w . f)` per output, softmax, argmax.
#[derive(Debug, Clone)]
pub struct LinearRolloutPolicy {
    weights: [[f64; NUM_FEATURES]; 5],
}

impl LinearRolloutPolicy {
    pub fn pretrained() -> Self {
        Self {
            weights: PRETRAINED_WEIGHTS,
        }
    }

    pub fn with_weights(weights: [[f64; NUM_FEATURES]; 5]) -> Self {
        Self { weights }
    }

    /// Output-slot probabilities for a feature vector.
    pub fn probabilities(&self, features: &[f64; NUM_FEATURES]) -> Vec<f64> {
        let scores: Vec<f64> = self
            .weights
            .iter()
            .map(|row| row.iter().zip(features).map(|(w, f)| w * f).sum::<f64>())
            .collect();
        softmax(&scores)
    }

    /// Highest-probability output slot; later slots win ties.
    pub fn best_slot(&self, features: &[f64; NUM_FEATURES]) -> usize {
        let mut best = 0;
        let mut best_p = f64::NEG_INFINITY;
        for (slot, p) in self.probabilities(features).into_iter().enumerate() {
            if p >= best_p {
                best_p = p;
                best = slot;
            }
        }
        best
    }
}

impl<M: ForwardModel> RolloutPolicy<M> for LinearRolloutPolicy {
    fn choose(&self, state: &M, agent: AgentId, _rng: &mut ChaCha20Rng) -> Action {
        lookup_action(self.best_slot(&features(state, agent)))
    }
}
