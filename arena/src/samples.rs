//! Training samples for the linear rollout policy
//!
//! Each tick, every agent still playing contributes one sample: its view of
//! the board, the windows around it, where it stands and what it chose. When
//! the game ends, samples from losing agents and `Stop` decisions are
//! dropped.

use std::ops::RangeInclusive;

use engine_core::{Action, AgentId, ForwardModel, GameResult, Position};
use mcts::position_fraction;
use serde::Serialize;

/// Spans of the clipped windows taken around the agent, smallest first.
pub const WINDOW_SPANS: RangeInclusive<usize> = 5..=8;

/// One decision as the agent saw it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSample {
    pub agent: AgentId,
    pub tick: u32,
    pub position: Position,
    /// Whole board, row-major
    pub board: Vec<i32>,
    /// One `Board::clipped_window` per span in `WINDOW_SPANS`
    pub windows: Vec<Vec<i32>>,
    pub position_fraction: f64,
    pub action: Action,
}

impl TrainingSample {
    pub fn capture<M: ForwardModel>(observation: &M, agent: AgentId, action: Action) -> Self {
        let board = observation.board();
        let position = observation.agent_position(agent);
        Self {
            agent,
            tick: observation.tick(),
            position,
            board: board.codes(),
            windows: WINDOW_SPANS
                .map(|span| board.clipped_window(position, span))
                .collect(),
            position_fraction: position_fraction(position, board.size()),
            action,
        }
    }
}

#[derive(Debug, Default)]
pub struct SampleRecorder {
    pending: Vec<TrainingSample>,
}

impl SampleRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the joint action of one tick. Agents already out are skipped.
    pub fn record<M: ForwardModel>(
        &mut self,
        observations: &[M],
        results: &[GameResult],
        joint: &[Action],
    ) {
        for (agent, (observation, &action)) in observations.iter().zip(joint).enumerate() {
            if results.get(agent).is_some_and(|r| r.is_incomplete()) {
                self.pending
                    .push(TrainingSample::capture(observation, agent, action));
            }
        }
    }

    /// Samples captured so far.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Keep the samples worth learning from: agents that did not lose, and
    /// decisions other than `Stop`. Leaves the recorder empty.
    pub fn finish(&mut self, results: &[GameResult]) -> Vec<TrainingSample> {
        let mut samples = std::mem::take(&mut self.pending);
        samples.retain(|s| {
            s.action != Action::Stop && results.get(s.agent) != Some(&GameResult::Loss)
        });
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use games_bomberman::{BombermanConfig, BombermanState};

    fn state() -> BombermanState {
        BombermanState::new(BombermanConfig::default(), 3)
    }

    #[test]
    fn capture_reads_the_agents_view() {
        let state = state();
        let sample = TrainingSample::capture(&state.observation_for(2), 2, Action::Left);

        assert_eq!(sample.agent, 2);
        assert_eq!(sample.tick, 0);
        assert_eq!(sample.position, Position::new(10, 10));
        assert_eq!(sample.board.len(), 121);
        assert_eq!(sample.windows.len(), 4);
        // From the far corner every window fits on the board and ends at the agent
        for (window, span) in sample.windows.iter().zip(WINDOW_SPANS) {
            assert_eq!(window.len(), (span + 1) * (span + 1));
            assert_eq!(window.last(), Some(&engine_core::Tile::Agent2.code()));
        }
        assert!((sample.position_fraction - 20.0 / 121.0).abs() < 1e-12);
    }

    #[test]
    fn record_skips_agents_already_out() {
        let state = state();
        let observations: Vec<_> = (0..4).map(|id| state.observation_for(id)).collect();
        let results = [
            GameResult::Incomplete,
            GameResult::Loss,
            GameResult::Incomplete,
            GameResult::Incomplete,
        ];

        let mut recorder = SampleRecorder::new();
        recorder.record(&observations, &results, &[Action::Bomb; 4]);
        assert_eq!(recorder.len(), 3);
    }

    #[test]
    fn finish_drops_losers_and_stops() {
        let state = state();
        let observations: Vec<_> = (0..4).map(|id| state.observation_for(id)).collect();
        let playing = [GameResult::Incomplete; 4];

        let mut recorder = SampleRecorder::new();
        recorder.record(
            &observations,
            &playing,
            &[Action::Right, Action::Stop, Action::Up, Action::Bomb],
        );
        recorder.record(
            &observations,
            &playing,
            &[Action::Down, Action::Up, Action::Stop, Action::Left],
        );

        let results = [
            GameResult::Win,
            GameResult::Tie,
            GameResult::Loss,
            GameResult::Tie,
        ];
        let samples = recorder.finish(&results);
        let kept: Vec<(AgentId, Action)> = samples.iter().map(|s| (s.agent, s.action)).collect();
        assert_eq!(
            kept,
            vec![
                (0, Action::Right),
                (3, Action::Bomb),
                (0, Action::Down),
                (1, Action::Up),
                (3, Action::Left),
            ]
        );
        assert!(recorder.is_empty());
    }
}
