//! State-value heuristics scoring the end of a rollout.
//!
//! Heuristics are built from the root state when a search starts, so they can
//! score a leaf relative to where the agent stood when it began thinking.

use engine_core::{same_team, AgentId, ForwardModel, GameResult, Tile};

use crate::config::HeuristicKind;

/// Scores a simulated state from the searching agent's point of view.
pub trait StateHeuristic<M: ForwardModel>: Send {
    fn evaluate_state(&self, state: &M) -> f64;
}

/// Build the heuristic selected in the config from the search's root state.
pub fn build<M: ForwardModel>(
    kind: HeuristicKind,
    root: &M,
    agent: AgentId,
) -> Box<dyn StateHeuristic<M>> {
    match kind {
        HeuristicKind::WinLoss => Box::new(WinLossHeuristic::new(agent)),
        HeuristicKind::BoardStats => Box::new(BoardStatsHeuristic::new(root, agent)),
    }
}

/// +1 if the agent has won, -1 if it has lost, 0 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct WinLossHeuristic {
    agent: AgentId,
}

impl WinLossHeuristic {
    pub fn new(agent: AgentId) -> Self {
        Self { agent }
    }
}

impl<M: ForwardModel> StateHeuristic<M> for WinLossHeuristic {
    fn evaluate_state(&self, state: &M) -> f64 {
        match state.winner_of(self.agent) {
            GameResult::Win => 1.0,
            GameResult::Loss => -1.0,
            GameResult::Tie | GameResult::Incomplete => 0.0,
        }
    }
}

const FACTOR_ENEMY: f64 = 0.5;
const FACTOR_TEAM: f64 = 0.1;
const FACTOR_WOODS: f64 = 0.1;
const FACTOR_BLAST: f64 = 0.15;
const MAX_ENEMIES: f64 = 3.0;
const MAX_BLAST_STRENGTH: f64 = 10.0;

/// Counts taken from one state, compared against the root's.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardStats {
    pub enemies: usize,
    pub teammates: usize,
    pub woods: usize,
    pub blast_strength: u32,
}

impl BoardStats {
    pub fn of<M: ForwardModel>(state: &M, agent: AgentId) -> Self {
        let mode = state.game_mode();
        let alive = state.alive_agents();
        let allied = |other: AgentId| same_team(mode, agent, other);

        Self {
            enemies: alive
                .iter()
                .filter(|&&id| id != agent && !allied(id))
                .count(),
            teammates: alive
                .iter()
                .filter(|&&id| id != agent && allied(id))
                .count(),
            woods: state.board().count(Tile::Wood),
            blast_strength: state.blast_strength(agent),
        }
    }
}

/// Terminal wins and losses score ±1; anything else is a weighted sum of what
/// changed since the root: enemies eliminated, teammates lost, wood cleared
/// and blast strength gained.
#[derive(Debug, Clone)]
pub struct BoardStatsHeuristic {
    agent: AgentId,
    root: BoardStats,
}

impl BoardStatsHeuristic {
    pub fn new<M: ForwardModel>(root: &M, agent: AgentId) -> Self {
        Self {
            agent,
            root: BoardStats::of(root, agent),
        }
    }

    pub fn score(&self, leaf: &BoardStats) -> f64 {
        let enemies_down = self.root.enemies as f64 - leaf.enemies as f64;
        let teammates_change = leaf.teammates as f64 - self.root.teammates as f64;
        let woods_cleared = self.root.woods as f64 - leaf.woods as f64;
        let blast_gain = leaf.blast_strength as f64 - self.root.blast_strength as f64;
        let max_woods = self.root.woods.max(1) as f64;

        enemies_down / MAX_ENEMIES * FACTOR_ENEMY
            + teammates_change * FACTOR_TEAM
            + woods_cleared / max_woods * FACTOR_WOODS
            + blast_gain / MAX_BLAST_STRENGTH * FACTOR_BLAST
    }
}

impl<M: ForwardModel> StateHeuristic<M> for BoardStatsHeuristic {
    fn evaluate_state(&self, state: &M) -> f64 {
        if state.is_terminal() {
            match state.winner_of(self.agent) {
                GameResult::Win => return 1.0,
                GameResult::Loss => return -1.0,
                _ => {}
            }
        }
        self.score(&BoardStats::of(state, self.agent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{Action, GameMode};
    use games_bomberman::{BombermanConfig, BombermanState};

    fn layout(mode: GameMode, rows: &[&str]) -> BombermanState {
        let config = BombermanConfig {
            mode,
            powerup_chance: 0.0,
            ..BombermanConfig::default()
        };
        BombermanState::from_layout(config, rows, 1).unwrap()
    }

    #[test]
    fn test_win_loss() {
        let mut state = layout(GameMode::Ffa, &["0....", ".....", ".....", ".....", "....1"]);
        let h = WinLossHeuristic::new(1);
        assert_eq!(h.evaluate_state(&state), 0.0);

        state.next(&[Action::Bomb, Action::Stop]);
        for _ in 0..9 {
            state.next(&[Action::Stop, Action::Stop]);
        }
        assert!(state.is_terminal());
        assert_eq!(h.evaluate_state(&state), 1.0);
        assert_eq!(WinLossHeuristic::new(0).evaluate_state(&state), -1.0);
    }

    #[test]
    fn test_board_stats_counts() {
        let state = layout(
            GameMode::Team,
            &["0.+..", ".....", "..+..", ".....", "1.2.3"],
        );
        let stats = BoardStats::of(&state, 0);
        assert_eq!(stats.enemies, 2);
        assert_eq!(stats.teammates, 1);
        assert_eq!(stats.woods, 2);
        assert_eq!(stats.blast_strength, 2);

        let ffa = layout(GameMode::Ffa, &["0.+..", ".....", "..+..", ".....", "1.2.3"]);
        assert_eq!(BoardStats::of(&ffa, 0).enemies, 3);
        assert_eq!(BoardStats::of(&ffa, 0).teammates, 0);
    }

    #[test]
    fn test_board_stats_root_scores_zero() {
        let state = layout(GameMode::Ffa, &["0.+..", ".....", ".....", ".....", "....1"]);
        let h = BoardStatsHeuristic::new(&state, 0);
        assert_eq!(h.evaluate_state(&state), 0.0);
    }

    #[test]
    fn test_board_stats_weights() {
        let root = BoardStats {
            enemies: 3,
            teammates: 1,
            woods: 10,
            blast_strength: 2,
        };
        let h = BoardStatsHeuristic { agent: 0, root };

        let leaf = BoardStats {
            enemies: 2,
            teammates: 0,
            woods: 5,
            blast_strength: 3,
        };
        let expected = (1.0 / 3.0) * 0.5 - 0.1 + 0.5 * 0.1 + 0.1 * 0.15;
        assert!((h.score(&leaf) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_board_stats_rewards_clearing_wood() {
        let mut state = layout(GameMode::Ffa, &["0.+..", ".....", ".....", ".....", "....1"]);
        let h = BoardStatsHeuristic::new(&state, 0);

        state.next(&[Action::Bomb, Action::Stop]);
        state.next(&[Action::Down, Action::Stop]);
        state.next(&[Action::Down, Action::Stop]);
        state.next(&[Action::Right, Action::Stop]);
        for _ in 0..6 {
            state.next(&[Action::Stop, Action::Stop]);
        }
        assert_eq!(state.board().count(Tile::Wood), 0);
        assert!(h.evaluate_state(&state) > 0.0);
    }
}
