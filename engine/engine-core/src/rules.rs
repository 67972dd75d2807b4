//! Game results, modes and end-of-game rules shared by models and runners.

use serde::{Deserialize, Serialize};

use crate::action::AgentId;

/// Per-agent outcome. Stays `Incomplete` until the agent is eliminated or
/// the game ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameResult {
    Win,
    Loss,
    Tie,
    #[default]
    Incomplete,
}

impl GameResult {
    /// Terminal reward delivered to an agent with this result.
    pub fn reward(self) -> f64 {
        match self {
            GameResult::Win => 1.0,
            GameResult::Loss => -1.0,
            GameResult::Tie | GameResult::Incomplete => 0.0,
        }
    }

    #[inline]
    pub fn is_incomplete(self) -> bool {
        self == GameResult::Incomplete
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GameResult::Win => "WIN",
            GameResult::Loss => "LOSS",
            GameResult::Tie => "TIE",
            GameResult::Incomplete => "INCOMPLETE",
        };
        f.write_str(name)
    }
}

/// How agents are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Free for all.
    #[default]
    Ffa,
    /// Two teams, no communication.
    Team,
    /// Two teams with a per-tick radio message between teammates.
    TeamRadio,
}

impl GameMode {
    pub fn is_team(self) -> bool {
        matches!(self, GameMode::Team | GameMode::TeamRadio)
    }
}

impl std::str::FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ffa" => Ok(GameMode::Ffa),
            "team" => Ok(GameMode::Team),
            "team_radio" | "teamradio" => Ok(GameMode::TeamRadio),
            other => Err(format!(
                "unknown game mode '{}', expected ffa, team or team_radio",
                other
            )),
        }
    }
}

/// Team index of an agent in team modes: slots alternate between teams,
/// so with four agents the teams are {0, 2} and {1, 3}.
#[inline]
pub fn team_of(id: AgentId) -> usize {
    id % 2
}

/// Whether two agents play on the same side under `mode`.
pub fn same_team(mode: GameMode, a: AgentId, b: AgentId) -> bool {
    if mode.is_team() {
        team_of(a) == team_of(b)
    } else {
        a == b
    }
}

/// Radio partner of `id` among `num_agents` slots.
pub fn teammate_of(id: AgentId, num_agents: usize) -> AgentId {
    if num_agents < 2 {
        return id;
    }
    (id + num_agents / 2) % num_agents
}

/// End-of-game rule applied by the tick loop.
///
/// Every game ends at `max_ticks`. Before that, a free-for-all ends once at
/// most one agent is alive and team games end once only one team has agents
/// left alive.
pub fn is_ended(tick: u32, max_ticks: u32, mode: GameMode, alive: &[AgentId]) -> bool {
    if tick >= max_ticks {
        return true;
    }
    match mode {
        GameMode::Ffa => alive.len() <= 1,
        GameMode::Team | GameMode::TeamRadio => match alive.first() {
            None => true,
            Some(&first) => alive.iter().all(|&id| team_of(id) == team_of(first)),
        },
    }
}

/// Rewards for every agent given the final results.
pub fn final_rewards(results: &[GameResult]) -> Vec<f64> {
    results.iter().map(|r| r.reward()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewards() {
        let rewards = final_rewards(&[
            GameResult::Win,
            GameResult::Loss,
            GameResult::Tie,
            GameResult::Incomplete,
        ]);
        assert_eq!(rewards, vec![1.0, -1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_ffa_end() {
        assert!(!is_ended(10, 800, GameMode::Ffa, &[0, 1]));
        assert!(is_ended(10, 800, GameMode::Ffa, &[3]));
        assert!(is_ended(10, 800, GameMode::Ffa, &[]));
        assert!(is_ended(800, 800, GameMode::Ffa, &[0, 1, 2, 3]));
    }

    #[test]
    fn test_team_end() {
        // 0 and 2 share a team
        assert!(is_ended(5, 800, GameMode::Team, &[0, 2]));
        assert!(!is_ended(5, 800, GameMode::TeamRadio, &[0, 1]));
        assert!(is_ended(5, 800, GameMode::TeamRadio, &[1, 3]));
    }

    #[test]
    fn test_teammates() {
        assert_eq!(teammate_of(0, 4), 2);
        assert_eq!(teammate_of(3, 4), 1);
        assert!(same_team(GameMode::Team, 1, 3));
        assert!(!same_team(GameMode::Ffa, 1, 3));
        assert!(same_team(GameMode::Ffa, 2, 2));
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("FFA".parse::<GameMode>(), Ok(GameMode::Ffa));
        assert_eq!("team_radio".parse::<GameMode>(), Ok(GameMode::TeamRadio));
        assert!("coop".parse::<GameMode>().is_err());
    }
}
