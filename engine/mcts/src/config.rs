//! MCTS configuration parameters.

use std::str::FromStr;
use std::time::Duration;

use engine_config::MctsSettings;

use crate::search::SearchError;

/// When a search stops iterating. Exactly one budget is active per search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCondition {
    /// Wall-clock budget; the search also stops early when the time left drops
    /// below twice the average iteration time or below `time_floor`.
    Time(Duration),
    /// Fixed number of select/rollout/backup iterations.
    Iterations(u32),
    /// Budget of forward-model calls, charged `rollout_depth` per iteration.
    FmCalls(u32),
}

/// Which state-value heuristic the search builds from its root state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeuristicKind {
    WinLoss,
    #[default]
    BoardStats,
}

impl FromStr for HeuristicKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "win_loss" => Ok(Self::WinLoss),
            "board_stats" | "custom" => Ok(Self::BoardStats),
            other => Err(format!("unknown heuristic '{other}'")),
        }
    }
}

/// Which policy picks the searching agent's actions during rollouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RolloutKind {
    Random,
    SafeRandom,
    #[default]
    Linear,
}

impl FromStr for RolloutKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(Self::Random),
            "safe_random" => Ok(Self::SafeRandom),
            "linear" => Ok(Self::Linear),
            other => Err(format!("unknown rollout policy '{other}'")),
        }
    }
}

/// Configuration for Monte Carlo Tree Search.
#[derive(Debug, Clone)]
pub struct MctsConfig {
    /// Exploration constant of the UCT formula.
    pub k: f64,

    /// Guards divisions by zero visits and scales the tie-breaking noise.
    pub epsilon: f64,

    /// Maximum tree depth and the depth at which rollouts stop.
    pub rollout_depth: u32,

    pub stop: StopCondition,

    /// Time-mode searches stop once less than this remains.
    pub time_floor: Duration,

    pub heuristic: HeuristicKind,

    pub rollout: RolloutKind,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            k: std::f64::consts::SQRT_2,
            epsilon: 1e-6,
            rollout_depth: 10,
            stop: StopCondition::Time(Duration::from_millis(40)),
            time_floor: Duration::from_millis(5),
            heuristic: HeuristicKind::BoardStats,
            rollout: RolloutKind::Linear,
        }
    }
}

impl MctsConfig {
    /// Create a fast, deterministic config for testing.
    pub fn for_testing() -> Self {
        Self {
            stop: StopCondition::Iterations(50),
            rollout_depth: 4,
            ..Self::default()
        }
    }

    /// Builder pattern: stop after a fixed number of iterations.
    pub fn with_iterations(mut self, n: u32) -> Self {
        self.stop = StopCondition::Iterations(n);
        self
    }

    /// Builder pattern: stop after a forward-model call budget.
    pub fn with_fm_calls(mut self, n: u32) -> Self {
        self.stop = StopCondition::FmCalls(n);
        self
    }

    /// Builder pattern: stop on a wall-clock budget.
    pub fn with_time(mut self, budget: Duration) -> Self {
        self.stop = StopCondition::Time(budget);
        self
    }

    /// Builder pattern: set rollout depth.
    pub fn with_rollout_depth(mut self, depth: u32) -> Self {
        self.rollout_depth = depth;
        self
    }

    /// Builder pattern: set the UCT exploration constant.
    pub fn with_k(mut self, k: f64) -> Self {
        self.k = k;
        self
    }

    pub fn with_heuristic(mut self, heuristic: HeuristicKind) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn with_rollout(mut self, rollout: RolloutKind) -> Self {
        self.rollout = rollout;
        self
    }
}

impl TryFrom<&MctsSettings> for MctsConfig {
    type Error = SearchError;

    fn try_from(settings: &MctsSettings) -> Result<Self, Self::Error> {
        let stop = match settings.stop_type.as_str() {
            "time" => StopCondition::Time(Duration::from_millis(settings.num_time_ms)),
            "iterations" => StopCondition::Iterations(settings.num_iterations),
            "fm_calls" | "fmcalls" => StopCondition::FmCalls(settings.num_fmcalls),
            other => {
                return Err(SearchError::InvalidConfig(format!(
                    "unknown stop type '{other}'"
                )))
            }
        };
        if settings.rollout_depth == 0 {
            return Err(SearchError::InvalidConfig(
                "rollout_depth must be at least 1".into(),
            ));
        }

        Ok(Self {
            k: settings.k,
            epsilon: settings.epsilon,
            rollout_depth: settings.rollout_depth,
            stop,
            time_floor: Duration::from_millis(settings.time_floor_ms),
            heuristic: settings
                .heuristic
                .parse()
                .map_err(SearchError::InvalidConfig)?,
            rollout: settings
                .rollout_policy
                .parse()
                .map_err(SearchError::InvalidConfig)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MctsConfig::default();
        assert!((config.k - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(config.rollout_depth, 10);
        assert_eq!(config.stop, StopCondition::Time(Duration::from_millis(40)));
        assert_eq!(config.rollout, RolloutKind::Linear);
    }

    #[test]
    fn test_builder_pattern() {
        let config = MctsConfig::default()
            .with_iterations(100)
            .with_rollout_depth(3)
            .with_rollout(RolloutKind::SafeRandom);

        assert_eq!(config.stop, StopCondition::Iterations(100));
        assert_eq!(config.rollout_depth, 3);
        assert_eq!(config.rollout, RolloutKind::SafeRandom);
    }

    #[test]
    fn test_from_central_settings() {
        let settings = MctsSettings::default();
        let config = MctsConfig::try_from(&settings).unwrap();
        assert_eq!(config.stop, StopCondition::Time(Duration::from_millis(40)));
        assert_eq!(config.time_floor, Duration::from_millis(5));
        assert_eq!(config.heuristic, HeuristicKind::BoardStats);

        let fm = MctsSettings {
            stop_type: "fm_calls".into(),
            rollout_policy: "random".into(),
            ..MctsSettings::default()
        };
        let config = MctsConfig::try_from(&fm).unwrap();
        assert_eq!(config.stop, StopCondition::FmCalls(2000));
        assert_eq!(config.rollout, RolloutKind::Random);
    }

    #[test]
    fn test_rejects_unknown_settings() {
        let bad_stop = MctsSettings {
            stop_type: "forever".into(),
            ..MctsSettings::default()
        };
        assert!(matches!(
            MctsConfig::try_from(&bad_stop),
            Err(SearchError::InvalidConfig(_))
        ));

        let bad_policy = MctsSettings {
            rollout_policy: "neural".into(),
            ..MctsSettings::default()
        };
        assert!(MctsConfig::try_from(&bad_policy).is_err());
    }
}
