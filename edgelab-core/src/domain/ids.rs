use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sequential position identifier, unique within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionId(pub u64);

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Deterministic ID generator. One per run; IDs depend only on entry order.
#[derive(Debug, Clone, Default)]
pub struct IdGen {
    next_position: u64,
}

impl IdGen {
    pub fn next_position_id(&mut self) -> PositionId {
        self.next_position += 1;
        PositionId(self.next_position)
    }
}

/// The closed set of supported strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyId {
    SessionBreakout,
    MeanReversion,
    TrendPullback,
    StructureBreak,
    MomentumScalp,
    Martingale,
    Grid,
}

impl StrategyId {
    pub const ALL: [StrategyId; 7] = [
        StrategyId::SessionBreakout,
        StrategyId::MeanReversion,
        StrategyId::TrendPullback,
        StrategyId::StructureBreak,
        StrategyId::MomentumScalp,
        StrategyId::Martingale,
        StrategyId::Grid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyId::SessionBreakout => "session_breakout",
            StrategyId::MeanReversion => "mean_reversion",
            StrategyId::TrendPullback => "trend_pullback",
            StrategyId::StructureBreak => "structure_break",
            StrategyId::MomentumScalp => "momentum_scalp",
            StrategyId::Martingale => "martingale",
            StrategyId::Grid => "grid",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown strategy '{0}'")]
pub struct UnknownStrategy(pub String);

impl FromStr for StrategyId {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}
