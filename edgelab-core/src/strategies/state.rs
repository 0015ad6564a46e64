//! Per-run strategy counters. Owned by the risk governor; strategies only read them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyState {
    /// Martingale doubling level; 0 after a win.
    pub martingale_level: u32,
    pub consecutive_losses: u32,
    /// Grid entries since the last reset.
    pub grid_level_count: u32,
    pub last_grid_price: Option<f64>,
    /// Total volume of open positions, in lots.
    pub open_exposure: f64,
    pub last_entry_time: Option<DateTime<Utc>>,
}
