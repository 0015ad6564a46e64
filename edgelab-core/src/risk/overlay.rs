//! Martingale and grid sizing overlays.
//!
//! Both overlays are pure transitions on [`StrategyState`]; the governor decides when they run.

use crate::domain::{GridParams, MartingaleParams};
use crate::strategies::StrategyState;

/// Volume for the current martingale level: `base × multiplier^level`.
pub fn martingale_volume(params: &MartingaleParams, level: u32) -> f64 {
    params.base_volume * params.multiplier.powi(level.min(params.max_level) as i32)
}

/// Martingale level after a closed trade: +1 after a loss (capped), 0 after a win,
/// unchanged at break-even.
pub fn next_martingale_level(params: &MartingaleParams, level: u32, pnl: f64) -> u32 {
    if pnl < 0.0 {
        (level + 1).min(params.max_level)
    } else if pnl > 0.0 {
        0
    } else {
        level
    }
}

/// Lots still available under the martingale exposure cap.
pub fn remaining_exposure(params: &MartingaleParams, state: &StrategyState) -> f64 {
    (params.max_exposure - state.open_exposure).max(0.0)
}

/// Register one grid entry at `price`. After `max_levels` entries the grid resets so the next
/// entry opens a fresh grid.
pub fn register_grid_entry(params: &GridParams, state: &mut StrategyState, price: f64) {
    state.grid_level_count += 1;
    state.last_grid_price = Some(price);
    if state.grid_level_count >= params.max_levels {
        state.grid_level_count = 0;
        state.last_grid_price = None;
    }
}
