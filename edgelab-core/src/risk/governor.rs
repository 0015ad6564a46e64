//! Risk governor: the only writer of [`StrategyState`].
//!
//! Every proposed entry passes through [`RiskGovernor::approve`]: kill-switch, concurrency cap,
//! confidence threshold, bracket orientation, stop distance, then sizing. Sizing risks at most
//! `risk_per_trade_percent` of the *current* balance; overlay volumes are clamped to that limit.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::kill_switch::{HaltRecord, KillSwitch};
use super::overlay::{
    martingale_volume, next_martingale_level, register_grid_entry, remaining_exposure,
};
use crate::domain::{
    BacktestConfiguration, ClosedTrade, ContractSpec, OverlayParams, StrategyId, TradingSignal,
};
use crate::strategies::StrategyState;

/// Approved entry size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sizing {
    pub volume: f64,
    /// Price distance between entry and stop.
    pub stop_distance: f64,
    /// Currency at risk if the stop is hit, before commission.
    pub risk_amount: f64,
}

/// Why an entry was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("trading halted by kill-switch")]
    Halted,
    #[error("concurrent position cap reached")]
    AtCapacity,
    #[error("signal is a hold or below the confidence threshold")]
    NotExecutable,
    #[error("stop or target sits on the wrong side of the entry")]
    InvertedBracket,
    #[error("stop distance is zero")]
    ZeroStopDistance,
    #[error("volume rounds below the contract minimum")]
    BelowMinVolume,
    #[error("martingale exposure cap reached")]
    ExposureExhausted,
}

#[derive(Debug, Clone)]
pub struct RiskGovernor {
    strategy_id: StrategyId,
    risk_per_trade_percent: f64,
    max_concurrent_positions: usize,
    contract: ContractSpec,
    overlay: OverlayParams,
    state: StrategyState,
    kill_switch: KillSwitch,
}

impl RiskGovernor {
    pub fn new(config: &BacktestConfiguration) -> Self {
        Self {
            strategy_id: config.strategy_id,
            risk_per_trade_percent: config.risk_per_trade_percent,
            max_concurrent_positions: config.max_concurrent_positions,
            contract: config.contract.clone(),
            overlay: config.overlay.clone(),
            state: StrategyState::default(),
            kill_switch: KillSwitch::new(config.max_drawdown_percent, config.initial_balance),
        }
    }

    pub fn state(&self) -> &StrategyState {
        &self.state
    }

    pub fn is_halted(&self) -> bool {
        self.kill_switch.is_tripped()
    }

    pub fn halt(&self) -> Option<&HaltRecord> {
        self.kill_switch.halt()
    }

    pub fn into_halt(self) -> Option<HaltRecord> {
        self.kill_switch.into_halt()
    }

    /// Validate and size an entry at `entry_price`.
    pub fn approve(
        &self,
        signal: &TradingSignal,
        entry_price: f64,
        balance: f64,
        open_count: usize,
    ) -> Result<Sizing, Rejection> {
        if self.is_halted() {
            return Err(Rejection::Halted);
        }
        if open_count >= self.max_concurrent_positions {
            return Err(Rejection::AtCapacity);
        }
        let side = match signal.action.side() {
            Some(side) if signal.is_executable() => side,
            _ => return Err(Rejection::NotExecutable),
        };
        // A zero distance is reported separately below.
        let loss_side = (entry_price - signal.stop_loss) * side.sign();
        let profit_side = (signal.take_profit - entry_price) * side.sign();
        if loss_side < 0.0 || profit_side <= 0.0 {
            return Err(Rejection::InvertedBracket);
        }
        let stop_distance = (entry_price - signal.stop_loss).abs();
        if !(stop_distance.is_finite() && stop_distance > 0.0) {
            return Err(Rejection::ZeroStopDistance);
        }

        let risk_budget = balance.max(0.0) * self.risk_per_trade_percent / 100.0;
        let risk_volume = risk_budget / (stop_distance * self.contract.contract_multiplier);

        let raw = match self.strategy_id {
            StrategyId::Martingale => {
                let params = &self.overlay.martingale;
                let remaining = remaining_exposure(params, &self.state);
                if remaining <= 0.0 {
                    return Err(Rejection::ExposureExhausted);
                }
                martingale_volume(params, self.state.martingale_level)
                    .min(remaining)
                    .min(risk_volume)
            }
            StrategyId::Grid => self.overlay.grid.volume.min(risk_volume),
            _ => risk_volume,
        };

        let volume = self.contract.round_volume(raw);
        if volume <= 0.0 {
            return Err(Rejection::BelowMinVolume);
        }
        Ok(Sizing {
            volume,
            stop_distance,
            risk_amount: self.contract.price_move_value(stop_distance, volume),
        })
    }

    /// Entry-time counters. Called exactly once per accepted entry.
    pub fn on_entry(&mut self, volume: f64, price: f64, timestamp: DateTime<Utc>) {
        self.state.open_exposure += volume;
        self.state.last_entry_time = Some(timestamp);
        if self.strategy_id == StrategyId::Grid {
            register_grid_entry(&self.overlay.grid, &mut self.state, price);
        }
    }

    /// Close-time counters. Called exactly once per Closed transition.
    pub fn on_trade_closed(&mut self, trade: &ClosedTrade) {
        let exposure = self.state.open_exposure - trade.volume;
        self.state.open_exposure = if exposure < 1e-9 { 0.0 } else { exposure };

        if trade.is_loser() {
            self.state.consecutive_losses += 1;
        } else if trade.is_winner() {
            self.state.consecutive_losses = 0;
        }
        if self.strategy_id == StrategyId::Martingale {
            self.state.martingale_level = next_martingale_level(
                &self.overlay.martingale,
                self.state.martingale_level,
                trade.pnl,
            );
        }
    }

    /// Run the kill-switch against equity marked at the candle close. Returns `true` when the
    /// switch trips on this call.
    pub fn check_drawdown(
        &mut self,
        timestamp: DateTime<Utc>,
        index: usize,
        peak_equity: f64,
        equity: f64,
    ) -> bool {
        self.kill_switch.check(timestamp, index, peak_equity, equity)
    }

    pub fn record_forced_closures(&mut self, count: usize) {
        self.kill_switch.record_forced_closures(count);
    }
}
