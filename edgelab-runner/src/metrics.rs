//! Performance metrics: pure functions over the equity curve and the closed-trade ledger.
//!
//! Every ratio falls back to 0.0 when its denominator is zero, so a result never carries NaN
//! or infinity. The one sentinel is the profit factor: 100.0 when there are profits and no
//! losses.

use chrono::{DateTime, Utc};
use edgelab_core::domain::{ClosedTrade, EquityPoint, ExitReason};
use serde::{Deserialize, Serialize};

/// Profit factor reported when a run has gross profit and no gross loss.
pub const PROFIT_FACTOR_SENTINEL: f64 = 100.0;

const SECONDS_PER_YEAR: f64 = 365.25 * 86_400.0;

/// Aggregate statistics for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    // ── Returns ──
    pub total_return: f64,
    pub total_return_percent: f64,
    /// CAGR over elapsed calendar time, in percent.
    pub annualized_return_percent: f64,

    // ── Trades ──
    pub trade_count: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub gross_profit: f64,
    /// Magnitude of the summed losses (non-negative).
    pub gross_loss: f64,
    pub average_win: f64,
    /// Mean P&L of losing trades (non-positive).
    pub average_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub expectancy: f64,
    pub longest_win_streak: usize,
    pub longest_loss_streak: usize,
    pub average_mfe: f64,
    pub average_mae: f64,
    pub average_duration_candles: f64,
    pub average_duration_seconds: f64,
    pub exit_reasons: ExitReasonCounts,

    // ── Risk ──
    pub max_drawdown: f64,
    /// Percent of the equity peak at which the deepest drawdown was measured.
    pub max_drawdown_percent: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    /// Annualization factor inferred from the median candle interval.
    pub periods_per_year: f64,
}

/// How many trades closed for each reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitReasonCounts {
    pub stop_loss: usize,
    pub take_profit: usize,
    pub end_of_test: usize,
    pub fail_safe: usize,
}

impl ExitReasonCounts {
    pub fn from_trades(trades: &[ClosedTrade]) -> Self {
        let mut counts = Self::default();
        for trade in trades {
            match trade.exit_reason {
                ExitReason::StopLoss => counts.stop_loss += 1,
                ExitReason::TakeProfit => counts.take_profit += 1,
                ExitReason::EndOfTest => counts.end_of_test += 1,
                ExitReason::FailSafe => counts.fail_safe += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.stop_loss + self.take_profit + self.end_of_test + self.fail_safe
    }
}

impl PerformanceMetrics {
    /// Compute all metrics for a run that started at `initial_balance`.
    pub fn compute(
        initial_balance: f64,
        equity_curve: &[EquityPoint],
        trades: &[ClosedTrade],
    ) -> Self {
        let final_equity = equity_curve.last().map_or(initial_balance, |p| p.equity);
        let total_return = final_equity - initial_balance;
        let annualized = annualized_return_percent(initial_balance, equity_curve);
        let (max_dd, max_dd_pct) = max_drawdown(initial_balance, equity_curve);
        let ppy = periods_per_year(equity_curve);
        let returns = period_returns(initial_balance, equity_curve);

        let gross_profit = gross_profit(trades);
        let gross_loss = gross_loss(trades);
        let winners: Vec<f64> = trades.iter().filter(|t| t.is_winner()).map(|t| t.pnl).collect();
        let losers: Vec<f64> = trades.iter().filter(|t| t.is_loser()).map(|t| t.pnl).collect();

        Self {
            total_return,
            total_return_percent: ratio(total_return, initial_balance) * 100.0,
            annualized_return_percent: annualized,

            trade_count: trades.len(),
            winning_trades: winners.len(),
            losing_trades: losers.len(),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(gross_profit, gross_loss),
            gross_profit,
            gross_loss,
            average_win: mean(&winners),
            average_loss: mean(&losers),
            largest_win: winners.iter().copied().fold(0.0, f64::max),
            largest_loss: losers.iter().copied().fold(0.0, f64::min),
            expectancy: mean(&trades.iter().map(|t| t.pnl).collect::<Vec<_>>()),
            longest_win_streak: longest_streak(trades, ClosedTrade::is_winner),
            longest_loss_streak: longest_streak(trades, ClosedTrade::is_loser),
            average_mfe: mean(
                &trades.iter().map(|t| t.max_favorable_excursion).collect::<Vec<_>>(),
            ),
            average_mae: mean(
                &trades.iter().map(|t| t.max_adverse_excursion).collect::<Vec<_>>(),
            ),
            average_duration_candles: mean(
                &trades.iter().map(|t| t.duration_candles as f64).collect::<Vec<_>>(),
            ),
            average_duration_seconds: mean(
                &trades.iter().map(|t| t.duration_seconds as f64).collect::<Vec<_>>(),
            ),
            exit_reasons: ExitReasonCounts::from_trades(trades),

            max_drawdown: max_dd,
            max_drawdown_percent: max_dd_pct,
            sharpe_ratio: sharpe_ratio(&returns, ppy),
            sortino_ratio: sortino_ratio(&returns, ppy),
            calmar_ratio: ratio(annualized, max_dd_pct),
            periods_per_year: ppy,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Sum of winning P&L.
pub fn gross_profit(trades: &[ClosedTrade]) -> f64 {
    trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum()
}

/// Magnitude of losing P&L.
pub fn gross_loss(trades: &[ClosedTrade]) -> f64 {
    trades.iter().filter(|t| t.pnl < 0.0).map(|t| -t.pnl).sum()
}

/// Winning trades as a percentage of all trades.
pub fn win_rate(trades: &[ClosedTrade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64 * 100.0
}

/// Gross profit over gross loss, with the no-loss sentinel.
pub fn profit_factor(gross_profit: f64, gross_loss: f64) -> f64 {
    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 {
            PROFIT_FACTOR_SENTINEL
        } else {
            0.0
        };
    }
    gross_profit / gross_loss
}

/// Largest peak-to-trough equity decline, in currency and in percent of the peak it fell from.
///
/// The peak starts at `initial_balance`, so a run that loses from its first candle still
/// reports the loss.
pub fn max_drawdown(initial_balance: f64, equity_curve: &[EquityPoint]) -> (f64, f64) {
    let mut peak = initial_balance;
    let mut max_dd = 0.0_f64;
    let mut max_dd_pct = 0.0_f64;
    for point in equity_curve {
        peak = peak.max(point.equity);
        let dd = peak - point.equity;
        if dd > max_dd {
            max_dd = dd;
        }
        let pct = ratio(dd, peak) * 100.0;
        if pct > max_dd_pct {
            max_dd_pct = pct;
        }
    }
    (max_dd, max_dd_pct)
}

/// Compound annual growth rate between the first and last equity timestamps, in percent.
///
/// Zero when the curve spans no time or the account is wiped out.
pub fn annualized_return_percent(initial_balance: f64, equity_curve: &[EquityPoint]) -> f64 {
    let (Some(first), Some(last)) = (equity_curve.first(), equity_curve.last()) else {
        return 0.0;
    };
    let years = elapsed_seconds(first.timestamp, last.timestamp) / SECONDS_PER_YEAR;
    if years <= 0.0 || initial_balance <= 0.0 || last.equity <= 0.0 {
        return 0.0;
    }
    let cagr = ((last.equity / initial_balance).powf(1.0 / years) - 1.0) * 100.0;
    if cagr.is_finite() {
        cagr
    } else {
        0.0
    }
}

/// Candles per year implied by the median spacing of the equity timestamps.
pub fn periods_per_year(equity_curve: &[EquityPoint]) -> f64 {
    let mut gaps: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| elapsed_seconds(w[0].timestamp, w[1].timestamp))
        .filter(|gap| *gap > 0.0)
        .collect();
    if gaps.is_empty() {
        return 0.0;
    }
    gaps.sort_by(|a, b| a.total_cmp(b));
    let mid = gaps.len() / 2;
    let median = if gaps.len() % 2 == 0 {
        (gaps[mid - 1] + gaps[mid]) / 2.0
    } else {
        gaps[mid]
    };
    SECONDS_PER_YEAR / median
}

/// Simple returns per candle, starting from the initial balance.
pub fn period_returns(initial_balance: f64, equity_curve: &[EquityPoint]) -> Vec<f64> {
    let mut prev = initial_balance;
    equity_curve
        .iter()
        .map(|point| {
            let r = ratio(point.equity - prev, prev);
            prev = point.equity;
            r
        })
        .collect()
}

/// Annualized Sharpe ratio with a zero risk-free rate.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean(returns) / std * periods_per_year.sqrt()
}

/// Annualized Sortino ratio: downside deviation over all periods, zero target.
pub fn sortino_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let downside_sq: f64 = returns.iter().filter(|r| **r < 0.0).map(|r| r * r).sum();
    let downside = (downside_sq / returns.len() as f64).sqrt();
    if downside < 1e-15 {
        return 0.0;
    }
    mean(returns) / downside * periods_per_year.sqrt()
}

/// Longest run of consecutive trades satisfying `pred`. Break-even trades end every streak.
pub fn longest_streak(trades: &[ClosedTrade], pred: fn(&ClosedTrade) -> bool) -> usize {
    let mut best = 0;
    let mut current = 0;
    for trade in trades {
        if pred(trade) {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

// ─── Helpers ────────────────────────────────────────────────────────

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() < 1e-12 {
        0.0
    } else {
        numerator / denominator
    }
}

fn elapsed_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
