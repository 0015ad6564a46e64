//! Candle-by-candle simulation loop.
//!
//! Per candle, in order:
//! 1. Exits: stop-loss / take-profit for positions opened on earlier candles
//! 2. Kill-switch: equity marked at the close against the running peak
//! 3. Entry: at most one, only when not halted, past warm-up and below the position cap
//! 4. End of test: on the last processed candle (end of data or candle budget), every open
//!    position closes at that close with reason `end_of_test`
//! 5. Equity point

use log::{debug, info, warn};

use super::state::{EngineError, RunContext, RunResult};
use crate::domain::{validate_series, BacktestConfiguration, Candle, ExitReason, Position};
use crate::indicators::IndicatorSet;
use crate::strategies::{SignalGenerator, Strategy};

/// Run one backtest over `candles`.
///
/// Configuration and data are validated before the first candle; once the loop starts the run
/// always completes and returns a full result.
pub fn run_backtest(
    candles: &[Candle],
    config: &BacktestConfiguration,
) -> Result<RunResult, EngineError> {
    config.validate()?;
    validate_series(candles)?;

    let end = config
        .max_candles
        .map_or(candles.len(), |budget| budget.min(candles.len()));
    let candles = &candles[..end];

    let indicators = IndicatorSet::compute(candles, &config.indicators, &config.sessions);
    let strategy = Strategy::from_config(config);
    let warmup = indicators.warmup().max(strategy.warmup_candles());
    let contract = &config.contract;

    info!(
        "backtest start: strategy={} candles={} warmup={} balance={:.2}",
        strategy.id(),
        candles.len(),
        warmup,
        config.initial_balance
    );

    let mut ctx = RunContext::new(config, candles.len());

    for (i, candle) in candles.iter().enumerate() {
        // ─── Exits ───
        let settled = ctx.book.ledger().len();
        for trade in ctx.book.evaluate_exits(i, candle, config.tie_break, contract) {
            debug!(
                "close {} {} at {:.2} pnl={:.2}",
                trade.id, trade.exit_reason, trade.exit_price, trade.pnl
            );
        }
        ctx.settle_from(settled);

        // ─── Kill-switch ───
        let equity = ctx.balance + ctx.book.unrealized_pnl(candle.close, contract);
        if ctx
            .governor
            .check_drawdown(candle.timestamp, i, ctx.equity.peak(), equity)
        {
            if let Some(halt) = ctx.governor.halt() {
                warn!(
                    "kill-switch tripped at candle {} ({}): equity {:.2} peak {:.2} ({:.2}%)",
                    halt.index, halt.timestamp, halt.equity, halt.peak_equity, halt.drawdown_percent
                );
            }
            if config.force_close_on_halt {
                let settled = ctx.book.ledger().len();
                let forced = ctx
                    .book
                    .close_all(i, candle, candle.close, ExitReason::FailSafe, contract)
                    .len();
                ctx.settle_from(settled);
                ctx.governor.record_forced_closures(forced);
            }
        }

        // ─── Entry ───
        if !ctx.governor.is_halted()
            && i >= warmup
            && ctx.book.open_count() < config.max_concurrent_positions
        {
            let snapshot = indicators.snapshot(i);
            let signal = strategy.evaluate(&candles[..=i], i, &snapshot, ctx.governor.state());
            if let (true, Some(side)) = (signal.is_executable(), signal.action.side()) {
                match ctx
                    .governor
                    .approve(&signal, candle.close, ctx.balance, ctx.book.open_count())
                {
                    Ok(sizing) => {
                        let mut position = Position::pending(
                            ctx.ids.next_position_id(),
                            side,
                            sizing.volume,
                            signal.stop_loss,
                            signal.take_profit,
                            signal.strategy_id,
                            signal.confidence,
                            signal.reason,
                            i,
                            candle.timestamp,
                        );
                        position.fill(candle.close);
                        debug!(
                            "open {} {:?} {:.2} lots at {:.2} sl={:.2} tp={:.2} ({})",
                            position.id,
                            position.side,
                            position.volume,
                            position.entry_price,
                            position.stop_loss,
                            position.take_profit,
                            position.reason
                        );
                        ctx.governor
                            .on_entry(sizing.volume, candle.close, candle.timestamp);
                        ctx.book.insert(position);
                    }
                    Err(rejection) => debug!("entry at candle {i} rejected: {rejection}"),
                }
            }
        }

        // ─── End of test ───
        if i + 1 == candles.len() && ctx.book.open_count() > 0 {
            let settled = ctx.book.ledger().len();
            let closed = ctx
                .book
                .close_all(i, candle, candle.close, ExitReason::EndOfTest, contract)
                .len();
            ctx.settle_from(settled);
            debug!("closed {closed} open positions at end of test");
        }

        // ─── Equity ───
        let equity = ctx.balance + ctx.book.unrealized_pnl(candle.close, contract);
        let point = ctx.equity.record(candle.timestamp, ctx.balance, equity);
        ctx.equity_curve.push(point);
    }

    let RunContext {
        balance,
        book,
        governor,
        equity_curve,
        ..
    } = ctx;
    let trades = book.into_ledger();
    let halt = governor.into_halt();

    info!(
        "backtest done: trades={} final_balance={:.2}{}",
        trades.len(),
        balance,
        if halt.is_some() { " (halted)" } else { "" }
    );

    Ok(RunResult {
        initial_balance: config.initial_balance,
        final_balance: balance,
        equity_curve,
        trades,
        halt,
        warmup,
        candles_processed: candles.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConfigError, StrategyId};
    use crate::indicators::make_candles;

    #[test]
    fn empty_series_is_a_data_error() {
        let config = BacktestConfiguration::new(StrategyId::SessionBreakout, "d", 10_000.0, 1.0, 1);
        assert!(matches!(
            run_backtest(&[], &config),
            Err(EngineError::Data(_))
        ));
    }

    #[test]
    fn invalid_config_fails_before_the_loop() {
        let config = BacktestConfiguration::new(StrategyId::SessionBreakout, "d", 0.0, 1.0, 1);
        let candles = make_candles(&[2000.0; 10]);
        assert_eq!(
            run_backtest(&candles, &config),
            Err(EngineError::Config(ConfigError::NonPositiveBalance(0.0)))
        );
    }

    #[test]
    fn one_equity_point_per_candle() {
        let config = BacktestConfiguration::new(StrategyId::MeanReversion, "d", 10_000.0, 1.0, 1);
        let closes: Vec<f64> = (0..120).map(|i| 2000.0 + (i as f64 * 0.3).sin() * 5.0).collect();
        let result = run_backtest(&make_candles(&closes), &config).unwrap();
        assert_eq!(result.equity_curve.len(), 120);
        assert_eq!(result.candles_processed, 120);
    }

    #[test]
    fn candle_budget_stops_early() {
        let mut config = BacktestConfiguration::new(StrategyId::Grid, "d", 10_000.0, 1.0, 3);
        config.max_candles = Some(40);
        let closes: Vec<f64> = (0..100).map(|i| 2000.0 + i as f64).collect();
        let result = run_backtest(&make_candles(&closes), &config).unwrap();
        assert_eq!(result.candles_processed, 40);
        assert_eq!(result.equity_curve.len(), 40);
        assert!(result.trades.iter().all(|t| t.exit_index < 40));
    }
}
