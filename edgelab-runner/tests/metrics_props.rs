//! Property tests for the performance aggregator: every statistic stays finite and in range
//! for arbitrary ledgers and equity curves.

use chrono::{Duration, TimeZone, Utc};
use edgelab_core::domain::{ClosedTrade, EquityPoint, ExitReason, PositionId, Side, StrategyId};
use edgelab_runner::metrics::{PerformanceMetrics, PROFIT_FACTOR_SENTINEL};
use proptest::prelude::*;

fn trade(i: usize, pnl: f64, reason: ExitReason) -> ClosedTrade {
    let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(15 * i as i64);
    ClosedTrade {
        id: PositionId(i as u64 + 1),
        side: Side::Sell,
        strategy_id: StrategyId::MeanReversion,
        confidence: 80.0,
        entry_reason: String::new(),
        volume: 0.1,
        stop_loss: 2010.0,
        take_profit: 1990.0,
        entry_index: i,
        entry_time: t,
        entry_price: 2000.0,
        exit_index: i + 1,
        exit_time: t + Duration::minutes(15),
        exit_price: 2000.0,
        exit_reason: reason,
        gross_pnl: pnl,
        commission: 0.0,
        pnl,
        duration_candles: 1,
        duration_seconds: 900,
        max_favorable_excursion: pnl.max(0.0),
        max_adverse_excursion: pnl.min(0.0),
    }
}

fn arb_reason() -> impl Strategy<Value = ExitReason> {
    prop::sample::select(vec![
        ExitReason::StopLoss,
        ExitReason::TakeProfit,
        ExitReason::EndOfTest,
        ExitReason::FailSafe,
    ])
}

fn arb_trades() -> impl Strategy<Value = Vec<ClosedTrade>> {
    prop::collection::vec((-500.0..500.0_f64, arb_reason()), 0..60).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (pnl, reason))| trade(i, pnl, reason))
            .collect()
    })
}

fn arb_curve() -> impl Strategy<Value = Vec<EquityPoint>> {
    prop::collection::vec(1.0..50_000.0_f64, 0..300).prop_map(|equities| {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        equities
            .into_iter()
            .enumerate()
            .map(|(i, equity)| EquityPoint {
                timestamp: base + Duration::minutes(15 * i as i64),
                balance: equity,
                equity,
                drawdown: 0.0,
                drawdown_percent: 0.0,
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn statistics_are_finite_and_bounded(trades in arb_trades(), curve in arb_curve()) {
        let m = PerformanceMetrics::compute(10_000.0, &curve, &trades);

        for value in [
            m.total_return, m.total_return_percent, m.annualized_return_percent, m.win_rate,
            m.profit_factor, m.average_win, m.average_loss, m.expectancy, m.max_drawdown,
            m.max_drawdown_percent, m.sharpe_ratio, m.sortino_ratio, m.calmar_ratio,
        ] {
            prop_assert!(value.is_finite());
        }
        prop_assert!((0.0..=100.0).contains(&m.win_rate));
        prop_assert!(m.profit_factor >= 0.0);
        prop_assert!(m.max_drawdown >= 0.0);
        prop_assert!((0.0..=100.0).contains(&m.max_drawdown_percent));
        prop_assert!(m.average_loss <= 0.0 && m.average_win >= 0.0);
        prop_assert!(m.largest_loss <= 0.0 && m.largest_win >= 0.0);
        prop_assert!(m.longest_win_streak <= m.winning_trades);
        prop_assert!(m.longest_loss_streak <= m.losing_trades);
        prop_assert_eq!(m.exit_reasons.total(), trades.len());
        let net: f64 = trades.iter().map(|t| t.pnl).sum();
        prop_assert!((m.gross_profit - m.gross_loss - net).abs() < 1e-6);
    }

    #[test]
    fn profit_factor_sentinel_only_without_losses(trades in arb_trades()) {
        let m = PerformanceMetrics::compute(10_000.0, &[], &trades);
        if m.losing_trades == 0 && m.winning_trades > 0 {
            prop_assert_eq!(m.profit_factor, PROFIT_FACTOR_SENTINEL);
        }
        if trades.is_empty() {
            prop_assert_eq!(m.profit_factor, 0.0);
        }
    }
}
