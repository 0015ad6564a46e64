//! End-to-end tests for the runner: TOML config and CSV/JSON datasets on disk, through the
//! engine, into metrics and exported artifacts.
//!
//! Tests:
//! 1. CSV breakout scenario reproduces the engine's 1% risk trade and its statistics
//! 2. JSON datasets and extension-less references
//! 3. Artifact bundle round trip
//! 4. Kill-switch halt surfaces in the result
//! 5. Batch over every strategy from one config file

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Duration, TimeZone, Utc};
use edgelab_core::domain::{Candle, ExitReason, StrategyId};
use edgelab_runner::{
    load_artifacts, run_batch, run_single_backtest, save_artifacts, strategy_sweep,
    BacktestConfig, DatasetProvider, FileDatasetProvider, LoadError, RunError,
    PerformanceMetrics,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn ts(index: usize) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(15 * index as i64)
}

fn bar(index: usize, open: f64, high: f64, low: f64, close: f64) -> Candle {
    Candle::new(ts(index), open, high, low, close, 1000.0)
}

fn wiggle(index: usize) -> Candle {
    let close = if index % 2 == 0 { 2000.5 } else { 1999.5 };
    bar(index, 2000.0, 2001.0, 1999.0, close)
}

fn breakout(index: usize) -> Candle {
    bar(index, 2000.0, 2012.0, 1999.5, 2011.5)
}

fn seven_am(day: usize) -> usize {
    day * 96 + 28
}

/// Quiet first day, a breakout at 07:00 on day two, then a run through the 2017 target.
fn breakout_candles() -> Vec<Candle> {
    let entry = seven_am(1);
    let mut candles: Vec<Candle> = (0..entry).map(wiggle).collect();
    candles.push(breakout(entry));
    candles.push(bar(entry + 1, 2011.5, 2018.0, 2011.0, 2017.5));
    candles.push(bar(entry + 2, 2017.5, 2018.0, 2016.5, 2017.0));
    candles
}

fn sine_candles(n: usize) -> Vec<Candle> {
    let mut prev = 2000.0;
    (0..n)
        .map(|i| {
            let t = i as f64;
            let close = 2000.0 + 10.0 * (t * 0.157).sin() + 3.0 * (t * 0.37).cos();
            let open = prev;
            prev = close;
            bar(i, open, open.max(close) + 1.0, open.min(close) - 1.0, close)
        })
        .collect()
}

fn write_csv(path: &Path, candles: &[Candle]) {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for c in candles {
        writeln!(
            out,
            "{},{},{},{},{},{}",
            c.timestamp.format("%Y-%m-%d %H:%M:%S"),
            c.open,
            c.high,
            c.low,
            c.close,
            c.volume
        )
        .unwrap();
    }
    std::fs::write(path, out).unwrap();
}

fn write_config(dir: &Path, body: &str) -> BacktestConfig {
    let path = dir.join("run.toml");
    std::fs::write(&path, body).unwrap();
    BacktestConfig::from_file(&path).unwrap()
}

// ── 1. CSV breakout scenario ─────────────────────────────────────────

#[test]
fn csv_breakout_trade_and_statistics() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(&dir.path().join("gold.csv"), &breakout_candles());
    let config = write_config(
        dir.path(),
        r#"
[backtest]
strategy = "session_breakout"
dataset = "gold.csv"
initial_balance = 10000.0
risk_per_trade_percent = 1.0
max_concurrent_positions = 1
"#,
    );

    let provider = FileDatasetProvider::new(dir.path());
    let result = run_single_backtest(&config.to_configuration(), &provider).unwrap();

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
    assert!((trade.volume - 0.36).abs() < 1e-9);
    assert!((trade.pnl - 198.0).abs() < 1e-6);

    assert!((result.final_balance - 10_198.0).abs() < 1e-6);
    assert!((result.total_return - 198.0).abs() < 1e-6);
    assert!((result.total_return_percent - 1.98).abs() < 1e-6);
    assert_eq!(result.win_rate, 100.0);
    assert_eq!(result.profit_factor, 100.0);
    assert_eq!(result.metrics.exit_reasons.take_profit, 1);
    assert_eq!(result.metrics.longest_win_streak, 1);
    assert_eq!(result.data_point_count, breakout_candles().len());
    assert!(result.halt.is_none());
}

// ── 2. Dataset resolution ────────────────────────────────────────────

#[test]
fn json_dataset_without_extension() {
    let dir = tempfile::tempdir().unwrap();
    let candles = breakout_candles();
    std::fs::write(
        dir.path().join("gold.json"),
        serde_json::to_string(&candles).unwrap(),
    )
    .unwrap();

    let provider = FileDatasetProvider::new(dir.path());
    let loaded = provider.load("gold").unwrap();
    assert_eq!(loaded.len(), candles.len());
    assert_eq!(loaded[0].timestamp, candles[0].timestamp);
    assert_eq!(loaded.last().unwrap().close, 2017.0);
}

#[test]
fn csv_and_json_give_the_same_run() {
    let dir = tempfile::tempdir().unwrap();
    // short decimals parse exactly from both formats
    let candles = breakout_candles();
    write_csv(&dir.path().join("a.csv"), &candles);
    std::fs::write(
        dir.path().join("b.json"),
        serde_json::to_string(&candles).unwrap(),
    )
    .unwrap();
    let provider = FileDatasetProvider::new(dir.path());

    let mut config = write_config(
        dir.path(),
        "[backtest]\nstrategy = \"session_breakout\"\ndataset = \"a.csv\"\n",
    )
    .to_configuration();
    let from_csv = run_single_backtest(&config, &provider).unwrap();
    config.dataset = "b.json".into();
    let from_json = run_single_backtest(&config, &provider).unwrap();

    assert_eq!(from_csv.trades, from_json.trades);
    assert_eq!(from_csv.dataset_hash, from_json.dataset_hash);
}

#[test]
fn missing_dataset_is_a_fatal_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "[backtest]\nstrategy = \"grid\"\ndataset = \"nowhere.csv\"\n",
    );
    let provider = FileDatasetProvider::new(dir.path());
    assert!(matches!(
        run_single_backtest(&config.to_configuration(), &provider),
        Err(RunError::Data(LoadError::NotFound(_)))
    ));
}

#[test]
fn unordered_csv_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut candles = sine_candles(10);
    candles.swap(3, 4);
    write_csv(&dir.path().join("bad.csv"), &candles);
    let provider = FileDatasetProvider::new(dir.path());
    assert!(matches!(provider.load("bad.csv"), Err(LoadError::Invalid(_))));
}

// ── 3. Artifacts ─────────────────────────────────────────────────────

#[test]
fn artifacts_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(&dir.path().join("gold.csv"), &sine_candles(500));
    let config = write_config(
        dir.path(),
        "[backtest]\nstrategy = \"martingale\"\ndataset = \"gold.csv\"\n\
         risk_per_trade_percent = 5.0\n",
    );
    let provider = FileDatasetProvider::new(dir.path());
    let result = run_single_backtest(&config.to_configuration(), &provider).unwrap();

    let out = dir.path().join("results");
    let run_dir = save_artifacts(&result, &out).unwrap();
    assert!(run_dir.join("result.json").exists());
    assert!(run_dir.join("trades.csv").exists());
    assert!(run_dir.join("equity.csv").exists());

    let loaded = load_artifacts(&run_dir).unwrap();
    assert_eq!(loaded.session_id, result.session_id);
    assert_eq!(loaded.trades.len(), result.trades.len());
    assert_eq!(loaded.config_hash, result.config_hash);

    let equity_rows = std::fs::read_to_string(run_dir.join("equity.csv"))
        .unwrap()
        .lines()
        .count();
    assert_eq!(equity_rows, result.equity_curve.len() + 1);
}

// ── 4. Kill-switch ───────────────────────────────────────────────────

#[test]
fn halt_is_recorded_in_the_result() {
    let first = seven_am(1);
    let second = seven_am(2);
    let mut candles: Vec<Candle> = (0..first).map(wiggle).collect();
    candles.push(breakout(first));
    candles.push(bar(first + 1, 2011.5, 2011.6, 2010.3, 2010.5));
    candles.extend((first + 2..second).map(wiggle));
    candles.push(breakout(second));
    candles.extend((second + 1..second + 8).map(wiggle));

    let dir = tempfile::tempdir().unwrap();
    write_csv(&dir.path().join("gold.csv"), &candles);
    let config = write_config(
        dir.path(),
        r#"
[backtest]
strategy = "session_breakout"
dataset = "gold.csv"
risk_per_trade_percent = 10.0
max_drawdown_percent = 3.0
"#,
    );
    let provider = FileDatasetProvider::new(dir.path());
    let result = run_single_backtest(&config.to_configuration(), &provider).unwrap();

    assert!(result.is_halted());
    let halt = result.halt.as_ref().unwrap();
    assert_eq!(halt.index, first + 1);
    assert_eq!(halt.forced_closures, 1);
    assert_eq!(result.trades.len(), 1);
    assert_eq!(result.metrics.exit_reasons.fail_safe, 1);
    assert!(result.max_drawdown_percent > 0.0);
}

// ── 5. Batch ─────────────────────────────────────────────────────────

#[test]
fn batch_from_one_config_file() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(&dir.path().join("gold.csv"), &sine_candles(600));
    let config = write_config(
        dir.path(),
        "[backtest]\nstrategy = \"grid\"\ndataset = \"gold.csv\"\nmax_concurrent_positions = 3\n",
    );
    let provider = FileDatasetProvider::new(dir.path());
    let outcomes = run_batch(&strategy_sweep(&config.to_configuration()), &provider);

    assert_eq!(outcomes.len(), StrategyId::ALL.len());
    for outcome in &outcomes {
        let result = outcome.result.as_ref().unwrap();
        assert_eq!(result.strategy_id, outcome.strategy_id);
        let recomputed = PerformanceMetrics::compute(
            result.initial_balance,
            &result.equity_curve,
            &result.trades,
        );
        assert_eq!(recomputed, result.metrics);
        let realized: f64 = result.trades.iter().map(|t| t.pnl).sum();
        assert!((result.final_balance - (result.initial_balance + realized)).abs() < 1e-6);
    }
}
