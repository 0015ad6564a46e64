//! Result export: JSON and CSV artifacts.
//!
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: trade ledger and equity curve for external analysis tools
//!
//! Persisted JSON carries `schema_version`. Newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use edgelab_core::domain::{ClosedTrade, EquityPoint};

use crate::runner::{BacktestResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the trade ledger as CSV, one row per closed trade.
pub fn export_trades_csv(trades: &[ClosedTrade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "id",
        "strategy_id",
        "side",
        "volume",
        "entry_index",
        "entry_time",
        "entry_price",
        "stop_loss",
        "take_profit",
        "exit_index",
        "exit_time",
        "exit_price",
        "exit_reason",
        "gross_pnl",
        "commission",
        "pnl",
        "duration_candles",
        "duration_seconds",
        "mfe",
        "mae",
        "confidence",
        "entry_reason",
    ])?;

    for t in trades {
        wtr.write_record([
            t.id.0.to_string(),
            t.strategy_id.to_string(),
            format!("{:?}", t.side).to_lowercase(),
            format!("{:.2}", t.volume),
            t.entry_index.to_string(),
            t.entry_time.to_rfc3339(),
            format!("{:.5}", t.entry_price),
            format!("{:.5}", t.stop_loss),
            format!("{:.5}", t.take_profit),
            t.exit_index.to_string(),
            t.exit_time.to_rfc3339(),
            format!("{:.5}", t.exit_price),
            t.exit_reason.to_string(),
            format!("{:.2}", t.gross_pnl),
            format!("{:.2}", t.commission),
            format!("{:.2}", t.pnl),
            t.duration_candles.to_string(),
            t.duration_seconds.to_string(),
            format!("{:.2}", t.max_favorable_excursion),
            format!("{:.2}", t.max_adverse_excursion),
            format!("{:.1}", t.confidence),
            t.entry_reason.clone(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the equity curve as CSV.
pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "balance", "equity", "drawdown", "drawdown_percent"])?;
    for p in equity_curve {
        wtr.write_record([
            p.timestamp.to_rfc3339(),
            format!("{:.2}", p.balance),
            format!("{:.2}", p.equity),
            format!("{:.2}", p.drawdown),
            format!("{:.4}", p.drawdown_percent),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single run.
///
/// Creates `{session_id}/` under `output_dir` containing:
/// - `result.json`: the full `BacktestResult`
/// - `trades.csv`: closed-trade ledger
/// - `equity.csv`: per-candle equity curve
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(&result.session_id);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write(&run_dir.join("result.json"), &export_json(result)?)?;
    write(&run_dir.join("trades.csv"), &export_trades_csv(&result.trades)?)?;
    write(&run_dir.join("equity.csv"), &export_equity_csv(&result.equity_curve)?)?;

    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's `result.json`.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
