//! EdgeLab CLI: run, batch and validate commands.
//!
//! Commands:
//! - `run`: execute one backtest from a TOML config file and save its artifacts
//! - `batch`: run several strategies over the config's dataset in parallel
//! - `validate`: check a config file and its dataset without running anything
//!
//! Dataset references resolve relative to `--data-dir`, or to the config file's directory
//! when the flag is absent.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use edgelab_core::domain::StrategyId;
use edgelab_core::indicators::IndicatorSet;
use edgelab_runner::{
    run_batch_with_progress, run_single_backtest, save_artifacts, strategy_sweep, BacktestConfig,
    BacktestResult, DatasetProvider, FileDatasetProvider,
};
use log::{error, info};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "edgelab", about = "EdgeLab CLI: gold strategy backtesting engine")]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Override the config's strategy (e.g. grid, momentum_scalp).
        #[arg(long)]
        strategy: Option<String>,

        /// Directory dataset references resolve against.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Output directory for result artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the full result JSON to stdout instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Skip writing artifacts.
        #[arg(long, default_value_t = false)]
        no_save: bool,
    },
    /// Run several strategies over the same dataset in parallel.
    Batch {
        /// Path to a TOML config file used as the base for every job.
        #[arg(long)]
        config: PathBuf,

        /// Strategies to run. Defaults to all of them.
        #[arg(long, value_delimiter = ',')]
        strategies: Vec<String>,

        /// Directory dataset references resolve against.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Output directory for result artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Skip writing artifacts.
        #[arg(long, default_value_t = false)]
        no_save: bool,
    },
    /// Check a config file and load its dataset.
    Validate {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Directory dataset references resolve against.
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Run {
            config,
            strategy,
            data_dir,
            output_dir,
            json,
            no_save,
        } => run_cmd(&config, strategy, data_dir, &output_dir, json, no_save),
        Commands::Batch {
            config,
            strategies,
            data_dir,
            output_dir,
            no_save,
        } => batch_cmd(&config, &strategies, data_dir, &output_dir, no_save),
        Commands::Validate { config, data_dir } => validate_cmd(&config, data_dir),
    }
}

fn run_cmd(
    config_path: &Path,
    strategy: Option<String>,
    data_dir: Option<PathBuf>,
    output_dir: &Path,
    json: bool,
    no_save: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(name) = strategy {
        config = config.with_strategy(parse_strategy(&name)?);
    }
    let provider = provider_for(config_path, data_dir);

    let result = run_single_backtest(&config.to_configuration(), &provider)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }

    if !no_save {
        let run_dir = save_artifacts(&result, output_dir)?;
        info!("artifacts saved to {}", run_dir.display());
    }
    Ok(())
}

fn batch_cmd(
    config_path: &Path,
    strategies: &[String],
    data_dir: Option<PathBuf>,
    output_dir: &Path,
    no_save: bool,
) -> Result<()> {
    let base = load_config(config_path)?.to_configuration();
    let configs = if strategies.is_empty() {
        strategy_sweep(&base)
    } else {
        let mut configs = Vec::with_capacity(strategies.len());
        for name in strategies {
            let mut config = base.clone();
            config.strategy_id = parse_strategy(name)?;
            configs.push(config);
        }
        configs
    };
    let provider = provider_for(config_path, data_dir);

    let outcomes = run_batch_with_progress(&configs, &provider, |done, total, outcome| {
        info!("[{done}/{total}] {} finished", outcome.strategy_id);
    });

    let mut results: Vec<&BacktestResult> = Vec::new();
    let mut failures = 0usize;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(result) => results.push(result),
            Err(e) => {
                failures += 1;
                error!("{} on '{}': {e}", outcome.strategy_id, outcome.dataset);
            }
        }
    }

    results.sort_by(|a, b| b.total_return_percent.total_cmp(&a.total_return_percent));
    println!(
        "{:<18} {:>7} {:>9} {:>8} {:>8} {:>9} {:>8}",
        "Strategy", "Trades", "Return%", "Win%", "PF", "MaxDD%", "Sharpe"
    );
    println!("{}", "-".repeat(73));
    for r in &results {
        println!(
            "{:<18} {:>7} {:>9.2} {:>8.1} {:>8.2} {:>9.2} {:>8.3}{}",
            r.strategy_id.as_str(),
            r.trades.len(),
            r.total_return_percent,
            r.win_rate,
            r.profit_factor,
            r.max_drawdown_percent,
            r.sharpe_ratio,
            if r.is_halted() { "  HALTED" } else { "" }
        );
    }

    if !no_save {
        for r in &results {
            save_artifacts(r, output_dir)?;
        }
        info!("artifacts saved under {}", output_dir.display());
    }

    if failures > 0 {
        bail!("{failures} of {} jobs failed", outcomes.len());
    }
    Ok(())
}

fn validate_cmd(config_path: &Path, data_dir: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let provider = provider_for(config_path, data_dir);
    let dataset = &config.backtest.dataset;
    let candles = provider
        .load(dataset)
        .with_context(|| format!("dataset '{dataset}' failed to load"))?;

    println!("Config OK: {}", config_path.display());
    println!("  Strategy:  {}", config.backtest.strategy);
    println!("  Dataset:   {dataset} ({} candles)", candles.len());
    if let (Some(first), Some(last)) = (candles.first(), candles.last()) {
        println!("  Range:     {} to {}", first.timestamp, last.timestamp);
    }
    let warmup = IndicatorSet::compute(&candles, &config.indicators, &config.sessions).warmup();
    if candles.len() <= warmup {
        println!("  Warning:   dataset is shorter than the {warmup}-candle warm-up");
        println!("             no entries will occur");
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<BacktestConfig> {
    BacktestConfig::from_file(path).with_context(|| format!("loading {}", path.display()))
}

fn parse_strategy(name: &str) -> Result<StrategyId> {
    name.parse::<StrategyId>().with_context(|| {
        let valid: Vec<&str> = StrategyId::ALL.iter().map(|s| s.as_str()).collect();
        format!("valid strategies: {}", valid.join(", "))
    })
}

fn provider_for(config_path: &Path, data_dir: Option<PathBuf>) -> FileDatasetProvider {
    let root = data_dir.unwrap_or_else(|| {
        config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    FileDatasetProvider::new(root)
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    println!();
    println!("=== Backtest Summary ===");
    println!("Session:        {}", result.session_id);
    println!("Strategy:       {}", result.strategy_id);
    println!(
        "Dataset:        {} ({} candles, warm-up {})",
        result.dataset, result.data_point_count, result.warmup
    );
    println!("Initial:        {:.2}", result.initial_balance);
    println!("Final:          {:.2}", result.final_balance);
    println!("Total Return:   {:.2} ({:.2}%)", result.total_return, result.total_return_percent);
    println!("Annualized:     {:.2}%", m.annualized_return_percent);
    println!(
        "Trades:         {} ({} won, {} lost)",
        m.trade_count, m.winning_trades, m.losing_trades
    );
    println!("Win Rate:       {:.1}%", result.win_rate);
    println!("Profit Factor:  {:.2}", result.profit_factor);
    println!("Expectancy:     {:.2}", m.expectancy);
    println!("Max Drawdown:   {:.2} ({:.2}%)", result.max_drawdown, result.max_drawdown_percent);
    println!("Sharpe:         {:.3}", result.sharpe_ratio);
    println!("Sortino:        {:.3}", m.sortino_ratio);
    println!("Calmar:         {:.3}", m.calmar_ratio);
    println!(
        "Exits:          {} TP / {} SL / {} end / {} fail-safe",
        m.exit_reasons.take_profit,
        m.exit_reasons.stop_loss,
        m.exit_reasons.end_of_test,
        m.exit_reasons.fail_safe
    );
    if let Some(halt) = &result.halt {
        println!(
            "HALTED:         candle {} at {} ({:.2}% drawdown, {} forced closures)",
            halt.index, halt.timestamp, halt.drawdown_percent, halt.forced_closures
        );
    }
    println!("Time:           {} ms", result.execution_time_ms);
}
