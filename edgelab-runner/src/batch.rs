//! Batch runs: independent backtests fanned out over the rayon pool.
//!
//! Every job builds its own engine context, so jobs share nothing but the read-only candle
//! series. Each distinct dataset is loaded once, before the fan-out.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use edgelab_core::domain::{BacktestConfiguration, Candle, StrategyId};
use log::{info, warn};
use rayon::prelude::*;

use crate::data_loader::DatasetProvider;
use crate::runner::{run_backtest_from_data, run_single_backtest, BacktestResult, RunError};

/// Result of one job, in submission order.
#[derive(Debug)]
pub struct BatchOutcome {
    pub index: usize,
    pub strategy_id: StrategyId,
    pub dataset: String,
    pub result: Result<BacktestResult, RunError>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// One configuration per strategy variant, everything else taken from `base`.
pub fn strategy_sweep(base: &BacktestConfiguration) -> Vec<BacktestConfiguration> {
    StrategyId::ALL
        .iter()
        .map(|&strategy_id| BacktestConfiguration {
            strategy_id,
            ..base.clone()
        })
        .collect()
}

/// Run every configuration in parallel. Outcomes come back in input order.
pub fn run_batch(
    configs: &[BacktestConfiguration],
    provider: &dyn DatasetProvider,
) -> Vec<BatchOutcome> {
    run_batch_with_progress(configs, provider, |_, _, _| {})
}

/// Like `run_batch`, invoking `progress(done, total, outcome)` as each job finishes.
pub fn run_batch_with_progress<F>(
    configs: &[BacktestConfiguration],
    provider: &dyn DatasetProvider,
    progress: F,
) -> Vec<BatchOutcome>
where
    F: Fn(usize, usize, &BatchOutcome) + Send + Sync,
{
    let datasets = preload(configs, provider);
    let total = configs.len();
    let done = AtomicUsize::new(0);
    info!("batch: {total} jobs over {} datasets", datasets.len());

    let outcomes: Vec<BatchOutcome> = configs
        .par_iter()
        .enumerate()
        .map(|(index, config)| {
            let result = match datasets.get(config.dataset.as_str()) {
                Some(candles) => config
                    .validate()
                    .map_err(RunError::from)
                    .and_then(|()| run_backtest_from_data(config, candles)),
                // load failed up front; reloading gives this job its own error value
                None => run_single_backtest(config, provider),
            };
            let outcome = BatchOutcome {
                index,
                strategy_id: config.strategy_id,
                dataset: config.dataset.clone(),
                result,
            };
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            progress(finished, total, &outcome);
            outcome
        })
        .collect();

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed > 0 {
        warn!("batch: {failed} of {total} jobs failed");
    }
    outcomes
}

fn preload<'a>(
    configs: &'a [BacktestConfiguration],
    provider: &dyn DatasetProvider,
) -> BTreeMap<&'a str, Vec<Candle>> {
    let mut datasets = BTreeMap::new();
    let mut failed: Vec<&str> = Vec::new();
    for config in configs {
        let name = config.dataset.as_str();
        if datasets.contains_key(name) || failed.contains(&name) {
            continue;
        }
        match provider.load(name) {
            Ok(candles) => {
                datasets.insert(name, candles);
            }
            Err(e) => {
                warn!("batch: dataset '{name}' failed to load: {e}");
                failed.push(name);
            }
        }
    }
    datasets
}
