//! Run fingerprinting: content hashes for configurations and datasets, plus session ids.
//!
//! - `config_hash`: BLAKE3 over the canonical JSON of the engine configuration
//! - `dataset_hash`: BLAKE3 over every candle's timestamp and OHLCV bytes
//! - `session_id`: human-readable run label with a random suffix
//!
//! The hashes are deterministic; identical inputs reproduce identical results. The session id
//! is the only random value in a result and never feeds the engine.

use chrono::{DateTime, Utc};
use edgelab_core::domain::{BacktestConfiguration, Candle, StrategyId};
use rand::Rng;

/// Hex BLAKE3 of the configuration. Struct fields serialize in declaration order.
pub fn config_hash(config: &BacktestConfiguration) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(config)?;
    Ok(blake3::hash(&json).to_hex().to_string())
}

/// Hex BLAKE3 over the candle series.
pub fn dataset_hash(candles: &[Candle]) -> String {
    let mut hasher = blake3::Hasher::new();
    for candle in candles {
        hasher.update(&candle.timestamp.timestamp_millis().to_le_bytes());
        hasher.update(&candle.open.to_le_bytes());
        hasher.update(&candle.high.to_le_bytes());
        hasher.update(&candle.low.to_le_bytes());
        hasher.update(&candle.close.to_le_bytes());
        hasher.update(&candle.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// `<strategy>_<YYYYMMDDTHHMMSS>_<8 hex>`, e.g. `grid_20240102T070000_3fa85f64`.
pub fn session_id(strategy: StrategyId, started: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen();
    format!(
        "{}_{}_{:08x}",
        strategy.as_str(),
        started.format("%Y%m%dT%H%M%S"),
        suffix
    )
}
