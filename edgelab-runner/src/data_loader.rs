//! Dataset loading behind the `DatasetProvider` seam.
//!
//! The engine never touches files. The runner resolves a dataset reference through a provider:
//! - `FileDatasetProvider`: CSV or JSON files under a root directory
//! - `InMemoryDatasetProvider`: pre-built series, for tests and batch fan-out
//!
//! CSV files need a header row with `timestamp,open,high,low,close` and an optional `volume`
//! column. Timestamps may be RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or epoch seconds/milliseconds.
//! A missing volume becomes `PLACEHOLDER_VOLUME`.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use edgelab_core::domain::{validate_series, Candle, CandleError, PLACEHOLDER_VOLUME};
use log::{info, warn};
use thiserror::Error;

/// Errors from the data loading layer. All are fatal for the run that asked.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unknown dataset '{0}'")]
    UnknownDataset(String),
    #[error("dataset file not found: {0}")]
    NotFound(PathBuf),
    #[error("unsupported dataset format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing column '{0}' in CSV header")]
    MissingColumn(&'static str),
    #[error("line {line}: {reason}")]
    BadRow { line: u64, reason: String },
    #[error("invalid candle series: {0}")]
    Invalid(#[from] CandleError),
}

/// Source of candle series, addressed by the configuration's `dataset` reference.
pub trait DatasetProvider: Send + Sync {
    fn load(&self, dataset: &str) -> Result<Vec<Candle>, LoadError>;
}

// ─── File provider ──────────────────────────────────────────────────

/// Loads `.csv` or `.json` files relative to a root directory.
///
/// A reference without an extension tries `<name>.csv`, then `<name>.json`.
#[derive(Debug, Clone)]
pub struct FileDatasetProvider {
    root: PathBuf,
}

impl FileDatasetProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a dataset reference to an existing file.
    pub fn resolve(&self, dataset: &str) -> Result<PathBuf, LoadError> {
        let reference = Path::new(dataset);
        let base = if reference.is_absolute() {
            reference.to_path_buf()
        } else {
            self.root.join(reference)
        };
        if base.extension().is_some() {
            return if base.is_file() {
                Ok(base)
            } else {
                Err(LoadError::NotFound(base))
            };
        }
        ["csv", "json"]
            .iter()
            .map(|ext| base.with_extension(ext))
            .find(|candidate| candidate.is_file())
            .ok_or(LoadError::NotFound(base))
    }
}

impl DatasetProvider for FileDatasetProvider {
    fn load(&self, dataset: &str) -> Result<Vec<Candle>, LoadError> {
        let path = self.resolve(dataset)?;
        let file = File::open(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        let reader = BufReader::new(file);

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let candles = match extension.as_deref() {
            Some("csv") | Some("txt") => parse_csv(reader)?,
            Some("json") => parse_json(reader)?,
            _ => return Err(LoadError::UnsupportedFormat(path)),
        };

        validate_series(&candles)?;
        info!("loaded {} candles from {}", candles.len(), path.display());
        Ok(candles)
    }
}

// ─── In-memory provider ─────────────────────────────────────────────

/// Named series held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatasetProvider {
    datasets: BTreeMap<String, Vec<Candle>>,
}

impl InMemoryDatasetProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, candles: Vec<Candle>) {
        self.datasets.insert(name.into(), candles);
    }

    pub fn with(mut self, name: impl Into<String>, candles: Vec<Candle>) -> Self {
        self.insert(name, candles);
        self
    }
}

impl DatasetProvider for InMemoryDatasetProvider {
    fn load(&self, dataset: &str) -> Result<Vec<Candle>, LoadError> {
        let candles = self
            .datasets
            .get(dataset)
            .cloned()
            .ok_or_else(|| LoadError::UnknownDataset(dataset.to_string()))?;
        validate_series(&candles)?;
        Ok(candles)
    }
}

// ─── Parsing ────────────────────────────────────────────────────────

const TIMESTAMP_COLUMNS: [&str; 4] = ["timestamp", "time", "datetime", "date"];
const VOLUME_COLUMNS: [&str; 3] = ["volume", "tick_volume", "vol"];

struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn from_header(header: &csv::StringRecord) -> Result<Self, LoadError> {
        let find = |names: &[&str]| {
            header
                .iter()
                .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
        };
        Ok(Self {
            timestamp: find(&TIMESTAMP_COLUMNS).ok_or(LoadError::MissingColumn("timestamp"))?,
            open: find(&["open"]).ok_or(LoadError::MissingColumn("open"))?,
            high: find(&["high"]).ok_or(LoadError::MissingColumn("high"))?,
            low: find(&["low"]).ok_or(LoadError::MissingColumn("low"))?,
            close: find(&["close"]).ok_or(LoadError::MissingColumn("close"))?,
            volume: find(&VOLUME_COLUMNS),
        })
    }
}

/// Parse a headed CSV stream into candles. Row order is preserved; validation happens later.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<Candle>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let columns = Columns::from_header(rdr.headers()?)?;

    let mut candles = Vec::new();
    let mut placeholders = 0usize;
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let raw_ts = cell(&record, columns.timestamp, "timestamp", line)?;
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| LoadError::BadRow {
            line,
            reason: format!("unrecognized timestamp '{raw_ts}'"),
        })?;

        let volume = match columns.volume {
            Some(idx) if !record.get(idx).unwrap_or("").is_empty() => {
                number(&record, idx, "volume", line)?
            }
            _ => {
                placeholders += 1;
                PLACEHOLDER_VOLUME
            }
        };

        candles.push(Candle::new(
            timestamp,
            number(&record, columns.open, "open", line)?,
            number(&record, columns.high, "high", line)?,
            number(&record, columns.low, "low", line)?,
            number(&record, columns.close, "close", line)?,
            volume,
        ));
    }

    if placeholders > 0 {
        warn!("{placeholders} rows without volume; using placeholder volume {PLACEHOLDER_VOLUME}");
    }
    Ok(candles)
}

fn cell<'r>(
    record: &'r csv::StringRecord,
    idx: usize,
    name: &str,
    line: u64,
) -> Result<&'r str, LoadError> {
    record.get(idx).ok_or_else(|| LoadError::BadRow {
        line,
        reason: format!("missing {name}"),
    })
}

fn number(record: &csv::StringRecord, idx: usize, name: &str, line: u64) -> Result<f64, LoadError> {
    let raw = cell(record, idx, name, line)?;
    raw.parse::<f64>().map_err(|_| LoadError::BadRow {
        line,
        reason: format!("{name} '{raw}' is not a number"),
    })
}

/// Parse a JSON array of candles (`timestamp` as RFC 3339, `volume` optional).
pub fn parse_json<R: Read>(reader: R) -> Result<Vec<Candle>, LoadError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` (both UTC) and integer epochs.
///
/// Integers of 11 or more digits are milliseconds, shorter ones seconds.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    let epoch: i64 = raw.parse().ok()?;
    if epoch.unsigned_abs() >= 100_000_000_000 {
        Utc.timestamp_millis_opt(epoch).single()
    } else {
        Utc.timestamp_opt(epoch, 0).single()
    }
}
