//! Domain types for EdgeLab

pub mod candle;
pub mod config;
pub mod equity;
pub mod ids;
pub mod instrument;
pub mod position;
pub mod signal;
pub mod trade;

pub use candle::{validate_series, Candle, CandleError, PLACEHOLDER_VOLUME};
pub use config::{
    BacktestConfiguration, ConfigError, GridParams, HourWindow, IndicatorParams,
    MartingaleParams, OverlayParams, SessionWindows, StrategyParams, TieBreakPolicy,
};
pub use equity::{EquityPoint, EquityTracker};
pub use ids::{IdGen, PositionId, StrategyId, UnknownStrategy};
pub use instrument::{ContractSpec, InstrumentError};
pub use position::{Position, PositionState};
pub use signal::{Side, SignalAction, TradingSignal, MIN_EXECUTION_CONFIDENCE};
pub use trade::{ClosedTrade, ExitReason};
