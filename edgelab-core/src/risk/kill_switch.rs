//! Drawdown kill-switch.
//!
//! Two states, Armed and Tripped. The switch trips once the peak-to-current equity decline
//! reaches `max_drawdown_percent` of the session-starting equity, and never re-arms within a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Recorded in the run result when the kill-switch trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HaltRecord {
    pub timestamp: DateTime<Utc>,
    /// Candle index at which the halt happened.
    pub index: usize,
    pub equity: f64,
    pub peak_equity: f64,
    /// Peak-to-current decline, in account currency.
    pub drawdown: f64,
    /// Decline as a percentage of the session-starting equity.
    pub drawdown_percent: f64,
    /// Open positions closed with reason `fail_safe` at the halt.
    pub forced_closures: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KillSwitchState {
    Armed,
    Tripped(HaltRecord),
}

#[derive(Debug, Clone)]
pub struct KillSwitch {
    /// Currency drawdown that trips the switch; `None` disables it.
    threshold: Option<f64>,
    session_start_equity: f64,
    state: KillSwitchState,
}

impl KillSwitch {
    pub fn new(max_drawdown_percent: Option<f64>, session_start_equity: f64) -> Self {
        Self {
            threshold: max_drawdown_percent.map(|pct| pct / 100.0 * session_start_equity),
            session_start_equity,
            state: KillSwitchState::Armed,
        }
    }

    pub fn is_tripped(&self) -> bool {
        matches!(self.state, KillSwitchState::Tripped(_))
    }

    pub fn halt(&self) -> Option<&HaltRecord> {
        match &self.state {
            KillSwitchState::Armed => None,
            KillSwitchState::Tripped(record) => Some(record),
        }
    }

    /// Check the current equity against the running peak. Returns `true` only on the call that
    /// trips the switch.
    pub fn check(
        &mut self,
        timestamp: DateTime<Utc>,
        index: usize,
        peak_equity: f64,
        equity: f64,
    ) -> bool {
        let Some(threshold) = self.threshold else {
            return false;
        };
        if self.is_tripped() {
            return false;
        }
        let peak = peak_equity.max(equity);
        let drawdown = peak - equity;
        if drawdown + 1e-9 < threshold {
            return false;
        }
        self.state = KillSwitchState::Tripped(HaltRecord {
            timestamp,
            index,
            equity,
            peak_equity: peak,
            drawdown,
            drawdown_percent: drawdown / self.session_start_equity * 100.0,
            forced_closures: 0,
        });
        true
    }

    pub fn record_forced_closures(&mut self, count: usize) {
        if let KillSwitchState::Tripped(record) = &mut self.state {
            record.forced_closures += count;
        }
    }

    pub fn into_halt(self) -> Option<HaltRecord> {
        match self.state {
            KillSwitchState::Armed => None,
            KillSwitchState::Tripped(record) => Some(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap()
    }

    #[test]
    fn disabled_switch_never_trips() {
        let mut ks = KillSwitch::new(None, 10_000.0);
        assert!(!ks.check(ts(), 5, 10_000.0, 1_000.0));
        assert!(ks.halt().is_none());
    }

    #[test]
    fn trips_at_threshold_of_starting_equity() {
        let mut ks = KillSwitch::new(Some(3.0), 10_000.0);
        assert!(!ks.check(ts(), 1, 10_500.0, 10_250.0));
        assert!(ks.check(ts(), 2, 10_500.0, 10_200.0));
        let halt = ks.halt().unwrap();
        assert_eq!(halt.index, 2);
        assert!((halt.drawdown - 300.0).abs() < 1e-9);
        assert!((halt.drawdown_percent - 3.0).abs() < 1e-9);
    }

    #[test]
    fn tripping_is_one_way() {
        let mut ks = KillSwitch::new(Some(3.0), 10_000.0);
        assert!(ks.check(ts(), 2, 10_000.0, 9_600.0));
        // recovery does not re-arm, and a second breach does not re-trip
        assert!(!ks.check(ts(), 3, 10_000.0, 10_100.0));
        assert!(!ks.check(ts(), 4, 10_100.0, 9_000.0));
        assert!(ks.is_tripped());
        assert_eq!(ks.halt().unwrap().index, 2);
    }

    #[test]
    fn forced_closures_accumulate_on_record() {
        let mut ks = KillSwitch::new(Some(5.0), 10_000.0);
        ks.record_forced_closures(2);
        assert!(ks.halt().is_none());
        ks.check(ts(), 9, 10_000.0, 9_400.0);
        ks.record_forced_closures(2);
        assert_eq!(ks.into_halt().unwrap().forced_closures, 2);
    }
}
