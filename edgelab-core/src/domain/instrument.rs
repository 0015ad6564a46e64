use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Contract metadata for the traded symbol: multiplier, volume limits, commission.
///
/// Lives in the per-run context; never shared between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContractSpec {
    pub symbol: String,
    /// Currency value of a one-unit price move for one lot.
    pub contract_multiplier: f64,
    pub min_volume: f64,
    pub volume_step: f64,
    pub max_volume: f64,
    /// Round-turn commission charged per lot on close.
    pub commission_per_lot: f64,
}

impl Default for ContractSpec {
    fn default() -> Self {
        Self::gold()
    }
}

impl ContractSpec {
    /// Spot gold: 100 oz per lot, 0.01 lot steps.
    pub fn gold() -> Self {
        Self {
            symbol: "XAUUSD".into(),
            contract_multiplier: 100.0,
            min_volume: 0.01,
            volume_step: 0.01,
            max_volume: 100.0,
            commission_per_lot: 0.0,
        }
    }

    /// Round a raw volume down to the volume step, capped at `max_volume`.
    ///
    /// Returns 0.0 when the result falls below `min_volume`.
    pub fn round_volume(&self, volume: f64) -> f64 {
        if !volume.is_finite() || volume <= 0.0 {
            return 0.0;
        }
        let capped = volume.min(self.max_volume);
        let steps = (capped / self.volume_step + 1e-9).floor();
        let rounded = steps * self.volume_step;
        if rounded + 1e-12 < self.min_volume {
            0.0
        } else {
            rounded
        }
    }

    /// Currency P&L of a price move for a given volume, before commission.
    pub fn price_move_value(&self, price_delta: f64, volume: f64) -> f64 {
        price_delta * volume * self.contract_multiplier
    }

    pub fn commission(&self, volume: f64) -> f64 {
        self.commission_per_lot * volume
    }

    pub fn validate(&self) -> Result<(), InstrumentError> {
        if !(self.contract_multiplier > 0.0) {
            return Err(InstrumentError::InvalidMultiplier(self.contract_multiplier));
        }
        if !(self.volume_step > 0.0) {
            return Err(InstrumentError::InvalidVolumeStep(self.volume_step));
        }
        if !(self.min_volume > 0.0) || self.min_volume > self.max_volume {
            return Err(InstrumentError::InvalidVolumeLimits {
                min: self.min_volume,
                max: self.max_volume,
            });
        }
        if !(self.commission_per_lot >= 0.0) {
            return Err(InstrumentError::NegativeCommission(self.commission_per_lot));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InstrumentError {
    #[error("contract multiplier must be > 0, got {0}")]
    InvalidMultiplier(f64),

    #[error("volume step must be > 0, got {0}")]
    InvalidVolumeStep(f64),

    #[error("volume limits are inconsistent: min {min}, max {max}")]
    InvalidVolumeLimits { min: f64, max: f64 },

    #[error("commission per lot must be >= 0, got {0}")]
    NegativeCommission(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_volume_floors_to_step() {
        let spec = ContractSpec::gold();
        assert!((spec.round_volume(0.1) - 0.1).abs() < 1e-12);
        assert!((spec.round_volume(0.129) - 0.12).abs() < 1e-12);
    }

    #[test]
    fn round_volume_below_minimum_is_zero() {
        let spec = ContractSpec::gold();
        assert_eq!(spec.round_volume(0.009), 0.0);
        assert_eq!(spec.round_volume(-1.0), 0.0);
        assert_eq!(spec.round_volume(f64::NAN), 0.0);
    }

    #[test]
    fn round_volume_caps_at_maximum() {
        let spec = ContractSpec::gold();
        assert!((spec.round_volume(250.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn price_move_value_uses_multiplier() {
        let spec = ContractSpec::gold();
        assert!((spec.price_move_value(10.0, 0.1) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn validate_rejects_bad_step() {
        let spec = ContractSpec {
            volume_step: 0.0,
            ..ContractSpec::gold()
        };
        assert_eq!(spec.validate(), Err(InstrumentError::InvalidVolumeStep(0.0)));
    }
}
