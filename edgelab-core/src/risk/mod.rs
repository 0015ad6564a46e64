//! Risk governance: entry approval and sizing, sizing overlays, drawdown kill-switch.

pub mod governor;
pub mod kill_switch;
pub mod overlay;

pub use governor::{Rejection, RiskGovernor, Sizing};
pub use kill_switch::{HaltRecord, KillSwitch, KillSwitchState};
