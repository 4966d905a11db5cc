//! # pvctl-bms: Battery State Estimation & Protection
//!
//! Owns the battery side of the pvctl control core: a Coulomb-counting
//! [`BatteryModel`] with OCV-based voltage prediction and linear health
//! degradation, and a sequential five-rule protection pass that arbitrates
//! safe operating current.
//!
//! ## Control contract
//!
//! An external fixed-period loop (out of scope here) owns the model and
//! calls, per tick:
//!
//! 1. [`BatteryModel::update`] with the measured pack current and dt
//! 2. [`BatteryModel::voltage_at`] to predict the terminal voltage
//! 3. [`BatteryModel::apply_protection`] with the commanded current, acting
//!    on the returned [`ProtectionAction`] (e.g. tripping a contactor)
//!
//! All numeric edge cases saturate or clamp; nothing in the per-tick path
//! returns an error. Protection faults are reported as codes, never raised.

pub mod battery;
pub mod config;
pub mod protection;

pub use battery::{BatteryModel, BatteryStatus};
pub use config::{load_config_from_path, BatteryConfig};
pub use protection::{Fault, ProtectionAction};
