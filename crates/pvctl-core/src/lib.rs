//! # pvctl-core: Solar Control Foundation
//!
//! Shared foundation for the pvctl control crates: unit-safe electrical
//! quantities, the unified error type, and breakpoint-curve interpolation.
//!
//! ## Design Philosophy
//!
//! The pvctl controllers are closed-loop numeric state machines. Everything
//! they compute is a bounded-time arithmetic expression over sampled
//! measurements, so this crate deliberately owns only three things:
//!
//! - [`units`] - `#[repr(transparent)]` newtypes for volts, amperes, watts,
//!   ohms, amp-hours and degrees Celsius, so control code cannot mix
//!   incompatible quantities
//! - [`error`] - [`PvError`] / [`PvResult`] for construction-time failures
//!   (the controllers themselves saturate instead of failing)
//! - [`curve`] - validated breakpoint tables with linear interpolation and
//!   endpoint-slope extrapolation, used for chemistry lookup tables such as
//!   SOC → open-circuit voltage
//!
//! ## Integration
//!
//! The pvctl-bms and pvctl-mppt crates build their controllers on these
//! types; pvctl-scenarios wires the controllers into a fixed-step loop.

pub mod curve;
pub mod error;
pub mod units;

pub use curve::Curve;
pub use error::{PvError, PvResult};
pub use units::{AmpHours, Amperes, Celsius, Ohms, Volts, Watts};
