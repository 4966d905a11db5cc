//! Battery safety interlocks.
//!
//! A priority-ordered set of independent overrides, each applied in sequence
//! to the commanded current. Rules do not short-circuit: a later rule can
//! modify what an earlier rule set, and the scalar fault code is overwritten
//! by whichever rule fires last. That overwrite ordering is carried over from
//! the reference control logic unchanged; [`ProtectionAction::triggered`]
//! additionally records every rule that fired, in evaluation order.

use crate::config::BatteryConfig;
use pvctl_core::units::{Amperes, Celsius, Volts};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Hysteresis beyond the cutoff voltages before a voltage fault is latched
/// (the current is zeroed at the cutoff itself).
const VOLTAGE_FAULT_MARGIN: f64 = 0.5;

/// Pack temperature above which current is derated and an overtemperature
/// fault raised.
const OVER_TEMPERATURE_C: f64 = 60.0;

/// Battery fault conditions, with the wire codes used by the plant
/// supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fault {
    OverDischargeVoltage = 1,
    OverDischargeCurrent = 2,
    OverChargeVoltage = 3,
    OverTemperature = 4,
}

impl Fault {
    /// Numeric fault code reported to the supervisor.
    pub fn code(self) -> u8 {
        match self {
            Fault::OverDischargeVoltage => 1,
            Fault::OverDischargeCurrent => 2,
            Fault::OverChargeVoltage => 3,
            Fault::OverTemperature => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Fault::OverDischargeVoltage => "over_discharge_voltage",
            Fault::OverDischargeCurrent => "over_discharge_current",
            Fault::OverChargeVoltage => "over_charge_voltage",
            Fault::OverTemperature => "over_temperature",
        }
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one protection pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtectionAction {
    /// The arbitrated safe operating current.
    pub current: Amperes,
    /// Scalar fault code, last rule to fire wins (legacy supervisor wire
    /// contract; an overtemperature can mask a simultaneous overvoltage).
    pub fault: Option<Fault>,
    /// Every rule that fired, in evaluation order. Superset of `fault`.
    pub triggered: Vec<Fault>,
}

impl ProtectionAction {
    /// Scalar fault code as transmitted: 0 when healthy, 1..=4 otherwise.
    pub fn fault_code(&self) -> u8 {
        self.fault.map_or(0, Fault::code)
    }
}

/// The five-rule protection pass. Rules are independent and sequential.
pub(crate) fn apply_rules(
    config: &BatteryConfig,
    temperature: Celsius,
    commanded: Amperes,
    terminal_v: Volts,
) -> ProtectionAction {
    let mut limited = commanded;
    let mut fault: Option<Fault> = None;
    let mut triggered: Vec<Fault> = Vec::new();

    // Rule 1: charge cutoff. Zero at the cutoff, latch a fault only past the
    // margin.
    if terminal_v >= config.v_max {
        limited = Amperes(0.0);
        if terminal_v.value() > config.v_max.value() + VOLTAGE_FAULT_MARGIN {
            fault = Some(Fault::OverChargeVoltage);
            triggered.push(Fault::OverChargeVoltage);
        }
    }

    // Rule 2: discharge cutoff. Independent of rule 1; with a collapsed
    // voltage envelope its fault overwrites the overcharge fault.
    if terminal_v <= config.v_min {
        limited = Amperes(0.0);
        if terminal_v.value() < config.v_min.value() - VOLTAGE_FAULT_MARGIN {
            fault = Some(Fault::OverDischargeVoltage);
            triggered.push(Fault::OverDischargeVoltage);
        }
    }

    // Rules 3/4: current clamps, keyed on the *commanded* current, so they
    // can restore a nonzero setpoint the voltage rules zeroed.
    if commanded.value() > 0.0 && commanded > config.i_max_charge {
        limited = config.i_max_charge;
    } else if commanded.value() < 0.0 && commanded < -config.i_max_discharge {
        limited = -config.i_max_discharge;
        fault = Some(Fault::OverDischargeCurrent);
        triggered.push(Fault::OverDischargeCurrent);
    }

    // Rule 5: thermal derate on top of whatever the prior rules produced; its
    // fault code masks any earlier one.
    if temperature.value() > OVER_TEMPERATURE_C {
        limited = limited * 0.5;
        fault = Some(Fault::OverTemperature);
        triggered.push(Fault::OverTemperature);
    }

    for f in &triggered {
        warn!(
            fault = f.as_str(),
            code = f.code(),
            commanded = commanded.value(),
            limited = limited.value(),
            terminal_v = terminal_v.value(),
            "battery protection rule fired"
        );
    }

    ProtectionAction {
        current: limited,
        fault,
        triggered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass(commanded: f64, terminal_v: f64) -> ProtectionAction {
        let config = BatteryConfig::default();
        apply_rules(
            &config,
            config.temperature_c,
            Amperes(commanded),
            Volts(terminal_v),
        )
    }

    #[test]
    fn test_fault_codes() {
        assert_eq!(Fault::OverDischargeVoltage.code(), 1);
        assert_eq!(Fault::OverDischargeCurrent.code(), 2);
        assert_eq!(Fault::OverChargeVoltage.code(), 3);
        assert_eq!(Fault::OverTemperature.code(), 4);
    }

    #[test]
    fn test_healthy_pass_is_identity() {
        let action = pass(30.0, 48.0);
        assert_eq!(action.current, Amperes(30.0));
        assert_eq!(action.fault, None);
        assert_eq!(action.fault_code(), 0);
        assert!(action.triggered.is_empty());
    }

    #[test]
    fn test_overvoltage_zeroes_current_and_faults() {
        // 55.0 V exceeds the 54.6 V cutoff by more than the 0.5 V margin
        let action = pass(10.0, 55.0);
        assert_eq!(action.current, Amperes(0.0));
        assert_eq!(action.fault, Some(Fault::OverChargeVoltage));
        assert_eq!(action.fault_code(), 3);
    }

    #[test]
    fn test_at_cutoff_zeroes_without_fault() {
        // Exactly at v_max: current zeroed but no fault latched yet
        let action = pass(10.0, 54.6);
        assert_eq!(action.current, Amperes(0.0));
        assert_eq!(action.fault, None);
    }

    #[test]
    fn test_undervoltage_fault() {
        let action = pass(-20.0, 39.0);
        assert_eq!(action.current, Amperes(0.0));
        assert_eq!(action.fault, Some(Fault::OverDischargeVoltage));
        assert_eq!(action.fault_code(), 1);
    }

    #[test]
    fn test_discharge_current_clamp() {
        let action = pass(-150.0, 48.0);
        assert_eq!(action.current, Amperes(-100.0));
        assert_eq!(action.fault, Some(Fault::OverDischargeCurrent));
        assert_eq!(action.fault_code(), 2);
    }

    #[test]
    fn test_charge_current_clamp_is_silent() {
        let action = pass(120.0, 48.0);
        assert_eq!(action.current, Amperes(50.0));
        assert_eq!(action.fault, None);
    }

    #[test]
    fn test_current_clamp_overrides_voltage_zeroing() {
        // Sequential-rule fragility carried over from the source: the clamp
        // keys on the commanded current and restores a nonzero setpoint even
        // though the overvoltage rule already zeroed it.
        let action = pass(120.0, 55.0);
        assert_eq!(action.current, Amperes(50.0));
        assert_eq!(action.fault, Some(Fault::OverChargeVoltage));
    }

    #[test]
    fn test_overtemperature_halves_and_masks() {
        let config = BatteryConfig::default();
        let action = apply_rules(&config, Celsius(65.0), Amperes(-150.0), Volts(55.0));
        // rule 1 zeroes, rule 4 clamps to -100, rule 5 halves to -50
        assert_eq!(action.current, Amperes(-50.0));
        // scalar code masked to overtemperature, full history preserved
        assert_eq!(action.fault, Some(Fault::OverTemperature));
        assert_eq!(
            action.triggered,
            vec![
                Fault::OverChargeVoltage,
                Fault::OverDischargeCurrent,
                Fault::OverTemperature
            ]
        );
    }
}
