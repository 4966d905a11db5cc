//! Static photovoltaic array model.
//!
//! A single-peak concave power curve, `P(V) = p_peak × s × (1 − ((V −
//! v_mpp)/v_mpp)²)` with irradiance scale `s`. This is a tracking fixture,
//! not an electronics model: no switching, no dynamics, just the curve the
//! MPPT loop has to climb.

use pvctl_core::units::{Amperes, Volts, Watts};
use pvctl_core::{PvError, PvResult};
use serde::{Deserialize, Serialize};

/// Curve parameters for a panel string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PvArrayConfig {
    /// Voltage at the maximum power point under full irradiance.
    #[serde(default = "default_v_mpp")]
    pub v_mpp: Volts,
    /// Peak power under full irradiance.
    #[serde(default = "default_p_peak")]
    pub p_peak: Watts,
}

fn default_v_mpp() -> Volts {
    Volts(35.0)
}

fn default_p_peak() -> Watts {
    // a 7.5 A string peaking at 35 V
    Watts(262.5)
}

impl Default for PvArrayConfig {
    fn default() -> Self {
        Self {
            v_mpp: default_v_mpp(),
            p_peak: default_p_peak(),
        }
    }
}

impl PvArrayConfig {
    pub fn validate(&self) -> PvResult<()> {
        if self.v_mpp.value() <= 0.0 || self.p_peak.value() <= 0.0 {
            return Err(PvError::Validation(format!(
                "PV array curve needs positive v_mpp and p_peak, got {} / {}",
                self.v_mpp, self.p_peak
            )));
        }
        Ok(())
    }
}

/// A panel string at a fixed irradiance.
#[derive(Debug, Clone, Copy)]
pub struct PvArray {
    config: PvArrayConfig,
    irradiance: f64,
}

impl PvArray {
    pub fn new(config: PvArrayConfig, irradiance: f64) -> PvResult<Self> {
        config.validate()?;
        if !(0.0..=1.5).contains(&irradiance) {
            return Err(PvError::Validation(format!(
                "irradiance scale must lie in [0, 1.5], got {}",
                irradiance
            )));
        }
        Ok(Self { config, irradiance })
    }

    /// Power produced at the given operating voltage, floored at zero.
    pub fn power_at(&self, v: Volts) -> Watts {
        let x = (v.value() - self.config.v_mpp.value()) / self.config.v_mpp.value();
        Watts((self.config.p_peak.value() * self.irradiance * (1.0 - x * x)).max(0.0))
    }

    /// Current drawn at the given operating voltage (`P/V`, zero at or below
    /// zero volts).
    pub fn current_at(&self, v: Volts) -> Amperes {
        if v.value() <= 0.0 {
            return Amperes(0.0);
        }
        Amperes(self.power_at(v).value() / v.value())
    }

    /// Plateau-current proxy used as the short-circuit measurement by the
    /// fractional short-circuit algorithm.
    pub fn short_circuit_current(&self) -> Amperes {
        Amperes(self.config.p_peak.value() * self.irradiance / self.config.v_mpp.value())
    }

    /// The true maximum power point at this irradiance.
    pub fn mpp(&self) -> (Volts, Watts) {
        (
            self.config.v_mpp,
            self.config.p_peak * self.irradiance,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array(irradiance: f64) -> PvArray {
        PvArray::new(PvArrayConfig::default(), irradiance).unwrap()
    }

    #[test]
    fn test_peak_at_mpp() {
        let a = array(1.0);
        assert_eq!(a.power_at(Volts(35.0)), Watts(262.5));
        assert!(a.power_at(Volts(30.0)) < Watts(262.5));
        assert!(a.power_at(Volts(40.0)) < Watts(262.5));
    }

    #[test]
    fn test_irradiance_scales_power() {
        let full = array(1.0).power_at(Volts(35.0));
        let half = array(0.5).power_at(Volts(35.0));
        assert!((half.value() - full.value() / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_power_floored_at_zero() {
        let a = array(1.0);
        assert_eq!(a.power_at(Volts(80.0)), Watts(0.0));
        assert_eq!(a.current_at(Volts(-5.0)), Amperes(0.0));
    }

    #[test]
    fn test_current_is_power_over_voltage() {
        let a = array(1.0);
        let i = a.current_at(Volts(35.0));
        assert!((i.value() - 7.5).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let config = PvArrayConfig {
            v_mpp: Volts(0.0),
            ..PvArrayConfig::default()
        };
        assert!(PvArray::new(config, 1.0).is_err());
        assert!(PvArray::new(PvArrayConfig::default(), -0.1).is_err());
    }
}
