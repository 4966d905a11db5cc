//! Battery pack parameterization.
//!
//! All chemistry-specific data, including the SOC → OCV lookup table, lives
//! here as plain configuration rather than hidden module constants, so a
//! different pack is a different config file, not a code change.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use pvctl_core::units::{AmpHours, Amperes, Celsius, Ohms, Volts};
use pvctl_core::{Curve, PvError, PvResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default SOC → OCV table for a 13s lithium pack (48 V nominal).
///
/// Eleven knots from 0.0 to 1.0 SOC in steps of 0.1.
static DEFAULT_OCV_48V: Lazy<Curve> = Lazy::new(|| {
    Curve::new(vec![
        (0.0, 42.0),
        (0.1, 45.5),
        (0.2, 47.6),
        (0.3, 49.0),
        (0.4, 50.2),
        (0.5, 51.2),
        (0.6, 51.9),
        (0.7, 52.5),
        (0.8, 53.1),
        (0.9, 53.8),
        (1.0, 54.6),
    ])
    .expect("default OCV table is well-formed")
});

/// Pack-level battery parameters.
///
/// Defaults model a 48 V / 100 Ah lithium pack. Every field can be overridden
/// from a YAML/JSON file via [`load_config_from_path`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryConfig {
    /// Nameplate capacity (Ah), before health derating.
    #[serde(default = "default_capacity_ah")]
    pub capacity_ah: AmpHours,
    /// Nominal pack voltage.
    #[serde(default = "default_v_nominal")]
    pub v_nominal: Volts,
    /// Charge cutoff voltage.
    #[serde(default = "default_v_max")]
    pub v_max: Volts,
    /// Discharge cutoff voltage.
    #[serde(default = "default_v_min")]
    pub v_min: Volts,
    /// Series internal resistance.
    #[serde(default = "default_r_internal")]
    pub r_internal: Ohms,
    /// Maximum sustained charge current (positive).
    #[serde(default = "default_i_max_charge")]
    pub i_max_charge: Amperes,
    /// Maximum sustained discharge current (positive magnitude).
    #[serde(default = "default_i_max_discharge")]
    pub i_max_discharge: Amperes,
    /// Initial state of health, fraction of nameplate capacity.
    #[serde(default = "default_soh_init")]
    pub soh_init: f64,
    /// Initial pack temperature.
    #[serde(default = "default_temperature_c")]
    pub temperature_c: Celsius,
    /// SOC → open-circuit voltage table.
    #[serde(default = "default_ocv_curve")]
    pub ocv_curve: Curve,
}

fn default_capacity_ah() -> AmpHours {
    AmpHours(100.0)
}

fn default_v_nominal() -> Volts {
    Volts(48.0)
}

fn default_v_max() -> Volts {
    Volts(54.6)
}

fn default_v_min() -> Volts {
    Volts(40.0)
}

fn default_r_internal() -> Ohms {
    Ohms(0.01)
}

fn default_i_max_charge() -> Amperes {
    Amperes(50.0)
}

fn default_i_max_discharge() -> Amperes {
    Amperes(100.0)
}

fn default_soh_init() -> f64 {
    0.95
}

fn default_temperature_c() -> Celsius {
    Celsius(25.0)
}

fn default_ocv_curve() -> Curve {
    DEFAULT_OCV_48V.clone()
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity_ah: default_capacity_ah(),
            v_nominal: default_v_nominal(),
            v_max: default_v_max(),
            v_min: default_v_min(),
            r_internal: default_r_internal(),
            i_max_charge: default_i_max_charge(),
            i_max_discharge: default_i_max_discharge(),
            soh_init: default_soh_init(),
            temperature_c: default_temperature_c(),
            ocv_curve: default_ocv_curve(),
        }
    }
}

impl BatteryConfig {
    /// Check the structural invariants of the parameter set.
    pub fn validate(&self) -> PvResult<()> {
        if self.capacity_ah.value() <= 0.0 {
            return Err(PvError::Validation(format!(
                "capacity_ah must be positive, got {}",
                self.capacity_ah
            )));
        }
        if !(self.v_min < self.v_nominal && self.v_nominal < self.v_max) {
            return Err(PvError::Validation(format!(
                "voltage envelope must satisfy v_min < v_nominal < v_max, got {} / {} / {}",
                self.v_min, self.v_nominal, self.v_max
            )));
        }
        if self.r_internal.value() < 0.0 {
            return Err(PvError::Validation(format!(
                "r_internal cannot be negative, got {}",
                self.r_internal
            )));
        }
        if self.i_max_charge.value() <= 0.0 || self.i_max_discharge.value() <= 0.0 {
            return Err(PvError::Validation(format!(
                "current limits must be positive, got charge {} / discharge {}",
                self.i_max_charge, self.i_max_discharge
            )));
        }
        if !(0.8..=1.0).contains(&self.soh_init) {
            return Err(PvError::Validation(format!(
                "soh_init must lie in [0.8, 1.0], got {}",
                self.soh_init
            )));
        }
        Ok(())
    }
}

/// Load a battery config from a YAML or JSON file, keyed on extension.
pub fn load_config_from_path(path: &Path) -> Result<BatteryConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading battery config '{}'", path.display()))?;
    let config: BatteryConfig = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            serde_yaml::from_str(&data).context("parsing battery config yaml")?
        }
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            serde_json::from_str(&data).context("parsing battery config json")?
        }
        _ => serde_yaml::from_str(&data)
            .or_else(|_| serde_json::from_str(&data))
            .context("parsing battery config")?,
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = BatteryConfig::default();
        config.validate().unwrap();
        assert_eq!(config.capacity_ah, AmpHours(100.0));
        assert_eq!(config.ocv_curve.len(), 11);
    }

    #[test]
    fn test_default_ocv_table_knots() {
        let config = BatteryConfig::default();
        assert_eq!(config.ocv_curve.sample(0.5), 51.2);
        assert_eq!(config.ocv_curve.sample(1.0), 54.6);
        assert_eq!(config.ocv_curve.domain(), (0.0, 1.0));
    }

    #[test]
    fn test_validate_rejects_inverted_envelope() {
        let config = BatteryConfig {
            v_min: Volts(55.0),
            ..BatteryConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nonpositive_capacity() {
        let config = BatteryConfig {
            capacity_ah: AmpHours(0.0),
            ..BatteryConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_yaml_with_partial_overrides() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "capacity_ah: 50.0\nsoh_init: 0.9").unwrap();
        let config = load_config_from_path(file.path()).unwrap();
        assert_eq!(config.capacity_ah, AmpHours(50.0));
        assert_eq!(config.soh_init, 0.9);
        // untouched fields fall back to pack defaults
        assert_eq!(config.v_max, Volts(54.6));
        assert_eq!(config.ocv_curve.len(), 11);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "capacity_ah: -5.0").unwrap();
        assert!(load_config_from_path(file.path()).is_err());
    }
}
