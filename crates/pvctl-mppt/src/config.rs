//! MPPT search parameterization.
//!
//! Step size, reference-voltage bounds and the algorithm constants are all
//! configuration. The fractional short-circuit constants in particular
//! (`fscc_k`, `fscc_voc_assumed`) are panel-model data that the reference
//! implementation baked into the formula; here they are swappable per panel.

use anyhow::{Context, Result};
use pvctl_core::units::Volts;
use pvctl_core::{PvError, PvResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Parameters shared by the MPPT algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MpptConfig {
    /// Reference-voltage perturbation per tick.
    #[serde(default = "default_step_size")]
    pub step_size: Volts,
    /// Lower clamp for the reference voltage.
    #[serde(default = "default_v_min")]
    pub v_min: Volts,
    /// Upper clamp for the reference voltage.
    #[serde(default = "default_v_max")]
    pub v_max: Volts,
    /// Substitute denominator when dV is numerically zero in incremental
    /// conductance. A deliberate bias, not a true zero-crossing.
    #[serde(default = "default_epsilon_dv")]
    pub epsilon_dv: f64,
    /// Conductance-sum band treated as "at the MPP" (hold) by incremental
    /// conductance.
    #[serde(default = "default_conductance_tolerance")]
    pub conductance_tolerance: f64,
    /// Fractional short-circuit current coefficient.
    #[serde(default = "default_fscc_k")]
    pub fscc_k: f64,
    /// Assumed panel open-circuit voltage used by the fractional
    /// short-circuit mapping.
    #[serde(default = "default_fscc_voc")]
    pub fscc_voc_assumed: Volts,
}

fn default_step_size() -> Volts {
    Volts(0.5)
}

fn default_v_min() -> Volts {
    Volts(20.0)
}

fn default_v_max() -> Volts {
    Volts(48.0)
}

fn default_epsilon_dv() -> f64 {
    1e-6
}

fn default_conductance_tolerance() -> f64 {
    0.001
}

fn default_fscc_k() -> f64 {
    0.76
}

fn default_fscc_voc() -> Volts {
    Volts(35.0)
}

impl Default for MpptConfig {
    fn default() -> Self {
        Self {
            step_size: default_step_size(),
            v_min: default_v_min(),
            v_max: default_v_max(),
            epsilon_dv: default_epsilon_dv(),
            conductance_tolerance: default_conductance_tolerance(),
            fscc_k: default_fscc_k(),
            fscc_voc_assumed: default_fscc_voc(),
        }
    }
}

impl MpptConfig {
    pub fn validate(&self) -> PvResult<()> {
        if self.step_size.value() <= 0.0 {
            return Err(PvError::Validation(format!(
                "step_size must be positive, got {}",
                self.step_size
            )));
        }
        if self.v_min >= self.v_max {
            return Err(PvError::Validation(format!(
                "v_min must be below v_max, got {} / {}",
                self.v_min, self.v_max
            )));
        }
        if self.epsilon_dv <= 0.0 || self.conductance_tolerance < 0.0 {
            return Err(PvError::Validation(
                "epsilon_dv must be positive and conductance_tolerance non-negative".into(),
            ));
        }
        if self.fscc_k <= 0.0 || self.fscc_voc_assumed.value() <= 0.0 {
            return Err(PvError::Validation(
                "fractional short-circuit constants must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Load an MPPT config from a YAML or JSON file, keyed on extension.
pub fn load_config_from_path(path: &Path) -> Result<MpptConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading MPPT config '{}'", path.display()))?;
    let config: MpptConfig = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            serde_yaml::from_str(&data).context("parsing MPPT config yaml")?
        }
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            serde_json::from_str(&data).context("parsing MPPT config json")?
        }
        _ => serde_yaml::from_str(&data)
            .or_else(|_| serde_json::from_str(&data))
            .context("parsing MPPT config")?,
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_reference_parameterization() {
        let config = MpptConfig::default();
        config.validate().unwrap();
        assert_eq!(config.step_size, Volts(0.5));
        assert_eq!(config.v_min, Volts(20.0));
        assert_eq!(config.v_max, Volts(48.0));
        assert_eq!(config.fscc_k, 0.76);
        assert_eq!(config.fscc_voc_assumed, Volts(35.0));
    }

    #[test]
    fn test_validate_rejects_bad_bounds() {
        let config = MpptConfig {
            v_min: Volts(48.0),
            v_max: Volts(20.0),
            ..MpptConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_step() {
        let config = MpptConfig {
            step_size: Volts(0.0),
            ..MpptConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_yaml_overrides() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "step_size: 1.0\nv_max: 60.0").unwrap();
        let config = load_config_from_path(file.path()).unwrap();
        assert_eq!(config.step_size, Volts(1.0));
        assert_eq!(config.v_max, Volts(60.0));
        assert_eq!(config.v_min, Volts(20.0));
    }
}
