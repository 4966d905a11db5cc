//! Scenario descriptions.
//!
//! A scenario set is a YAML or JSON document with shared defaults and a list
//! of named scenarios, each overriding whichever knobs it cares about. The
//! resolve step folds defaults into every scenario and validates the result,
//! so the runner only ever sees a fully concrete description.

use crate::pv_array::PvArrayConfig;
use anyhow::{anyhow, Context, Result};
use pvctl_bms::BatteryConfig;
use pvctl_mppt::{Algorithm, MpptConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSet {
    pub version: Option<u32>,
    #[serde(default)]
    pub defaults: ScenarioDefaults,
    #[serde(default)]
    pub scenarios: Vec<ScenarioSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioDefaults {
    #[serde(default = "default_ticks")]
    pub ticks: usize,
    #[serde(default = "default_dt_s")]
    pub dt_s: f64,
    #[serde(default = "default_irradiance")]
    pub irradiance: f64,
    #[serde(default = "default_soc_init")]
    pub soc_init: f64,
    #[serde(default)]
    pub algorithm: Algorithm,
    #[serde(default)]
    pub battery: BatteryConfig,
    #[serde(default)]
    pub mppt: MpptConfig,
    #[serde(default)]
    pub array: PvArrayConfig,
}

fn default_ticks() -> usize {
    600
}

fn default_dt_s() -> f64 {
    1.0
}

fn default_irradiance() -> f64 {
    1.0
}

fn default_soc_init() -> f64 {
    0.5
}

impl Default for ScenarioDefaults {
    fn default() -> Self {
        Self {
            ticks: default_ticks(),
            dt_s: default_dt_s(),
            irradiance: default_irradiance(),
            soc_init: default_soc_init(),
            algorithm: Algorithm::default(),
            battery: BatteryConfig::default(),
            mppt: MpptConfig::default(),
            array: PvArrayConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub scenario_id: String,
    pub description: Option<String>,
    pub ticks: Option<usize>,
    pub dt_s: Option<f64>,
    pub irradiance: Option<f64>,
    pub soc_init: Option<f64>,
    pub algorithm: Option<Algorithm>,
    pub battery: Option<BatteryConfig>,
    pub mppt: Option<MpptConfig>,
    pub array: Option<PvArrayConfig>,
}

/// A scenario with every default folded in.
#[derive(Debug, Clone)]
pub struct ResolvedScenario {
    pub scenario_id: String,
    pub description: Option<String>,
    pub ticks: usize,
    pub dt_s: f64,
    pub irradiance: f64,
    pub soc_init: f64,
    pub algorithm: Algorithm,
    pub battery: BatteryConfig,
    pub mppt: MpptConfig,
    pub array: PvArrayConfig,
}

/// Load a scenario set from a YAML or JSON file, keyed on extension.
pub fn load_set_from_path(path: &Path) -> Result<ScenarioSet> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading scenario set '{}'", path.display()))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            serde_yaml::from_str(&data).context("parsing scenario set yaml")
        }
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            serde_json::from_str(&data).context("parsing scenario set json")
        }
        _ => serde_yaml::from_str(&data)
            .or_else(|_| serde_json::from_str(&data))
            .context("parsing scenario set"),
    }
}

pub fn resolve_scenarios(set: &ScenarioSet) -> Result<Vec<ResolvedScenario>> {
    if set.scenarios.is_empty() {
        return Err(anyhow!("scenario set contains no scenarios"));
    }
    let defaults = set.defaults.clone();
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(set.scenarios.len());
    for scenario in &set.scenarios {
        if scenario.scenario_id.trim().is_empty() {
            return Err(anyhow!("scenario_id cannot be empty"));
        }
        if !seen.insert(scenario.scenario_id.clone()) {
            return Err(anyhow!(
                "duplicate scenario_id '{}' in set",
                scenario.scenario_id
            ));
        }

        let concrete = ResolvedScenario {
            scenario_id: scenario.scenario_id.clone(),
            description: scenario.description.clone(),
            ticks: scenario.ticks.unwrap_or(defaults.ticks),
            dt_s: scenario.dt_s.unwrap_or(defaults.dt_s),
            irradiance: scenario.irradiance.unwrap_or(defaults.irradiance),
            soc_init: scenario.soc_init.unwrap_or(defaults.soc_init),
            algorithm: scenario.algorithm.unwrap_or(defaults.algorithm),
            battery: scenario
                .battery
                .clone()
                .unwrap_or_else(|| defaults.battery.clone()),
            mppt: scenario.mppt.unwrap_or(defaults.mppt),
            array: scenario.array.unwrap_or(defaults.array),
        };
        validate_resolved(&concrete).with_context(|| {
            format!("validating scenario '{}'", concrete.scenario_id)
        })?;
        resolved.push(concrete);
    }
    Ok(resolved)
}

pub fn validate(set: &ScenarioSet) -> Result<()> {
    resolve_scenarios(set).map(|_| ())
}

fn validate_resolved(scenario: &ResolvedScenario) -> Result<()> {
    if scenario.ticks == 0 {
        return Err(anyhow!("ticks must be >= 1"));
    }
    if scenario.dt_s <= 0.0 {
        return Err(anyhow!("dt_s must be positive, got {}", scenario.dt_s));
    }
    if !(0.0..=1.0).contains(&scenario.soc_init) {
        return Err(anyhow!(
            "soc_init must lie in [0, 1], got {}",
            scenario.soc_init
        ));
    }
    scenario.battery.validate()?;
    scenario.mppt.validate()?;
    scenario.array.validate()?;
    Ok(())
}
