//! # pvctl-scenarios: Closed-Loop Scenario Harness
//!
//! Describes and executes end-to-end control scenarios: a static PV array
//! curve, an MPPT strategy and a battery model wired into one fixed-step
//! loop. Scenario sets are YAML/JSON documents with shared defaults and
//! per-scenario overrides; the runner produces per-tick records plus a
//! summary (tracking efficiency, fault counts, energy bookkeeping).
//!
//! This crate exists for validation and tuning. It deliberately models no
//! power electronics: the converter is ideal and the operating point settles
//! to the reference voltage between ticks.

pub mod pv_array;
pub mod run;
pub mod spec;

pub use pv_array::{PvArray, PvArrayConfig};
pub use run::{run_scenario, ScenarioRun, ScenarioSummary, TickRecord};
pub use spec::{
    load_set_from_path, resolve_scenarios, validate, ResolvedScenario, ScenarioDefaults,
    ScenarioSet, ScenarioSpec,
};
