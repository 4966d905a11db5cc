//! Maximum-power-point search algorithms.
//!
//! Three interchangeable strategies, all pure functions of the present
//! measurement, the explicit previous-tick history and the configuration.
//! None of them mutate tracker state: the caller owns the history and
//! threads it through each invocation, which keeps every variant trivially
//! testable with literal inputs.

use crate::config::MpptConfig;
use pvctl_core::units::{Amperes, Volts, Watts};
use pvctl_core::{PvError, PvResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// Previous-tick measurement for perturb & observe.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PoHistory {
    pub voltage: Volts,
    pub power: Watts,
}

/// Previous-tick measurement for incremental conductance.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IncCondHistory {
    pub voltage: Volts,
    pub current: Amperes,
}

/// Perturb & observe: nudge the reference voltage and keep going while power
/// rises, reverse when it falls.
///
/// Ties break toward "increase/stay" on `dP ≥ 0` / `dV ≥ 0`, so the search
/// keeps climbing from a cold start where both deltas are zero. The result
/// is clamped to `[v_min, v_max]`.
pub fn perturb_observe(v_pv: Volts, i_pv: Amperes, prev: &PoHistory, cfg: &MpptConfig) -> Volts {
    let power = v_pv * i_pv;
    let dp = power - prev.power;
    let dv = v_pv - prev.voltage;

    // Same-signed deltas mean the last perturbation helped; keep direction.
    let step = if (dp.value() >= 0.0) == (dv.value() >= 0.0) {
        cfg.step_size
    } else {
        -cfg.step_size
    };

    (v_pv + step).clamp(cfg.v_min, cfg.v_max)
}

/// Incremental conductance: compare incremental (dI/dV) against instantaneous
/// (I/V) conductance to decide which side of the MPP the operating point is
/// on.
///
/// A numerically zero dV is substituted with `epsilon_dv` instead of
/// special-casing the division, a deliberate bias carried over from the
/// reference logic, not a true zero-crossing test. The result is clamped to
/// `[v_min, v_max]`.
pub fn incremental_conductance(
    v_pv: Volts,
    i_pv: Amperes,
    prev: &IncCondHistory,
    cfg: &MpptConfig,
) -> Volts {
    let mut dv = (v_pv - prev.voltage).value();
    if dv.abs() < cfg.epsilon_dv {
        dv = cfg.epsilon_dv;
    }
    let di = (i_pv - prev.current).value();

    let incremental = di / dv;
    let instantaneous = i_pv.value() / v_pv.value();
    let balance = incremental + instantaneous;

    let reference = if balance.abs() < cfg.conductance_tolerance {
        // at the MPP: hold
        v_pv
    } else if balance > 0.0 {
        // left of the MPP: climb
        v_pv + cfg.step_size
    } else {
        // right of the MPP: back off
        v_pv - cfg.step_size
    };

    reference.clamp(cfg.v_min, cfg.v_max)
}

/// Fractional short-circuit current: open-loop mapping from the measured
/// short-circuit current to a reference voltage,
/// `v_ref = k × (i_sc / i_pv) × voc_assumed`.
///
/// Unlike the two hill-climbing variants this carries no history and no
/// clamp. A zero production current yields an infinite reference; callers
/// gate on `i_pv` before invoking.
pub fn fractional_scc(i_pv: Amperes, i_sc: Amperes, cfg: &MpptConfig) -> Volts {
    cfg.fscc_voc_assumed * (cfg.fscc_k * (i_sc / i_pv))
}

/// Selector for the tracking strategy, for scenario descriptions and
/// operator tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    #[default]
    PerturbObserve,
    IncrementalConductance,
    FractionalScc,
}

const AVAILABLE_ALGORITHMS: &[&str] = &[
    "perturb_observe",
    "incremental_conductance",
    "fractional_scc",
];

impl Algorithm {
    pub fn available() -> &'static [&'static str] {
        AVAILABLE_ALGORITHMS
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::PerturbObserve => "perturb_observe",
            Algorithm::IncrementalConductance => "incremental_conductance",
            Algorithm::FractionalScc => "fractional_scc",
        }
    }
}

impl FromStr for Algorithm {
    type Err = PvError;

    fn from_str(s: &str) -> PvResult<Self> {
        match s {
            "perturb_observe" | "po" => Ok(Algorithm::PerturbObserve),
            "incremental_conductance" | "inc_cond" => Ok(Algorithm::IncrementalConductance),
            "fractional_scc" | "fscc" => Ok(Algorithm::FractionalScc),
            other => Err(PvError::Config(format!(
                "unknown MPPT algorithm '{}'; available: {}",
                other,
                AVAILABLE_ALGORITHMS.join(", ")
            ))),
        }
    }
}

/// Perturb & observe search state, packaged for callers that want the
/// history carried for them.
///
/// `step` computes the next reference without touching the history; the
/// caller decides when a measurement becomes the new history via
/// [`record`](Self::record). This mirrors the control contract: the loop
/// carries `(V, P)` forward into the next tick as `(V_prev, P_prev)`.
#[derive(Debug, Clone)]
pub struct MpptTracker {
    config: MpptConfig,
    pub prev: PoHistory,
}

impl MpptTracker {
    pub fn new(config: MpptConfig) -> PvResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            prev: PoHistory::default(),
        })
    }

    pub fn config(&self) -> &MpptConfig {
        &self.config
    }

    /// Next reference voltage for the measured operating point. Does not
    /// advance the history.
    pub fn step(&self, v_pv: Volts, i_pv: Amperes) -> Volts {
        let reference = perturb_observe(v_pv, i_pv, &self.prev, &self.config);
        debug!(
            v_pv = v_pv.value(),
            i_pv = i_pv.value(),
            reference = reference.value(),
            "mppt step"
        );
        reference
    }

    /// Adopt the measured operating point as the previous-tick history.
    pub fn record(&mut self, v_pv: Volts, i_pv: Amperes) {
        self.prev = PoHistory {
            voltage: v_pv,
            power: v_pv * i_pv,
        };
    }
}
