//! Battery state estimation.
//!
//! [`BatteryModel`] owns the pack state (charge, health, temperature) and is
//! stepped once per control interval with the measured pack current. SOC is
//! estimated by Coulomb counting against the health-derated capacity; health
//! follows a linear cycle-count degradation model with a 0.8 floor.

use crate::config::BatteryConfig;
use crate::protection::{self, ProtectionAction};
use pvctl_core::units::{AmpHours, Amperes, Celsius, Volts};
use pvctl_core::PvResult;
use serde::Serialize;

/// Cycle count at which the linear degradation model reaches its floor.
const DEGRADATION_CYCLES: f64 = 3000.0;
/// Capacity fraction lost over `DEGRADATION_CYCLES` cycles.
const DEGRADATION_SPAN: f64 = 0.2;
/// State-of-health floor; packs are retired rather than modeled below this.
const SOH_FLOOR: f64 = 0.8;

/// Read-only pack snapshot for telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatteryStatus {
    pub soc_percent: f64,
    pub soh_percent: f64,
    pub q_remaining: AmpHours,
    pub cycles_count: u32,
    pub temperature_c: Celsius,
}

/// Battery state estimator and protection arbiter.
///
/// Single-owner, mutated in place by the control loop. Sign convention:
/// positive current charges the pack.
#[derive(Debug, Clone)]
pub struct BatteryModel {
    config: BatteryConfig,
    soc: f64,
    soh: f64,
    q_remaining: AmpHours,
    q_total: AmpHours,
    cycles_count: u32,
    temperature_c: Celsius,
    // Diagnostic coulomb counters; never fed back into the SOC estimate.
    q_in: AmpHours,
    q_out: AmpHours,
}

impl BatteryModel {
    /// Build a model from a validated parameter set and an initial SOC.
    ///
    /// `soc_init` is clamped into [0, 1]. The initial charge counter is
    /// `capacity_ah × soc_init` against the nameplate capacity, matching the
    /// reference parameterization (the health derate applies from the first
    /// `update` onward).
    pub fn new(config: BatteryConfig, soc_init: f64) -> PvResult<Self> {
        config.validate()?;
        let soc = soc_init.clamp(0.0, 1.0);
        let q_total = config.capacity_ah * config.soh_init;
        let q_remaining = config.capacity_ah * soc;
        Ok(Self {
            soh: config.soh_init,
            temperature_c: config.temperature_c,
            soc,
            q_total,
            q_remaining,
            cycles_count: 0,
            q_in: AmpHours(0.0),
            q_out: AmpHours(0.0),
            config,
        })
    }

    /// Advance the Coulomb-counting SOC estimate by one control interval.
    ///
    /// `current` is the measured pack current (positive = charging) held for
    /// `dt_s` seconds. Not idempotent: calling twice with the same sample
    /// double-counts charge. After integration the SOC is clamped to [0, 1]
    /// and the charge counter snapped back to `soc × q_total` so saturation
    /// cannot accumulate drift in the counter.
    pub fn update(&mut self, current: Amperes, dt_s: f64) {
        let delta_q = current.over_seconds(dt_s);
        self.q_remaining = self.q_remaining + delta_q;
        if delta_q.value() > 0.0 {
            self.q_in = self.q_in + delta_q;
        } else {
            self.q_out = self.q_out + delta_q.abs();
        }

        self.q_total = self.config.capacity_ah * self.soh;
        self.soc = self.q_remaining.fraction_of(self.q_total).clamp(0.0, 1.0);
        self.q_remaining = self.q_total * self.soc;
    }

    /// Predicted terminal voltage at the given pack current.
    ///
    /// Open-circuit voltage is looked up from the SOC → OCV table (linear
    /// interpolation, extrapolating along the endpoint segments outside
    /// [0, 1]), minus the ohmic drop `current × r_internal`. The current
    /// carries the same sign convention as [`update`](Self::update).
    pub fn voltage_at(&self, current: Amperes) -> Volts {
        let ocv = Volts(self.config.ocv_curve.sample(self.soc));
        ocv - current * self.config.r_internal
    }

    /// Arbitrate a commanded current against the safety envelope.
    ///
    /// Applies the five sequential protection rules (voltage cutoffs,
    /// current clamps, thermal derate) and reports the limited current plus
    /// fault state. Pure with respect to the model state.
    pub fn apply_protection(&self, commanded: Amperes, terminal_v: Volts) -> ProtectionAction {
        protection::apply_rules(&self.config, self.temperature_c, commanded, terminal_v)
    }

    /// Re-estimate state of health from the lifetime cycle count.
    ///
    /// Linear degradation: 20% of nameplate capacity lost over 3000 cycles,
    /// floored at 0.8. Idempotent for a given `cycles`; intended to run once
    /// per full cycle, not every tick.
    pub fn estimate_health(&mut self, cycles: u32) {
        let degraded = 1.0 - (cycles as f64 / DEGRADATION_CYCLES) * DEGRADATION_SPAN;
        self.soh = degraded.clamp(SOH_FLOOR, 1.0);
        self.q_total = self.config.capacity_ah * self.soh;
        // cycle counter stays monotonic even on a stale re-estimate
        self.cycles_count = self.cycles_count.max(cycles);
    }

    /// Record an external temperature measurement.
    pub fn set_temperature(&mut self, temperature: Celsius) {
        self.temperature_c = temperature;
    }

    /// Read-only snapshot, no side effects.
    pub fn status(&self) -> BatteryStatus {
        BatteryStatus {
            soc_percent: self.soc * 100.0,
            soh_percent: self.soh * 100.0,
            q_remaining: self.q_remaining,
            cycles_count: self.cycles_count,
            temperature_c: self.temperature_c,
        }
    }

    pub fn config(&self) -> &BatteryConfig {
        &self.config
    }

    /// State of charge, fraction in [0, 1].
    pub fn soc(&self) -> f64 {
        self.soc
    }

    /// State of health, fraction in [0.8, 1].
    pub fn soh(&self) -> f64 {
        self.soh
    }

    /// Effective capacity after health derate.
    pub fn q_total(&self) -> AmpHours {
        self.q_total
    }

    /// Cumulative charge in, diagnostic only.
    pub fn q_in(&self) -> AmpHours {
        self.q_in
    }

    /// Cumulative charge out, diagnostic only.
    pub fn q_out(&self) -> AmpHours {
        self.q_out
    }

    pub fn temperature(&self) -> Celsius {
        self.temperature_c
    }
}
