//! # pvctl-mppt: Maximum Power Point Tracking
//!
//! The photovoltaic side of the pvctl control core: three interchangeable
//! tracking strategies as stateless free functions, plus a thin
//! history-carrying [`MpptTracker`] for the common perturb & observe loop.
//!
//! ## Control contract
//!
//! The control loop samples the panel voltage and current each tick, asks an
//! algorithm for the next reference voltage, forwards that reference to the
//! converter control (out of scope), and only then records the measurement
//! as the next tick's history. The algorithms never mutate state themselves,
//! so each decision is reproducible from literal inputs.

pub mod config;
pub mod tracking;

pub use config::{load_config_from_path, MpptConfig};
pub use tracking::{
    fractional_scc, incremental_conductance, perturb_observe, Algorithm, IncCondHistory,
    MpptTracker, PoHistory,
};
