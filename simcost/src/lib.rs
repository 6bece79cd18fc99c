//! Cost-based simulation environments for robustness research.
//!
//! Simcost consists of the following crates:
//!
//! * [simcost-core] provides the traits and types generic to every
//!   environment: the `reset`/`step` interface with a scalar cost instead of
//!   a reward, the [`Record`](simcost_core::record::Record) diagnostics
//!   side channel, the [`TimeLimit`](simcost_core::TimeLimit) truncation
//!   wrapper, and policy evaluation helpers.
//! * [simcost-env] provides the environments: the synthetic oscillatory
//!   gene network ([`Oscillator`](simcost_env::Oscillator)), the
//!   continuous-action cart-pole
//!   ([`CartPoleCost`](simcost_env::CartPoleCost)), and the quadrotor
//!   waypoint-tracking cost layer
//!   ([`QuadXWaypointsCost`](simcost_env::quadx::QuadXWaypointsCost)).
//! * [simcost] re-exports both.
//!
//! [simcost-core]: https://crates.io/crates/simcost-core
//! [simcost-env]: https://crates.io/crates/simcost-env
//! [simcost]: https://crates.io/crates/simcost
pub use simcost_core as core;
pub use simcost_env as env;

pub use simcost_core::{
    error::SimcostError, record::Record, record::RecordValue, Act, CostEvaluator, Env, Evaluator,
    Info, Obs, Policy, ResetOptions, Step, TimeLimit,
};
pub use simcost_env::{
    quadx, BoxSpace, CartPoleCost, CartPoleCostConfig, Disturber, Integrator, Oscillator,
    OscillatorConfig, ReferenceSignal, TaskType,
};
