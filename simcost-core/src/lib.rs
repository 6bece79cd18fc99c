#![warn(missing_docs)]
//! Core abstractions for cost-based simulation environments.
//!
//! This crate defines the environment interface shared by every simulation in
//! the workspace. An environment owns a state vector and an elapsed-time
//! counter, advances them by one fixed step per [`Env::step`] call, and
//! reports a non-negative scalar cost instead of a reward. Episode
//! termination and the terminal-penalty convention are part of the contract;
//! episode truncation is not — it is raised by the [`TimeLimit`] wrapper,
//! never by an environment itself.
//!
//! Concrete environments live in the `simcost-env` crate.
pub mod error;
pub mod record;

mod base;
pub use base::{Act, Env, Info, Obs, Policy, ResetOptions, Step};

mod evaluator;
pub use evaluator::{CostEvaluator, Evaluator};

pub mod wrappers;
pub use wrappers::{TimeLimit, TimeLimitConfig};
