//! Diagnostics records emitted by environments.
//!
//! Every `reset` and `step` returns a [`Record`] beside the observation: a
//! string-keyed map of scalar values, booleans, arrays, and timestamps. The
//! record is a side channel — it never participates in control, but exposes
//! reference values, constraint-violation flags, and the state of interest
//! for external robustness-evaluation tooling.
mod base;

pub use base::{Record, RecordValue};
