//! Disturbance-injection seam.
use ndarray::Array1;

/// A pluggable perturbation applied to actions or dynamics.
///
/// Environments hold an optional boxed disturber and invoke it at two
/// points of the transition: after action clipping and after derivative
/// evaluation. Both hooks default to no-ops; implementations live outside
/// this crate.
pub trait Disturber {
    /// Perturbs the clipped action in place.
    fn disturb_action(&mut self, _t: f64, _action: &mut Array1<f64>) {}

    /// Perturbs the state derivatives in place.
    fn disturb_derivatives(&mut self, _t: f64, _derivatives: &mut [f64]) {}
}
