//! Core traits and types.
mod env;
mod policy;
mod step;
pub use env::{Env, ResetOptions};
pub use policy::Policy;
pub use step::{Info, Step};

use ndarray::Array1;
use std::fmt::Debug;

/// An observation of an environment.
///
/// Observations are ordered, fixed-length sequences of real numbers. The
/// length and the meaning of each element are fixed per environment type.
pub trait Obs: Clone + Debug {
    /// Returns the number of elements in the observation.
    fn len(&self) -> usize;

    /// Returns `true` if the observation has no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An action applied to an environment.
///
/// Actions are ordered sequences of real numbers, one component per
/// actuator.
pub trait Act: Clone + Debug {
    /// Returns the number of components in the action.
    fn len(&self) -> usize;
}

impl Obs for Array1<f64> {
    fn len(&self) -> usize {
        self.shape()[0]
    }
}

impl Act for Array1<f64> {
    fn len(&self) -> usize {
        self.shape()[0]
    }
}
