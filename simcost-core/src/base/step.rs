//! Environment step.
use super::Env;

/// Additional information attached to a [`Step`], beside the observation and
/// the diagnostics record.
pub trait Info {}

impl Info for () {}

/// The outcome of one environment transition.
///
/// An environment emits a [`Step`] object at every interaction step. The
/// `cost` field replaces the reward of the usual RL step tuple: it is
/// non-negative and, on the step where `terminated` fires, holds the fixed
/// terminal-penalty constant rather than the raw formula value.
pub struct Step<E: Env> {
    /// Action applied during this transition.
    pub act: E::Act,

    /// Observation after the transition.
    pub obs: E::Obs,

    /// Scalar cost of the new state.
    pub cost: f64,

    /// Whether a termination condition fired during this step.
    pub terminated: bool,

    /// Whether the episode was cut short from outside. Environments always
    /// report `false`; the [`TimeLimit`](crate::TimeLimit) wrapper raises it.
    pub truncated: bool,

    /// Information defined by the environment.
    pub info: E::Info,
}

impl<E: Env> Step<E> {
    /// Constructs a [`Step`] object.
    pub fn new(
        obs: E::Obs,
        act: E::Act,
        cost: f64,
        terminated: bool,
        truncated: bool,
        info: E::Info,
    ) -> Self {
        Step {
            act,
            obs,
            cost,
            terminated,
            truncated,
            info,
        }
    }

    /// Terminated or truncated.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.terminated || self.truncated
    }
}
