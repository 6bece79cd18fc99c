//! Policy interacting with an environment.
use super::Env;

/// A mapping from observations to actions.
///
/// Used for rollouts and evaluation; learning algorithms are out of scope
/// for this workspace.
pub trait Policy<E: Env> {
    /// Samples an action for the given observation.
    fn sample(&mut self, obs: &E::Obs) -> E::Act;
}
