//! Boundary contract to the quadrotor flight simulator.
use anyhow::Result;

/// The outcome of one backend transition.
///
/// `attitude` is the flattened body-state observation of the simulator
/// (angular rates, attitude, linear velocity, position, and whatever else
/// the backend exposes); the cost layer treats it as opaque.
#[derive(Clone, Debug, Default)]
pub struct QuadXOutcome {
    /// Flattened body-state observation.
    pub attitude: Vec<f64>,

    /// Whether the backend terminated the episode.
    pub terminated: bool,

    /// Whether the backend truncated the episode.
    pub truncated: bool,

    /// Whether the quadrotor collided.
    pub collision: bool,

    /// Whether the quadrotor left the flight dome.
    pub out_of_bounds: bool,

    /// Whether every waypoint of the episode has been reached.
    pub env_complete: bool,

    /// Number of waypoints reached during the episode so far.
    pub num_targets_reached: usize,
}

/// A quadrotor flight simulator with waypoint bookkeeping.
///
/// Implementations wrap an external physics engine; body dynamics and
/// contact handling are entirely theirs. The cost layer only consumes the
/// signals below.
pub trait QuadXBackend {
    /// Resets the simulation, reseeding waypoint generation when a seed is
    /// given, and returns the initial outcome.
    fn reset(&mut self, seed: Option<u64>) -> Result<QuadXOutcome>;

    /// Advances the simulation by one agent step.
    fn step(&mut self, action: &[f64]) -> QuadXOutcome;

    /// Current position of the quadrotor.
    fn position(&self) -> [f64; 3];

    /// The remaining waypoint targets; the immediate target comes first.
    /// Reached waypoints are removed by the backend.
    fn waypoint_targets(&self) -> Vec<[f64; 3]>;

    /// Distance gained toward the immediate waypoint during the last step.
    fn progress_to_target(&self) -> f64;

    /// Distance to the immediate waypoint.
    fn distance_to_immediate(&self) -> f64;
}
