//! Environment.
use super::{Act, Info, Obs, Step};
use crate::record::Record;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Options accepted by [`Env::reset`].
///
/// When `random` is `true` (the default) the initial state is drawn
/// uniformly at random within the environment's initial-state bounds, which
/// can be narrowed per call through `low`/`high`. Override bounds must lie
/// within the declared observation space; bounds outside it fail the reset
/// with [`SimcostError::InvalidResetBounds`].
///
/// [`SimcostError::InvalidResetBounds`]: crate::error::SimcostError::InvalidResetBounds
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResetOptions {
    /// Draw the initial state at random. When `false` the environment's
    /// fixed default state is used and `low`/`high` are ignored.
    pub random: bool,

    /// Optional lower bounds for the initial-state sampler.
    pub low: Option<Vec<f64>>,

    /// Optional upper bounds for the initial-state sampler.
    pub high: Option<Vec<f64>>,
}

impl Default for ResetOptions {
    fn default() -> Self {
        Self {
            random: true,
            low: None,
            high: None,
        }
    }
}

impl ResetOptions {
    /// Returns options requesting the environment's fixed default state.
    pub fn deterministic() -> Self {
        Self {
            random: false,
            low: None,
            high: None,
        }
    }

    /// Sets the sampling bounds.
    pub fn bounds(mut self, low: Vec<f64>, high: Vec<f64>) -> Self {
        self.low = Some(low);
        self.high = Some(high);
        self
    }
}

/// Represents an environment, typically an MDP with a cost signal.
///
/// An environment is built once from its configuration, then driven through
/// repeated `reset`/`step` cycles. All operations run to completion on the
/// calling thread; an instance owns its state exclusively and is never
/// shared.
pub trait Env {
    /// Configuration of the environment.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Additional step information, beside the [`Record`] diagnostics.
    type Info: Info;

    /// Builds an environment with a given random seed.
    ///
    /// Building performs space and parameter setup only; the environment has
    /// no valid state until the first [`Env::reset`].
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Resets the environment and returns the initial observation together
    /// with its diagnostics.
    ///
    /// Reseeds the internal random source when `seed` is given. Elapsed time
    /// and all one-shot warning flags are cleared.
    fn reset(
        &mut self,
        seed: Option<u64>,
        options: Option<&ResetOptions>,
    ) -> Result<(Self::Obs, Record)>;

    /// Performs one environment step.
    ///
    /// Stepping a terminated episode without an intervening reset is a
    /// reportable misuse: a single advisory is logged and the state keeps
    /// evolving with unspecified, non-crashing results.
    fn step(&mut self, a: &Self::Act) -> (Step<Self>, Record)
    where
        Self: Sized;
}
