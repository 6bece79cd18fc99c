//! Environment wrappers.
use crate::{record::Record, Env, ResetOptions, Step};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Configuration of [`TimeLimit`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeLimitConfig<C: Clone> {
    /// Configuration of the wrapped environment.
    pub env_config: C,

    /// The number of steps after which episodes are truncated.
    pub max_steps: usize,
}

/// Truncates episodes after a fixed number of steps.
///
/// Environments in this workspace never truncate on their own; episode
/// length limits are the responsibility of this wrapper, which counts steps
/// and raises the `truncated` flag while leaving `terminated` and the cost
/// untouched.
pub struct TimeLimit<E: Env> {
    env: E,
    max_steps: usize,
    count_steps: usize,
}

impl<E: Env> TimeLimit<E> {
    /// Wraps an already built environment.
    pub fn new(env: E, max_steps: usize) -> Self {
        Self {
            env,
            max_steps,
            count_steps: 0,
        }
    }

    /// Returns a reference to the wrapped environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Returns a mutable reference to the wrapped environment.
    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }
}

impl<E: Env> Env for TimeLimit<E> {
    type Config = TimeLimitConfig<E::Config>;
    type Obs = E::Obs;
    type Act = E::Act;
    type Info = E::Info;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        Ok(Self::new(E::build(&config.env_config, seed)?, config.max_steps))
    }

    fn reset(
        &mut self,
        seed: Option<u64>,
        options: Option<&ResetOptions>,
    ) -> Result<(Self::Obs, Record)> {
        self.count_steps = 0;
        self.env.reset(seed, options)
    }

    fn step(&mut self, a: &Self::Act) -> (Step<Self>, Record) {
        let (step, record) = self.env.step(a);
        self.count_steps += 1;

        let truncated = step.truncated || self.count_steps >= self.max_steps;
        let step = Step::new(
            step.obs,
            step.act,
            step.cost,
            step.terminated,
            truncated,
            step.info,
        );
        if step.is_done() {
            self.count_steps = 0;
        }

        (step, record)
    }
}
