//! Evaluate a [`Policy`] by rolling out episodes.
use crate::{record::Record, Env, Policy};
use anyhow::Result;

/// Evaluates a [`Policy`].
pub trait Evaluator<E: Env> {
    /// Runs the evaluation and reports its metrics as a [`Record`].
    fn evaluate<P: Policy<E>>(&mut self, policy: &mut P) -> Result<Record>;
}

/// Runs a fixed number of episodes and reports the mean episode cost.
///
/// Episode `ix` is reset with seed `ix`, which makes evaluation runs
/// repeatable. Environments never truncate on their own, so a step cap
/// bounds each rollout; episodes still running at the cap contribute the
/// cost accumulated so far.
pub struct CostEvaluator<E: Env> {
    /// The number of episodes to run during evaluation.
    n_episodes: usize,

    /// Upper bound on the number of steps per episode.
    max_steps: usize,

    /// The environment instance used for evaluation.
    env: E,
}

impl<E: Env> CostEvaluator<E> {
    /// Constructs an evaluator with its own environment instance.
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize, max_steps: usize) -> Result<Self> {
        Ok(Self {
            n_episodes,
            max_steps,
            env: E::build(config, seed)?,
        })
    }
}

impl<E: Env> Evaluator<E> for CostEvaluator<E> {
    fn evaluate<P: Policy<E>>(&mut self, policy: &mut P) -> Result<Record> {
        let mut c_total = 0f64;

        for ix in 0..self.n_episodes {
            let (mut obs, _) = self.env.reset(Some(ix as u64), None)?;

            for _ in 0..self.max_steps {
                let act = policy.sample(&obs);
                let (step, _) = self.env.step(&act);
                c_total += step.cost;
                if step.is_done() {
                    break;
                }
                obs = step.obs;
            }
        }

        Ok(Record::from_scalar(
            "Mean episode cost",
            c_total / self.n_episodes as f64,
        ))
    }
}
