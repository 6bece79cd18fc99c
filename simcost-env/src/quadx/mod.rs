//! Waypoint-tracking cost layer for a quadrotor.
//!
//! The quadrotor body dynamics, contact physics, and waypoint bookkeeping
//! live in an external flight simulator behind the [`QuadXBackend`] trait;
//! this module layers a cost signal and a flat observation on top of it.
mod backend;

pub use backend::{QuadXBackend, QuadXOutcome};

use anyhow::{ensure, Result};
use log::warn;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use simcost_core::{
    record::{Record, RecordValue},
    Env, Info, ResetOptions, Step,
};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`QuadXWaypointsCost`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QuadXWaypointsCostConfig {
    /// Penalize the quadrotor when it crashes or leaves the flight dome.
    pub include_health_penalty: bool,

    /// Fixed size of the health penalty. When `None` the penalty equals
    /// the remaining episode steps.
    pub health_penalty_size: Option<f64>,

    /// The episode step limit used to size the default health penalty.
    /// Truncation itself is the step-limit wrapper's responsibility.
    pub max_episode_steps: usize,

    /// Append waypoint targets to the observation.
    pub observe_waypoint_targets: bool,

    /// Observe only the immediate waypoint target instead of all of them.
    pub only_immediate_waypoint: bool,

    /// Append waypoint target deltas to the observation.
    pub observe_target_deltas: bool,

    /// Observe only the immediate target delta instead of all of them.
    pub only_immediate_target_delta: bool,

    /// Looprate of the agent to environment interaction, in Hz.
    pub agent_hz: usize,
}

impl Default for QuadXWaypointsCostConfig {
    fn default() -> Self {
        Self {
            include_health_penalty: true,
            health_penalty_size: None,
            max_episode_steps: 1000,
            observe_waypoint_targets: true,
            only_immediate_waypoint: true,
            observe_target_deltas: false,
            only_immediate_target_delta: true,
            agent_hz: 30,
        }
    }
}

impl QuadXWaypointsCostConfig {
    /// Sets the health penalty inclusion.
    pub fn include_health_penalty(mut self, v: bool) -> Self {
        self.include_health_penalty = v;
        self
    }

    /// Sets a fixed health penalty size.
    pub fn health_penalty_size(mut self, v: Option<f64>) -> Self {
        self.health_penalty_size = v;
        self
    }

    /// Sets the episode step limit used for the default health penalty.
    pub fn max_episode_steps(mut self, v: usize) -> Self {
        self.max_episode_steps = v;
        self
    }

    /// Constructs [`QuadXWaypointsCostConfig`] from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`QuadXWaypointsCostConfig`] as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Step information of [`QuadXWaypointsCost`].
#[derive(Clone, Debug)]
pub struct QuadXInfo {
    /// Number of waypoints reached so far this episode.
    pub num_targets_reached: usize,

    /// Whether every waypoint of the episode has been reached.
    pub env_complete: bool,

    /// Whether the quadrotor collided.
    pub collision: bool,

    /// Whether the quadrotor left the flight dome.
    pub out_of_bounds: bool,
}

impl Info for QuadXInfo {}

/// Waypoint-tracking cost layer over a quadrotor flight backend.
///
/// The cost of a step is the penalty for moving away from the immediate
/// waypoint plus an inverse-distance term, zero on steps that reach a
/// waypoint or complete the course, and optionally a health penalty when a
/// terminal step crashed or left the flight dome.
pub struct QuadXWaypointsCost<B: QuadXBackend> {
    backend: B,
    include_health_penalty: bool,
    health_penalty_size: Option<f64>,
    max_episode_steps: usize,
    observe_waypoint_targets: bool,
    only_immediate_waypoint: bool,
    observe_target_deltas: bool,
    only_immediate_target_delta: bool,
    agent_hz: usize,

    step_count: usize,
    previous_targets_reached: usize,
    episode_targets: Vec<[f64; 3]>,
    immediate_target: [f64; 3],
    initial_seed: Option<u64>,
    done_warned: bool,
    done: bool,
}

impl<B: QuadXBackend> QuadXWaypointsCost<B> {
    const NAME: &'static str = "QuadXWaypointsCost";

    /// Wraps a backend.
    pub fn new(backend: B, config: &QuadXWaypointsCostConfig) -> Result<Self> {
        ensure!(
            config.observe_waypoint_targets || config.observe_target_deltas,
            "either waypoint targets or target deltas must be observed for \
             the agent to be able to learn"
        );
        Ok(Self {
            backend,
            include_health_penalty: config.include_health_penalty,
            health_penalty_size: config.health_penalty_size,
            max_episode_steps: config.max_episode_steps,
            observe_waypoint_targets: config.observe_waypoint_targets,
            only_immediate_waypoint: config.only_immediate_waypoint,
            observe_target_deltas: config.observe_target_deltas,
            only_immediate_target_delta: config.only_immediate_target_delta,
            agent_hz: config.agent_hz,
            step_count: 0,
            previous_targets_reached: 0,
            episode_targets: Vec::new(),
            immediate_target: [0.0; 3],
            initial_seed: None,
            done_warned: false,
            done: false,
        })
    }

    /// The environment step size in seconds.
    pub fn dt(&self) -> f64 {
        1.0 / self.agent_hz as f64
    }

    /// Returns a reference to the flight backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The waypoint targets of the running episode, as captured at reset.
    pub fn episode_targets(&self) -> &[[f64; 3]] {
        &self.episode_targets
    }

    /// The immediate waypoint target.
    pub fn immediate_waypoint_target(&self) -> [f64; 3] {
        self.immediate_target
    }

    /// Deltas between the episode's waypoint targets and the current
    /// position.
    ///
    /// Computed against the waypoint list captured at reset; the backend
    /// drops a waypoint from its own list once it is reached.
    pub fn target_deltas(&self) -> Vec<[f64; 3]> {
        let pos = self.backend.position();
        self.episode_targets
            .iter()
            .map(|t| [t[0] - pos[0], t[1] - pos[1], t[2] - pos[2]])
            .collect()
    }

    /// Cost of the current state.
    fn cost(&mut self, env_complete: bool, num_targets_reached: usize) -> f64 {
        if env_complete || num_targets_reached > self.previous_targets_reached {
            self.previous_targets_reached = num_targets_reached;
            return 0.0;
        }

        // Penalize moving away from the target.
        let mut cost = -(3.0 * self.backend.progress_to_target()).min(0.0);
        cost += 0.1 / self.backend.distance_to_immediate();
        cost
    }

    fn observe(&self, attitude: &[f64]) -> Array1<f64> {
        let mut obs = attitude.to_vec();
        if self.observe_waypoint_targets {
            if self.only_immediate_waypoint {
                obs.extend_from_slice(&self.immediate_target);
            } else {
                for t in &self.episode_targets {
                    obs.extend_from_slice(t);
                }
            }
        }
        if self.observe_target_deltas {
            let deltas = self.target_deltas();
            if self.only_immediate_target_delta {
                obs.extend_from_slice(&deltas[self.previous_targets_reached.min(deltas.len() - 1)]);
            } else {
                for d in &deltas {
                    obs.extend_from_slice(d);
                }
            }
        }
        Array1::from(obs)
    }

    fn diagnostics(&self, outcome: &QuadXOutcome) -> (QuadXInfo, Record) {
        let info = QuadXInfo {
            num_targets_reached: outcome.num_targets_reached,
            env_complete: outcome.env_complete,
            collision: outcome.collision,
            out_of_bounds: outcome.out_of_bounds,
        };
        let record = Record::from_slice(&[
            (
                "num_targets_reached",
                RecordValue::Scalar(outcome.num_targets_reached as f64),
            ),
            ("env_complete", RecordValue::Bool(outcome.env_complete)),
            ("collision", RecordValue::Bool(outcome.collision)),
            ("out_of_bounds", RecordValue::Bool(outcome.out_of_bounds)),
        ]);
        (info, record)
    }
}

impl<B: QuadXBackend + Default> Env for QuadXWaypointsCost<B> {
    type Config = QuadXWaypointsCostConfig;
    type Obs = Array1<f64>;
    type Act = Array1<f64>;
    type Info = QuadXInfo;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        let mut env = Self::new(B::default(), config)?;
        env.initial_seed = Some(seed as u64);
        Ok(env)
    }

    fn reset(
        &mut self,
        seed: Option<u64>,
        _options: Option<&ResetOptions>,
    ) -> Result<(Self::Obs, Record)> {
        let seed = seed.or_else(|| self.initial_seed.take());
        let outcome = self.backend.reset(seed)?;

        self.step_count = 0;
        self.previous_targets_reached = 0;
        self.episode_targets = self.backend.waypoint_targets();
        self.immediate_target = self.episode_targets[0];
        self.done_warned = false;
        self.done = false;

        let (_, record) = self.diagnostics(&outcome);
        Ok((self.observe(&outcome.attitude), record))
    }

    fn step(&mut self, a: &Self::Act) -> (Step<Self>, Record) {
        if self.done && !self.done_warned {
            warn!(
                "{}: step() called even though the episode returned terminated = true. \
                 Call reset() once you receive terminated = true; further steps are \
                 undefined behavior",
                Self::NAME
            );
            self.done_warned = true;
        }

        let outcome = self.backend.step(a.as_slice().unwrap());
        self.step_count += 1;

        let mut cost = self.cost(outcome.env_complete, outcome.num_targets_reached);

        // Add the health penalty at the end of an unhealthy episode.
        if self.include_health_penalty
            && outcome.terminated
            && (outcome.collision || outcome.out_of_bounds)
        {
            cost += match self.health_penalty_size {
                Some(size) => size,
                None => self.max_episode_steps.saturating_sub(self.step_count) as f64,
            };
        }

        self.previous_targets_reached = outcome.num_targets_reached;
        if let Some(first) = self.backend.waypoint_targets().first() {
            self.immediate_target = *first;
        }
        self.done = outcome.terminated;

        let (info, record) = self.diagnostics(&outcome);
        let step = Step::new(
            self.observe(&outcome.attitude),
            a.clone(),
            cost,
            outcome.terminated,
            false,
            info,
        );
        (step, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Flies a straight, scripted line through two waypoints; terminal
    /// crash on demand.
    struct ScriptedBackend {
        targets: Vec<[f64; 3]>,
        position: [f64; 3],
        previous_distance: f64,
        velocity: f64,
        crash_at_step: Option<usize>,
        steps: usize,
    }

    impl Default for ScriptedBackend {
        fn default() -> Self {
            Self {
                targets: vec![[0.0, 0.0, 1.0], [0.0, 0.0, 2.0]],
                position: [0.0; 3],
                previous_distance: 0.0,
                velocity: 0.1,
                crash_at_step: None,
                steps: 0,
            }
        }
    }

    impl ScriptedBackend {
        fn distance(&self) -> f64 {
            let t = self.targets[0];
            let d = [
                t[0] - self.position[0],
                t[1] - self.position[1],
                t[2] - self.position[2],
            ];
            (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
        }
    }

    impl QuadXBackend for ScriptedBackend {
        fn reset(&mut self, _seed: Option<u64>) -> Result<QuadXOutcome> {
            self.position = [0.0; 3];
            self.steps = 0;
            self.targets = vec![[0.0, 0.0, 1.0], [0.0, 0.0, 2.0]];
            self.previous_distance = self.distance();
            Ok(QuadXOutcome {
                attitude: vec![0.0; 12],
                ..QuadXOutcome::default()
            })
        }

        fn step(&mut self, action: &[f64]) -> QuadXOutcome {
            self.steps += 1;
            self.previous_distance = self.distance();
            // Positive first action component climbs toward the targets.
            self.position[2] += self.velocity * action[0].signum();

            let mut reached = 0;
            if self.distance() < 0.2 {
                self.targets.remove(0);
                reached = 1;
            }
            let env_complete = self.targets.is_empty();
            if env_complete {
                self.targets = vec![[0.0, 0.0, 2.0]];
            }

            let crashed = self.crash_at_step == Some(self.steps);
            QuadXOutcome {
                attitude: vec![0.0; 12],
                terminated: crashed || env_complete,
                truncated: false,
                collision: crashed,
                out_of_bounds: false,
                env_complete,
                num_targets_reached: reached,
            }
        }

        fn position(&self) -> [f64; 3] {
            self.position
        }

        fn waypoint_targets(&self) -> Vec<[f64; 3]> {
            self.targets.clone()
        }

        fn progress_to_target(&self) -> f64 {
            self.previous_distance - self.distance()
        }

        fn distance_to_immediate(&self) -> f64 {
            self.distance()
        }
    }

    fn build(config: &QuadXWaypointsCostConfig) -> QuadXWaypointsCost<ScriptedBackend> {
        QuadXWaypointsCost::build(config, 0).unwrap()
    }

    #[test]
    fn test_observation_length_follows_config() -> Result<()> {
        let mut env = build(&QuadXWaypointsCostConfig::default());
        let (obs, _) = env.reset(None, None)?;
        // Attitude (12) plus the immediate waypoint target.
        assert_eq!(obs.len(), 15);

        let config = QuadXWaypointsCostConfig {
            observe_target_deltas: true,
            ..QuadXWaypointsCostConfig::default()
        };
        let mut env = build(&config);
        let (obs, _) = env.reset(None, None)?;
        assert_eq!(obs.len(), 18);
        Ok(())
    }

    #[test]
    fn test_cost_is_zero_on_waypoint_reach() -> Result<()> {
        let mut env = build(&QuadXWaypointsCostConfig::default());
        env.reset(None, None)?;

        let a = Array1::from(vec![1.0, 0.0, 0.0, 0.0]);
        let mut reached_zero_cost = false;
        for _ in 0..30 {
            let (step, record) = env.step(&a);
            if record.get_scalar("num_targets_reached")? > 0.0 {
                assert_eq!(step.cost, 0.0);
                reached_zero_cost = true;
                break;
            }
            assert!(step.cost > 0.0);
        }
        assert!(reached_zero_cost);
        Ok(())
    }

    #[test]
    fn test_moving_away_is_penalized() -> Result<()> {
        let mut env = build(&QuadXWaypointsCostConfig::default());
        env.reset(None, None)?;

        let toward = Array1::from(vec![1.0, 0.0, 0.0, 0.0]);
        let away = Array1::from(vec![-1.0, 0.0, 0.0, 0.0]);
        let (step_toward, _) = env.step(&toward);
        env.reset(None, None)?;
        let (step_away, _) = env.step(&away);
        assert!(step_away.cost > step_toward.cost);
        Ok(())
    }

    #[test]
    fn test_health_penalty_on_terminal_crash() -> Result<()> {
        let config = QuadXWaypointsCostConfig::default()
            .health_penalty_size(Some(50.0));
        let mut env = build(&config);
        env.reset(None, None)?;
        env.backend.crash_at_step = Some(3);

        let a = Array1::from(vec![1.0, 0.0, 0.0, 0.0]);
        let mut crashed = false;
        for _ in 0..5 {
            let (step, record) = env.step(&a);
            if step.terminated {
                assert!(record.get_bool("collision")?);
                assert!(step.cost >= 50.0);
                crashed = true;
                break;
            }
        }
        assert!(crashed);
        Ok(())
    }

    #[test]
    fn test_default_health_penalty_counts_remaining_steps() -> Result<()> {
        let config = QuadXWaypointsCostConfig::default().max_episode_steps(100);
        let mut env = build(&config);
        env.reset(None, None)?;
        env.backend.crash_at_step = Some(1);

        let a = Array1::from(vec![1.0, 0.0, 0.0, 0.0]);
        let (step, _) = env.step(&a);
        assert!(step.terminated);
        // 99 remaining steps plus the motion cost of the step itself.
        assert!(step.cost >= 99.0);
        Ok(())
    }

    #[test]
    fn test_config_requires_some_waypoint_observation() {
        let config = QuadXWaypointsCostConfig {
            observe_waypoint_targets: false,
            observe_target_deltas: false,
            ..QuadXWaypointsCostConfig::default()
        };
        assert!(QuadXWaypointsCost::new(ScriptedBackend::default(), &config).is_err());
    }
}
