//! Continuous-action cart-pole with a cost signal.
//!
//! A pole is attached by an un-actuated joint to a cart moving along a
//! frictionless track. The action is the force applied to the cart; the
//! reward of the classical formulation is replaced with a cost on the cart
//! position and pole angle, optionally augmented with a reference-tracking
//! error on the cart position.
use crate::{BoxSpace, Disturber, Episode, Integrator, ReferenceSignal};
use anyhow::Result;
use ndarray::{array, Array1};
use serde::{Deserialize, Serialize};
use simcost_core::{
    error::SimcostError,
    record::{Record, RecordValue},
    Env, Info, ResetOptions, Step,
};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

const TERMINAL_PENALTY: f64 = 100.0;

/// The control objective of the environment.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskType {
    /// Hold the cart position and pole angle near zero.
    Stabilization,

    /// Stabilization plus tracking of a moving cart-position reference.
    ReferenceTracking,
}

/// Physical parameters of the cart-pole system.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CartPoleParams {
    /// Gravitational acceleration.
    pub gravity: f64,

    /// Cart mass.
    pub masscart: f64,

    /// Pole mass.
    pub masspole: f64,

    /// Full pole length; the centre of mass sits at half of it.
    pub length: f64,
}

impl Default for CartPoleParams {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            masscart: 1.0,
            masspole: 0.1,
            length: 1.0,
        }
    }
}

impl CartPoleParams {
    /// The full mass of the system.
    pub fn total_mass(&self) -> f64 {
        self.masspole + self.masscart
    }

    /// Distance from the pivot to the pole's centre of mass.
    pub fn com_length(&self) -> f64 {
        self.length * 0.5
    }

    /// Pole mass times the centre-of-mass distance.
    pub fn polemass_length(&self) -> f64 {
        self.masspole * self.com_length()
    }
}

/// Configuration of [`CartPoleCost`].
///
/// The historical variants of this environment disagree on several
/// constants (force magnitude, thresholds, initial-state ranges); each of
/// them is an independent field here, with defaults following the newer
/// variant.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CartPoleCostConfig {
    /// The control objective.
    pub task_type: TaskType,

    /// The cart-position reference used by
    /// [`TaskType::ReferenceTracking`]; its target also defines the target
    /// position reported in the diagnostics.
    pub reference: ReferenceSignal,

    /// Whether out-of-range actions are clipped (with a one-time advisory)
    /// instead of asserted.
    pub clip_action: bool,

    /// The kinematics integration scheme.
    pub integrator: Integrator,

    /// Maximum magnitude of the applied force.
    pub force_mag: f64,

    /// Seconds between state updates.
    pub tau: f64,

    /// Cart position at which the episode fails.
    pub x_threshold: f64,

    /// Pole angle (radians) at which the episode fails.
    pub theta_threshold: f64,

    /// Velocity bound of the observation space.
    pub max_v: f64,

    /// Angular-velocity bound of the observation space.
    pub max_w: f64,

    /// Constraint position reported in the diagnostics.
    pub const_pos: f64,

    /// Lower bounds of the initial-state sampler.
    pub init_state_low: Vec<f64>,

    /// Upper bounds of the initial-state sampler.
    pub init_state_high: Vec<f64>,

    /// Physical parameters.
    pub params: CartPoleParams,
}

impl Default for CartPoleCostConfig {
    fn default() -> Self {
        Self {
            task_type: TaskType::Stabilization,
            reference: ReferenceSignal::Constant { target: 0.0 },
            clip_action: true,
            integrator: Integrator::Euler,
            force_mag: 20.0,
            tau: 0.02,
            x_threshold: 10.0,
            theta_threshold: 20.0 * 2.0 * std::f64::consts::PI / 360.0,
            max_v: 50.0,
            max_w: 50.0,
            const_pos: 4.0,
            init_state_low: vec![-2.0, -0.2, -0.2, -0.2],
            init_state_high: vec![2.0, 0.2, 0.2, 0.2],
            params: CartPoleParams::default(),
        }
    }
}

impl CartPoleCostConfig {
    /// Sets the control objective.
    pub fn task_type(mut self, v: TaskType) -> Self {
        self.task_type = v;
        self
    }

    /// Sets the reference signal.
    pub fn reference(mut self, v: ReferenceSignal) -> Self {
        self.reference = v;
        self
    }

    /// Sets the integration scheme.
    pub fn integrator(mut self, v: Integrator) -> Self {
        self.integrator = v;
        self
    }

    /// Sets action clipping.
    pub fn clip_action(mut self, v: bool) -> Self {
        self.clip_action = v;
        self
    }

    /// Constructs [`CartPoleCostConfig`] from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`CartPoleCostConfig`] as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Step information of [`CartPoleCost`].
#[derive(Clone, Debug)]
pub struct CartPoleInfo {
    /// The constraint boundary position.
    pub cons_pos: f64,

    /// The pole-angle failure threshold.
    pub cons_theta: f64,

    /// The target cart position.
    pub target: f64,

    /// Whether the cart crossed the constraint boundary.
    pub violation_of_constraint: bool,

    /// Whether the cart crossed the position failure threshold.
    pub violation_of_x_threshold: bool,

    /// Cart-position and pole-angle references.
    pub reference: [f64; 2],

    /// The pole angle; exposed for external robustness evaluation.
    pub state_of_interest: f64,
}

impl Info for CartPoleInfo {}

/// Cart-pole environment with a cost signal.
///
/// The state vector is `[x, x_dot, theta, theta_dot]`.
pub struct CartPoleCost {
    task_type: TaskType,
    reference: ReferenceSignal,
    clip_action: bool,
    integrator: Integrator,
    force_mag: f64,
    x_threshold: f64,
    theta_threshold: f64,
    const_pos: f64,

    params: CartPoleParams,
    init_params: CartPoleParams,

    action_space: BoxSpace,
    observation_space: BoxSpace,
    cost_range: BoxSpace,

    state: Array1<f64>,
    episode: Episode,
    rng: fastrand::Rng,
    disturber: Option<Box<dyn Disturber>>,

    init_state: Array1<f64>,
    init_bounds: (Vec<f64>, Vec<f64>),
}

impl CartPoleCost {
    const NAME: &'static str = "CartPoleCost";

    /// The action space of the environment.
    pub fn action_space(&self) -> &BoxSpace {
        &self.action_space
    }

    /// The observation space of the environment.
    pub fn observation_space(&self) -> &BoxSpace {
        &self.observation_space
    }

    /// The admissible cost range.
    pub fn cost_range(&self) -> &BoxSpace {
        &self.cost_range
    }

    /// The fixed step size.
    pub fn dt(&self) -> f64 {
        self.episode.dt()
    }

    /// Elapsed simulated time.
    pub fn t(&self) -> f64 {
        self.episode.t()
    }

    /// Replaces the physical parameters.
    pub fn set_params(&mut self, params: CartPoleParams) {
        self.params = params;
    }

    /// The current physical parameters.
    pub fn get_params(&self) -> &CartPoleParams {
        &self.params
    }

    /// Restores the physical parameters the environment was built with.
    pub fn reset_params(&mut self) {
        self.params = self.init_params.clone();
    }

    /// Installs a disturbance-injection collaborator.
    pub fn set_disturber(&mut self, disturber: Box<dyn Disturber>) {
        self.disturber = Some(disturber);
    }

    /// Whether the out-of-range action advisory has fired this episode.
    pub fn action_clip_warned(&self) -> bool {
        self.episode.action_clip_warned()
    }

    /// Rendering is not implemented for this environment.
    pub fn render(&self) -> Result<(), SimcostError> {
        Err(SimcostError::NotSupported(
            "no render method is implemented for the CartPoleCost environment".into(),
        ))
    }

    /// Cost of a cart position and pole angle, plus the reference values it
    /// was computed against.
    pub fn cost(&self, x: f64, theta: f64) -> (f64, [f64; 2]) {
        let stab_cost = x * x / 100.0 + 20.0 * (theta / self.theta_threshold).powi(2);
        match self.task_type {
            TaskType::ReferenceTracking => {
                let r = [self.reference.value(self.episode.t()), 0.0];
                (stab_cost + (x - r[0]).abs(), r)
            }
            TaskType::Stabilization => (stab_cost, [0.0, 0.0]),
        }
    }

    /// Accelerations from the force balance of the pole on the cart.
    fn accelerations(&self, force: f64, state: &[f64]) -> (f64, f64) {
        let p = &self.params;
        let (x_dot, theta, theta_dot) = (state[1], state[2], state[3]);
        let cos_theta = theta.cos();
        let sin_theta = theta.sin();

        let temp =
            (force + p.polemass_length() * theta_dot * theta_dot * sin_theta) / p.total_mass();
        let theta_acc = (p.gravity * sin_theta - cos_theta * temp)
            / (p.com_length() * (4.0 / 3.0 - p.masspole * cos_theta * cos_theta / p.total_mass()));
        let mut x_acc = temp - p.polemass_length() * theta_acc * cos_theta / p.total_mass();
        if let Some(drag) = self.integrator.linear_drag() {
            x_acc -= drag * x_dot / p.total_mass();
        }
        (x_acc, theta_acc)
    }

    fn target(&self) -> f64 {
        match &self.reference {
            ReferenceSignal::Constant { target } => *target,
            ReferenceSignal::Periodic { target, .. } => *target,
        }
    }

    fn diagnostics(&self, reference: [f64; 2]) -> (CartPoleInfo, Record) {
        let x = self.state[0];
        let theta = self.state[2];
        let violation_of_constraint = x.abs() > self.const_pos;
        let violation_of_x_threshold = x.abs() > self.x_threshold;
        let info = CartPoleInfo {
            cons_pos: self.const_pos,
            cons_theta: self.theta_threshold,
            target: self.target(),
            violation_of_constraint,
            violation_of_x_threshold,
            reference,
            state_of_interest: theta,
        };
        let record = Record::from_slice(&[
            ("cons_pos", RecordValue::Scalar(self.const_pos)),
            ("cons_theta", RecordValue::Scalar(self.theta_threshold)),
            ("target", RecordValue::Scalar(info.target)),
            (
                "violation_of_constraint",
                RecordValue::Bool(violation_of_constraint),
            ),
            (
                "violation_of_x_threshold",
                RecordValue::Bool(violation_of_x_threshold),
            ),
            ("reference", RecordValue::Array1(reference.to_vec())),
            ("state_of_interest", RecordValue::Scalar(theta)),
        ]);
        (info, record)
    }
}

impl Env for CartPoleCost {
    type Config = CartPoleCostConfig;
    type Obs = Array1<f64>;
    type Act = Array1<f64>;
    type Info = CartPoleInfo;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        // Observation bounds are twice the failure thresholds so that a
        // failing observation is still within the space.
        let obs_high = vec![
            config.x_threshold * 2.0,
            config.max_v,
            config.theta_threshold * 2.0,
            config.max_w,
        ];

        Ok(Self {
            task_type: config.task_type,
            reference: config.reference.clone(),
            clip_action: config.clip_action,
            integrator: config.integrator.clone(),
            force_mag: config.force_mag,
            x_threshold: config.x_threshold,
            theta_threshold: config.theta_threshold,
            const_pos: config.const_pos,
            params: config.params.clone(),
            init_params: config.params.clone(),
            action_space: BoxSpace::symmetric(vec![config.force_mag]),
            observation_space: BoxSpace::symmetric(obs_high),
            cost_range: BoxSpace::new(vec![0.0], vec![100.0]),
            state: Array1::zeros(4),
            episode: Episode::new(config.tau),
            rng: fastrand::Rng::with_seed(seed as u64),
            disturber: None,
            init_state: array![0.1, 0.2, 0.3, 0.1],
            init_bounds: (config.init_state_low.clone(), config.init_state_high.clone()),
        })
    }

    fn reset(
        &mut self,
        seed: Option<u64>,
        options: Option<&ResetOptions>,
    ) -> Result<(Self::Obs, Record)> {
        if let Some(seed) = seed {
            self.rng = fastrand::Rng::with_seed(seed);
        }

        let default = ResetOptions::default();
        let options = options.unwrap_or(&default);

        self.state = if options.random {
            let low = options.low.clone().unwrap_or_else(|| self.init_bounds.0.clone());
            let high = options
                .high
                .clone()
                .unwrap_or_else(|| self.init_bounds.1.clone());
            if !self.observation_space.contains(&low) || !self.observation_space.contains(&high) {
                return Err(SimcostError::InvalidResetBounds {
                    bounds: (low, high),
                    space: (
                        self.observation_space.low().to_vec(),
                        self.observation_space.high().to_vec(),
                    ),
                }
                .into());
            }
            low.iter()
                .zip(high.iter())
                .map(|(l, h)| l + self.rng.f64() * (h - l))
                .collect()
        } else {
            self.init_state.clone()
        };
        self.episode.reset();

        let (_, reference) = self.cost(self.state[0], self.state[2]);
        let (_, record) = self.diagnostics(reference);
        Ok((self.state.clone(), record))
    }

    fn step(&mut self, a: &Self::Act) -> (Step<Self>, Record) {
        let mut u = if self.clip_action {
            if !self.action_space.contains(a.as_slice().unwrap()) {
                self.episode
                    .warn_action_clipped(Self::NAME, a.as_slice().unwrap());
            }
            self.action_space.clip(a)
        } else {
            debug_assert!(
                self.action_space.contains(a.as_slice().unwrap()),
                "action {:?} outside the action space",
                a
            );
            a.clone()
        };

        if let Some(d) = self.disturber.as_mut() {
            d.disturb_action(self.episode.t(), &mut u);
        }
        let force = u[0];

        let (x_acc, theta_acc) = self.accelerations(force, self.state.as_slice().unwrap());
        let mut deriv = [self.state[1], x_acc, self.state[3], theta_acc];
        if let Some(d) = self.disturber.as_mut() {
            d.disturb_derivatives(self.episode.t(), &mut deriv);
        }

        let tau = self.episode.dt();
        let (mut x, mut x_dot) = (self.state[0], self.state[1]);
        let (mut theta, mut theta_dot) = (self.state[2], self.state[3]);
        self.integrator.advance_pair(tau, &mut x, &mut x_dot, deriv[1]);
        self.integrator
            .advance_pair(tau, &mut theta, &mut theta_dot, deriv[3]);
        self.state = array![x, x_dot, theta, theta_dot];
        self.episode.advance(Self::NAME);

        let (mut cost, reference) = self.cost(x, theta);

        let terminated = x.abs() > self.x_threshold
            || theta.abs() > self.theta_threshold
            || !self.cost_range.contains(&[cost]);
        if terminated {
            cost = TERMINAL_PENALTY;
        }
        self.episode.finish(terminated);

        let (info, record) = self.diagnostics(reference);
        let step = Step::new(self.state.clone(), a.clone(), cost, terminated, false, info);
        (step, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(config: &CartPoleCostConfig) -> CartPoleCost {
        CartPoleCost::build(config, 0).unwrap()
    }

    fn zero_state_options() -> ResetOptions {
        ResetOptions::default().bounds(vec![0.0; 4], vec![0.0; 4])
    }

    #[test]
    fn test_termination_and_penalty_under_max_force() -> Result<()> {
        let mut env = build(&CartPoleCostConfig::default());
        env.reset(Some(0), Some(&ResetOptions::deterministic()))?;

        let a = array![20.0];
        let mut terminated = false;
        for _ in 0..5000 {
            let (step, _) = env.step(&a);
            if step.terminated {
                assert_eq!(step.cost, 100.0);
                terminated = true;
                break;
            }
        }
        assert!(terminated, "sustained maximal force must end the episode");
        Ok(())
    }

    #[test]
    fn test_integrators_agree_at_rest() -> Result<()> {
        let mut euler = build(&CartPoleCostConfig::default());
        let mut semi =
            build(&CartPoleCostConfig::default().integrator(Integrator::SemiImplicitEuler));

        let (obs_e, _) = euler.reset(None, Some(&zero_state_options()))?;
        let (obs_s, _) = semi.reset(None, Some(&zero_state_options()))?;
        assert_eq!(obs_e, obs_s);

        let a = array![0.0];
        let (step_e, _) = euler.step(&a);
        let (step_s, _) = semi.step(&a);
        assert_eq!(step_e.obs, step_s.obs);
        assert_eq!(step_e.cost, step_s.cost);
        Ok(())
    }

    #[test]
    fn test_friction_damps_the_cart() -> Result<()> {
        let mut plain = build(&CartPoleCostConfig::default());
        let mut friction =
            build(&CartPoleCostConfig::default().integrator(Integrator::EulerFriction { drag: 0.1 }));

        // Give the cart some velocity, keep the pole upright.
        let options = ResetOptions::default()
            .bounds(vec![0.0, 1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0, 0.0]);
        plain.reset(None, Some(&options))?;
        friction.reset(None, Some(&options))?;

        let a = array![0.0];
        let (step_p, _) = plain.step(&a);
        let (step_f, _) = friction.step(&a);
        assert!(step_f.obs[1] < step_p.obs[1]);
        Ok(())
    }

    #[test]
    fn test_reference_tracking_adds_error_term() -> Result<()> {
        let stab_cfg = CartPoleCostConfig::default();
        let track_cfg = CartPoleCostConfig::default()
            .task_type(TaskType::ReferenceTracking)
            .reference(ReferenceSignal::Periodic {
                target: 0.0,
                amplitude: 7.0,
                period: 200.0,
            });
        let mut stab = build(&stab_cfg);
        let mut track = build(&track_cfg);

        stab.reset(None, Some(&ResetOptions::deterministic()))?;
        track.reset(None, Some(&ResetOptions::deterministic()))?;

        let a = array![0.0];
        let (step_s, _) = stab.step(&a);
        let (step_t, record_t) = track.step(&a);
        assert!(step_t.cost > step_s.cost);
        assert_eq!(record_t.get_array1("reference")?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_cost_within_range_until_termination() -> Result<()> {
        let mut env = build(&CartPoleCostConfig::default());
        env.reset(Some(5), None)?;
        for _ in 0..200 {
            let (step, _) = env.step(&array![2.0]);
            if step.terminated {
                assert_eq!(step.cost, 100.0);
                break;
            }
            assert!(step.cost >= 0.0 && step.cost <= 100.0);
        }
        Ok(())
    }

    #[test]
    fn test_determinism_with_seed() -> Result<()> {
        let mut a = build(&CartPoleCostConfig::default());
        let mut b = build(&CartPoleCostConfig::default());
        let (obs_a, _) = a.reset(Some(7), None)?;
        let (obs_b, _) = b.reset(Some(7), None)?;
        assert_eq!(obs_a, obs_b);

        for i in 0..100 {
            let act = array![(i % 5) as f64 - 2.0];
            let (sa, _) = a.step(&act);
            let (sb, _) = b.step(&act);
            assert_eq!(sa.obs, sb.obs);
            assert_eq!(sa.cost, sb.cost);
            if sa.terminated {
                break;
            }
        }
        Ok(())
    }

    #[test]
    fn test_invalid_reset_bounds_fail() -> Result<()> {
        let mut env = build(&CartPoleCostConfig::default());
        let options = ResetOptions::default().bounds(vec![-30.0, 0.0, 0.0, 0.0], vec![2.0; 4]);
        assert!(env.reset(None, Some(&options)).is_err());
        Ok(())
    }

    #[test]
    fn test_violation_flags() -> Result<()> {
        let mut env = build(&CartPoleCostConfig::default());
        // Start beyond the constraint position but inside the threshold.
        let options = ResetOptions::default()
            .bounds(vec![4.5, 0.0, 0.0, 0.0], vec![4.5, 0.0, 0.0, 0.0]);
        env.reset(None, Some(&options))?;
        let (step, record) = env.step(&array![0.0]);
        assert!(step.info.violation_of_constraint);
        assert!(!step.info.violation_of_x_threshold);
        assert!(record.get_bool("violation_of_constraint")?);
        Ok(())
    }

    #[test]
    fn test_config_yaml_roundtrip() -> Result<()> {
        use tempdir::TempDir;

        let config = CartPoleCostConfig::default()
            .task_type(TaskType::ReferenceTracking)
            .integrator(Integrator::EulerFriction { drag: 0.2 });
        let dir = TempDir::new("cartpole_config")?;
        let path = dir.path().join("config.yaml");
        config.save(&path)?;
        let loaded = CartPoleCostConfig::load(&path)?;
        assert_eq!(config, loaded);
        Ok(())
    }
}
