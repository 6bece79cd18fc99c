//! Synthetic oscillatory network of transcriptional regulators.
//!
//! A repressilator: three mRNA/protein pairs where each protein inhibits
//! transcription of the *next* mRNA in a cyclic ring. The agent injects
//! leakiness into each transcription unit so that the first protein
//! concentration tracks a reference signal.
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

/// Cost substituted for the formula value once a termination condition
/// fires.
const TERMINAL_PENALTY: f64 = 100.0;

/// Rate constants of the oscillatory network.
///
/// Owned exclusively by one environment instance and mutable through
/// [`Oscillator::set_params`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OscillatorParams {
    /// Dissociation constant of the Hill-type production terms.
    pub k: f64,

    /// Maximal mRNA production rate.
    pub c1: f64,

    /// mRNA decay rate.
    pub c2: f64,

    /// Protein production rate.
    pub c3: f64,

    /// Protein decay rate.
    pub c4: f64,

    /// Actuation gain per transcription unit.
    pub b: [f64; 3],
}

impl Default for OscillatorParams {
    fn default() -> Self {
        Self {
            k: 1.0,
            c1: 1.6,
            c2: 0.16,
            c3: 0.16,
            c4: 0.06,
            b: [1.0, 1.0, 1.0],
        }
    }
}

/// Configuration of [`Oscillator`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OscillatorConfig {
    /// The reference the first protein concentration tracks.
    pub reference: ReferenceSignal,

    /// Whether out-of-range actions are clipped (with a one-time advisory)
    /// instead of asserted.
    pub clip_action: bool,

    /// Variance bound of the per-step uniform system noise. Zero makes the
    /// dynamics deterministic.
    pub sigma: f64,

    /// Step size in simulated time units.
    pub dt: f64,

    /// Network rate constants.
    pub params: OscillatorParams,
}

impl Default for OscillatorConfig {
    fn default() -> Self {
        Self {
            reference: ReferenceSignal::Periodic {
                target: 8.0,
                amplitude: 7.0,
                period: 200.0,
            },
            clip_action: true,
            sigma: 0.0,
            dt: 1.0,
            params: OscillatorParams::default(),
        }
    }
}

impl OscillatorConfig {
    /// Sets the reference signal.
    pub fn reference(mut self, v: ReferenceSignal) -> Self {
        self.reference = v;
        self
    }

    /// Sets action clipping.
    pub fn clip_action(mut self, v: bool) -> Self {
        self.clip_action = v;
        self
    }

    /// Sets the system noise bound.
    pub fn sigma(mut self, v: f64) -> Self {
        self.sigma = v;
        self
    }

    /// Constructs [`OscillatorConfig`] from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`OscillatorConfig`] as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Step information of [`Oscillator`].
#[derive(Clone, Debug)]
pub struct OscillatorInfo {
    /// The current reference value.
    pub reference: f64,

    /// Tracking error between the first protein and the reference; exposed
    /// for external robustness evaluation.
    pub state_of_interest: f64,
}

impl Info for OscillatorInfo {}

/// Synthetic oscillatory network environment.
///
/// The state vector holds the three mRNA and three protein concentrations
/// `[m1, m2, m3, p1, p2, p3]`; observations append the current reference
/// and the tracking error. Concentrations are clamped to remain
/// non-negative after every integration step.
pub struct Oscillator {
    params: OscillatorParams,
    init_params: OscillatorParams,
    reference: ReferenceSignal,
    clip_action: bool,
    sigma: f64,
    integrator: Integrator,

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

impl Oscillator {
    const NAME: &'static str = "Oscillator";

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

    /// Replaces the network rate constants.
    pub fn set_params(&mut self, params: OscillatorParams) {
        self.params = params;
    }

    /// The current network rate constants.
    pub fn get_params(&self) -> &OscillatorParams {
        &self.params
    }

    /// Restores the rate constants the environment was built with.
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
            "no render method is implemented for the Oscillator environment".into(),
        ))
    }

    /// Time derivatives of the six concentrations.
    ///
    /// Protein `(i + 2) % 3` inhibits transcription of mRNA `i`, closing
    /// the ring.
    fn derivatives(&self, state: &Array1<f64>, u: &Array1<f64>) -> [f64; 6] {
        let p = &self.params;
        let (m, prot) = (&state.as_slice().unwrap()[..3], &state.as_slice().unwrap()[3..]);

        let mut deriv = [0.0; 6];
        for i in 0..3 {
            let inhibitor = prot[(i + 2) % 3];
            deriv[i] = p.c1 / (p.k + inhibitor * inhibitor) - p.c2 * m[i] + p.b[i] * u[i];
            deriv[i + 3] = p.c3 * m[i] - p.c4 * prot[i];
        }
        deriv
    }

    fn noise(&mut self) -> f64 {
        if self.sigma == 0.0 {
            0.0
        } else {
            -self.sigma + self.rng.f64() * 2.0 * self.sigma
        }
    }

    fn observe(&self, r: f64) -> Array1<f64> {
        let s = &self.state;
        array![s[0], s[1], s[2], s[3], s[4], s[5], r, s[3] - r]
    }

    fn diagnostics(&self, r: f64) -> (OscillatorInfo, Record) {
        let soi = self.state[3] - r;
        let info = OscillatorInfo {
            reference: r,
            state_of_interest: soi,
        };
        let record = Record::from_slice(&[
            ("reference", RecordValue::Scalar(r)),
            ("state_of_interest", RecordValue::Scalar(soi)),
        ]);
        (info, record)
    }
}

impl Env for Oscillator {
    type Config = OscillatorConfig;
    type Obs = Array1<f64>;
    type Act = Array1<f64>;
    type Info = OscillatorInfo;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        let high = vec![100.0; 8];

        Ok(Self {
            params: config.params.clone(),
            init_params: config.params.clone(),
            reference: config.reference.clone(),
            clip_action: config.clip_action,
            sigma: config.sigma,
            integrator: Integrator::Euler,
            action_space: BoxSpace::symmetric(vec![5.0; 3]),
            observation_space: BoxSpace::symmetric(high),
            cost_range: BoxSpace::new(vec![0.0], vec![100.0]),
            state: Array1::zeros(6),
            episode: Episode::new(config.dt),
            rng: fastrand::Rng::with_seed(seed as u64),
            disturber: None,
            init_state: array![0.1, 0.2, 0.3, 0.1, 0.2, 0.3],
            init_bounds: (vec![0.0; 6], vec![1.0; 6]),
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
            let n = self.init_state.len();
            let obs_low = &self.observation_space.low().as_slice().unwrap()[..n];
            let obs_high = &self.observation_space.high().as_slice().unwrap()[..n];
            let within = |v: &[f64]| {
                v.len() == n
                    && v.iter()
                        .zip(obs_low.iter().zip(obs_high.iter()))
                        .all(|(x, (l, h))| *x >= *l && *x <= *h)
            };
            if !within(&low) || !within(&high) {
                return Err(SimcostError::InvalidResetBounds {
                    bounds: (low, high),
                    space: (obs_low.to_vec(), obs_high.to_vec()),
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

        let r = self.reference.value(self.episode.t());
        let (_, record) = self.diagnostics(r);
        Ok((self.observe(r), record))
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

        let mut deriv = self.derivatives(&self.state, &u);
        if let Some(d) = self.disturber.as_mut() {
            d.disturb_derivatives(self.episode.t(), &mut deriv);
        }

        // Concentrations can not go negative; clamp after integration.
        let dt = self.episode.dt();
        for i in 0..6 {
            let mut x = self.state[i];
            self.integrator.advance(dt, &mut x, deriv[i]);
            self.state[i] = (x + self.noise()).max(0.0);
        }
        self.episode.advance(Self::NAME);

        let r = self.reference.value(self.episode.t());
        let mut cost = (self.state[3] - r).powi(2);

        let terminated = !self.cost_range.contains(&[cost]);
        if terminated {
            cost = TERMINAL_PENALTY;
        }
        self.episode.finish(terminated);

        let (info, record) = self.diagnostics(r);
        let step = Step::new(self.observe(r), a.clone(), cost, terminated, false, info);
        (step, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Oscillator {
        Oscillator::build(&OscillatorConfig::default(), 0).unwrap()
    }

    #[test]
    fn test_fixed_reset_and_first_step() -> Result<()> {
        let mut env = env();
        let (obs, _) = env.reset(None, Some(&ResetOptions::deterministic()))?;
        assert_eq!(
            obs.as_slice().unwrap()[..6],
            [0.1, 0.2, 0.3, 0.1, 0.2, 0.3]
        );

        let (step, record) = env.step(&Array1::zeros(3));
        let r = 8.0 + 7.0 * (2.0 * std::f64::consts::PI / 200.0).sin();
        assert!((step.obs[6] - r).abs() < 1e-12);
        assert!((record.get_scalar("reference")? - r).abs() < 1e-12);

        // m1' = c1 / (k + p3^2) - c2 m1 = 1.6 / 1.09 - 0.016
        assert!((step.obs[0] - 1.551889908256881).abs() < 1e-9);
        // p1' = c3 m1 - c4 p1 = 0.016 - 0.006
        assert!((step.obs[3] - 0.11).abs() < 1e-12);
        assert!(!step.terminated);
        Ok(())
    }

    #[test]
    fn test_concentrations_stay_non_negative() -> Result<()> {
        let mut env = env();
        env.reset(Some(3), None)?;
        let a = array![-5.0, -5.0, -5.0];
        for _ in 0..200 {
            let (step, _) = env.step(&a);
            assert!(step.obs.iter().take(6).all(|&x| x >= 0.0));
            if step.terminated {
                break;
            }
        }
        Ok(())
    }

    #[test]
    fn test_determinism_with_seed() -> Result<()> {
        let mut a = env();
        let mut b = env();
        let (obs_a, _) = a.reset(Some(42), None)?;
        let (obs_b, _) = b.reset(Some(42), None)?;
        assert_eq!(obs_a, obs_b);

        let act = array![0.3, -0.2, 1.0];
        for _ in 0..50 {
            let (sa, _) = a.step(&act);
            let (sb, _) = b.step(&act);
            assert_eq!(sa.obs, sb.obs);
            assert_eq!(sa.cost, sb.cost);
            assert_eq!(sa.terminated, sb.terminated);
        }
        Ok(())
    }

    #[test]
    fn test_clip_advisory_recorded_once() -> Result<()> {
        let mut env = env();
        env.reset(Some(0), None)?;
        assert!(!env.action_clip_warned());
        env.step(&array![9.0, 0.0, 0.0]);
        assert!(env.action_clip_warned());
        env.step(&array![9.0, 0.0, 0.0]);
        assert!(env.action_clip_warned());
        Ok(())
    }

    #[test]
    fn test_invalid_reset_bounds_fail() -> Result<()> {
        let mut env = env();
        let options = ResetOptions::default().bounds(vec![-200.0; 6], vec![1.0; 6]);
        assert!(env.reset(None, Some(&options)).is_err());
        Ok(())
    }

    #[test]
    fn test_reset_params_restores_defaults() -> Result<()> {
        let mut env = env();
        let mut params = env.get_params().clone();
        params.c1 = 2.0;
        env.set_params(params);
        assert_eq!(env.get_params().c1, 2.0);
        env.reset_params();
        assert_eq!(env.get_params().c1, 1.6);
        Ok(())
    }

    #[test]
    fn test_render_not_supported() {
        let env = env();
        assert!(env.render().is_err());
    }

    #[test]
    fn test_config_yaml_roundtrip() -> Result<()> {
        use tempdir::TempDir;

        let config = OscillatorConfig::default().sigma(0.5).clip_action(false);
        let dir = TempDir::new("oscillator_config")?;
        let path = dir.path().join("config.yaml");
        config.save(&path)?;
        let loaded = OscillatorConfig::load(&path)?;
        assert_eq!(config, loaded);
        Ok(())
    }
}
