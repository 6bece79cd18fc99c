//! Episode lifecycle bookkeeping.
use log::warn;

/// Lifecycle status of an episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EpisodeStatus {
    /// Constructed but never reset; the environment has no valid state.
    Uninitialized,

    /// Reset has assigned a state; stepping is allowed.
    Ready,

    /// A termination condition fired; a reset is required before stepping.
    Done,
}

/// Tracks elapsed time, lifecycle status, and the one-shot advisory flags of
/// a single episode.
///
/// The advisory flags implement the soft-failure convention of the
/// environments: out-of-range actions and stepping a finished episode are
/// logged once and execution continues, so a long unattended experiment loop
/// is never interrupted.
#[derive(Clone, Debug)]
pub struct Episode {
    /// Elapsed simulated time, advanced by exactly `dt` per step.
    t: f64,

    /// Fixed step size.
    dt: f64,

    status: EpisodeStatus,
    action_clip_warned: bool,
    steps_beyond_done: Option<usize>,
}

impl Episode {
    /// Creates bookkeeping for an environment with the given step size.
    pub fn new(dt: f64) -> Self {
        Self {
            t: 0.0,
            dt,
            status: EpisodeStatus::Uninitialized,
            action_clip_warned: false,
            steps_beyond_done: None,
        }
    }

    /// Elapsed simulated time.
    pub fn t(&self) -> f64 {
        self.t
    }

    /// The fixed step size.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Current lifecycle status.
    pub fn status(&self) -> EpisodeStatus {
        self.status
    }

    /// Marks the start of a fresh episode: time and one-shot flags are
    /// cleared.
    pub fn reset(&mut self) {
        self.t = 0.0;
        self.status = EpisodeStatus::Ready;
        self.action_clip_warned = false;
        self.steps_beyond_done = None;
    }

    /// Advances elapsed time by one step and reports misuse when the
    /// episode already finished.
    ///
    /// Must be called once per step *before* the termination outcome of the
    /// step is recorded via [`Episode::finish`].
    pub fn advance(&mut self, env_name: &str) {
        match self.status {
            EpisodeStatus::Uninitialized => {
                warn!(
                    "{}: step() called before reset(); results are undefined",
                    env_name
                );
            }
            EpisodeStatus::Done => {
                let n = self.steps_beyond_done.get_or_insert(0);
                if *n == 0 {
                    warn!(
                        "{}: step() called even though the episode returned terminated = true. \
                         Call reset() once you receive terminated = true; further steps are \
                         undefined behavior",
                        env_name
                    );
                }
                *n += 1;
            }
            EpisodeStatus::Ready => {}
        }
        self.t += self.dt;
    }

    /// Records the termination outcome of the step just taken.
    pub fn finish(&mut self, terminated: bool) {
        if terminated && self.status == EpisodeStatus::Ready {
            self.status = EpisodeStatus::Done;
            self.steps_beyond_done = Some(0);
        }
    }

    /// Reports an out-of-range action once per episode.
    pub fn warn_action_clipped(&mut self, env_name: &str, action: &[f64]) {
        if !self.action_clip_warned {
            warn!(
                "{}: action {:?} was clipped as it is not in the action space",
                env_name, action
            );
            self.action_clip_warned = true;
        }
    }

    /// Whether the action-clip advisory has fired this episode.
    pub fn action_clip_warned(&self) -> bool {
        self.action_clip_warned
    }
}
