//! Time-varying reference signals.
use serde::{Deserialize, Serialize};

/// The target signal a controlled system tracks.
///
/// A pure function of elapsed simulated time; no state is kept between
/// evaluations.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum ReferenceSignal {
    /// A fixed target value.
    Constant {
        /// The target value.
        target: f64,
    },

    /// A sine wave around the target value:
    /// `target + amplitude * sin(2*pi*t / period)`.
    Periodic {
        /// The mean value of the waveform.
        target: f64,
        /// The amplitude of the waveform.
        amplitude: f64,
        /// The period of the waveform in simulated time units.
        period: f64,
    },
}

impl ReferenceSignal {
    /// Returns the reference value at time `t`.
    pub fn value(&self, t: f64) -> f64 {
        match self {
            ReferenceSignal::Constant { target } => *target,
            ReferenceSignal::Periodic {
                target,
                amplitude,
                period,
            } => target + amplitude * (2.0 * std::f64::consts::PI * t / period).sin(),
        }
    }
}
