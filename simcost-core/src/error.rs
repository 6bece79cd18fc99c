//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
///
/// Only [`SimcostError::InvalidResetBounds`] aborts the calling operation;
/// the remaining anomalies of the environment contract (out-of-range
/// actions, stepping a finished episode) degrade gracefully with a logged
/// advisory instead of surfacing here.
#[derive(Error, Debug)]
pub enum SimcostError {
    /// Reset bounds outside the declared observation space.
    #[error("reset bounds {bounds:?} lie outside the observation space {space:?}")]
    InvalidResetBounds {
        /// The offending low/high bounds.
        bounds: (Vec<f64>, Vec<f64>),
        /// The declared low/high bounds of the observation space.
        space: (Vec<f64>, Vec<f64>),
    },

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKey(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueType(String),

    /// A capability (typically rendering) the environment variant does not
    /// implement.
    #[error("not supported: {0}")]
    NotSupported(String),
}
