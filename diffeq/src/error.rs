use std::error::Error;

use thiserror::Error;

/// Error type returned by user models from [`crate::OdeModel::f`].
pub type ModelError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum DiffeqError {
    #[error("invalid time span ({t0}, {tf}): bounds must be finite and tf > t0")]
    InvalidTimeSpan { t0: f64, tf: f64 },
    #[error("invalid sample times: {0}")]
    InvalidSampleTimes(String),
    #[error("step size {dt:e} too small to advance past t = {t}")]
    StepSizeUnderflow { t: f64, dt: f64 },
    #[error("state became non-finite while stepping from t = {t}")]
    NonFiniteState { t: f64 },
    #[error("exceeded {max_steps} steps at t = {t}")]
    MaxStepsExceeded { t: f64, max_steps: usize },
    #[error("dense output is not available for this tableau")]
    DenseOutputUnsupported,
    #[error("model evaluation failed at t = {t}: {source}")]
    Model {
        t: f64,
        #[source]
        source: ModelError,
    },
}
