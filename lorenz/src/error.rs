use diffeq::DiffeqError;
use thiserror::Error;

use crate::model::LorenzParameters;

#[derive(Debug, Error)]
pub enum LorenzError {
    #[error("trajectory lengths differ: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
    #[error("parameter {name} must be positive and finite, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("initial condition {index} is not finite: {value:?}")]
    InvalidInitialCondition { index: usize, value: [f64; 3] },
    #[error("time span ({t0}, {t1}) must be finite with t1 > t0")]
    InvalidTimeSpan { t0: f64, t1: f64 },
    #[error("sample count must be at least 1")]
    InvalidSampleCount,
    #[error("fewer than two positive divergence samples in window [{start}, {end}]")]
    EmptyWindow { start: f64, end: f64 },
    #[error("trajectory {trajectory} from {initial:?} with {parameters} failed: {source}")]
    Integration {
        trajectory: usize,
        initial: [f64; 3],
        parameters: LorenzParameters,
        #[source]
        source: DiffeqError,
    },
    #[error(transparent)]
    Diffeq(#[from] DiffeqError),
}
