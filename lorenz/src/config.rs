use diffeq::{saving::SampleTimes, stepping::AdaptiveStepControl};
use serde::{Deserialize, Serialize};

use crate::{LorenzError, model::LorenzParameters};

/// Everything that fixes one run of the two-trajectory experiment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub parameters: LorenzParameters,
    pub initial_conditions: [[f64; 3]; 2],
    pub t_span: (f64, f64),
    /// Number of evenly spaced output samples across `t_span`, endpoints included.
    pub samples: usize,
    pub solver: AdaptiveStepControl,
    /// Integrate the two trajectories on the rayon pool.
    pub parallel: bool,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            parameters: LorenzParameters::default(),
            initial_conditions: [[1.0, 1.0, 1.0], [1.0001, 1.0, 1.0]],
            t_span: (0.0, 100.0),
            samples: 15000,
            solver: AdaptiveStepControl::default(),
            parallel: true,
        }
    }
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<(), LorenzError> {
        self.parameters.validate()?;

        for (index, value) in self.initial_conditions.iter().enumerate() {
            if !value.iter().all(|v| v.is_finite()) {
                return Err(LorenzError::InvalidInitialCondition {
                    index,
                    value: *value,
                });
            }
        }

        let (t0, t1) = self.t_span;
        if !(t0.is_finite() && t1.is_finite() && t1 > t0) {
            return Err(LorenzError::InvalidTimeSpan { t0, t1 });
        }

        if self.samples == 0 {
            return Err(LorenzError::InvalidSampleCount);
        }

        for (name, value) in [
            ("rel_tol", self.solver.rel_tol),
            ("abs_tol", self.solver.abs_tol),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(LorenzError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }

    /// The shared output grid of both trajectories.
    pub fn sample_times(&self) -> Result<SampleTimes, LorenzError> {
        if self.samples == 0 {
            return Err(LorenzError::InvalidSampleCount);
        }
        Ok(SampleTimes::linspace(self.t_span.0, self.t_span.1, self.samples)?)
    }
}
