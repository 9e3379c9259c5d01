use diffeq::{
    DiffeqError, OdeProblem, Solver, SolverStats,
    saving::{MemoryResult, SampleTimes, SaveMethod},
    stepping::AdaptiveStepControl,
};

use crate::model::{LorenzModel, LorenzParameters, LorenzState};

/// One integrated trajectory, resampled on a shared grid of sample times.
#[derive(Clone, Debug)]
pub struct Trajectory {
    initial: LorenzState,
    result: MemoryResult<LorenzState>,
    stats: SolverStats,
}

impl Trajectory {
    /// Integrates from `x0` across `t_span` and samples at exactly `samples`.
    ///
    /// The returned trajectory has one state per sample time.
    pub fn integrate(
        x0: &LorenzState,
        parameters: &LorenzParameters,
        t_span: (f64, f64),
        samples: &SampleTimes,
        control: &AdaptiveStepControl,
    ) -> Result<Self, DiffeqError> {
        let mut problem = OdeProblem::new(LorenzModel::new(*parameters));
        let solution = problem.solve_adaptive(
            x0,
            t_span,
            *control,
            Solver::DoPri45,
            SaveMethod::Dense(samples.clone()),
        )?;
        let result = solution.result.into_memory().unwrap_or_default();
        debug_assert_eq!(result.len(), samples.len());

        Ok(Self {
            initial: *x0,
            result,
            stats: solution.stats,
        })
    }

    pub fn initial(&self) -> &LorenzState {
        &self.initial
    }

    pub fn times(&self) -> &[f64] {
        &self.result.t
    }

    pub fn states(&self) -> &[LorenzState] {
        &self.result.y
    }

    pub fn stats(&self) -> SolverStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.result.len()
    }

    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }

    /// (min, max) of x, y and z over the trajectory.
    pub fn bounds(&self) -> [(f64, f64); 3] {
        let mut bounds = [(f64::INFINITY, f64::NEG_INFINITY); 3];
        for state in &self.result.y {
            for (axis, (lo, hi)) in bounds.iter_mut().enumerate() {
                *lo = lo.min(state[axis]);
                *hi = hi.max(state[axis]);
            }
        }
        bounds
    }
}
