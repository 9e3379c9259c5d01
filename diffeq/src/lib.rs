use std::fmt::Debug;

use tracing::debug;

pub mod error;
pub mod rk;
pub mod saving;
pub mod solvers;
pub mod state;
pub mod stepping;
pub mod tableau;

pub use error::{DiffeqError, ModelError};
pub use rk::SolverStats;
pub use solvers::Solver;

use saving::{MemoryResult, ResultStorage, SaveMethod};
use state::Integrable;
use stepping::AdaptiveStepControl;

/// Trait for defining a dynamical system model that can be numerically integrated.
///
/// Types implementing this trait must define how to compute the derivative (or RHS function)
/// of the ODE at a given time and state.
pub trait OdeModel: Debug {
    type State: Integrable;
    /// Compute the derivative at time `t` and state `state`, storing the result in `derivative`.
    fn f(
        &mut self,
        t: f64,
        state: &Self::State,
        derivative: &mut Self::State,
    ) -> Result<(), ModelError>;
}

/// Output of a solve: the saved states and the work it took.
#[derive(Debug)]
pub struct OdeSolution<State: Integrable> {
    pub result: ResultStorage<State>,
    pub stats: SolverStats,
}

/// Container for an ODE problem: the model and its solver entry points.
pub struct OdeProblem<Model>
where
    Model: OdeModel,
{
    model: Model,
}

impl<Model> OdeProblem<Model>
where
    Model: OdeModel,
{
    pub fn new(model: Model) -> Self {
        Self { model }
    }

    /// Solves the problem over `tspan` with adaptive step size control.
    ///
    /// `SaveMethod::Dense` returns exactly one state per requested sample time, in order.
    pub fn solve_adaptive(
        &mut self,
        x0: &Model::State,
        tspan: (f64, f64),
        step_control: AdaptiveStepControl,
        solver: Solver,
        save_method: SaveMethod,
    ) -> Result<OdeSolution<Model::State>, DiffeqError> {
        // Preallocate memory for result storage if needed
        let (mut result, samples) = match save_method {
            SaveMethod::Memory => {
                let n = if let Some(max_dt) = &step_control.max_dt {
                    ((tspan.1 - tspan.0) / max_dt).ceil() as usize
                } else {
                    // Default conservative allocation: 1 save per second
                    (tspan.1 - tspan.0).ceil() as usize
                };
                (ResultStorage::Memory(MemoryResult::new(n + 1)), None)
            }
            SaveMethod::Dense(samples) => (
                ResultStorage::Memory(MemoryResult::new(samples.len())),
                Some(samples),
            ),
            SaveMethod::None => (ResultStorage::None, None),
        };

        let stats = solver.solve_adaptive(
            &mut self.model,
            x0,
            tspan,
            &step_control,
            samples.as_ref(),
            &mut result,
        )?;
        debug!(
            fn_evals = stats.fn_evals,
            accepted = stats.accepted_steps,
            rejected = stats.rejected_steps,
            "solve complete"
        );

        result.truncate();
        Ok(OdeSolution { result, stats })
    }
}
