use crate::{
    DiffeqError, OdeModel,
    rk::{RungeKutta, SolverStats},
    saving::{ResultStorage, SampleTimes},
    state::Integrable,
    stepping::AdaptiveStepControl,
    tableau::ButcherTableau,
};

/// Enum representing the available solvers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Solver {
    /// Dormand-Prince 5(4) method with its 4th order continuous extension.
    #[default]
    DoPri45,
}

impl Solver {
    pub fn solve_adaptive<Model, State>(
        &self,
        model: &mut Model,
        x0: &State,
        tspan: (f64, f64),
        control: &AdaptiveStepControl,
        samples: Option<&SampleTimes>,
        result: &mut ResultStorage<State>,
    ) -> Result<SolverStats, DiffeqError>
    where
        Model: OdeModel<State = State>,
        State: Integrable,
    {
        match self {
            Solver::DoPri45 => {
                let mut solver = RungeKutta::new(ButcherTableau::<5, 7>::DORMANDPRINCE45);
                solver.solve_adaptive(model, x0, tspan, control, samples, result)
            }
        }
    }
}
