use diffeq::saving::SampleTimes;
use tracing::{debug, info};

use crate::{
    LorenzError,
    config::ExperimentConfig,
    divergence::{Divergence, divergence},
    model::LorenzState,
    trajectory::Trajectory,
};

/// Two trajectories from nearby initial conditions and their divergence.
pub struct Experiment {
    config: ExperimentConfig,
}

impl Experiment {
    pub fn new(config: ExperimentConfig) -> Result<Self, LorenzError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Integrates both initial conditions on the same sample grid, then measures
    /// their separation at every sample.
    pub fn run(&self) -> Result<ExperimentResult, LorenzError> {
        let times = self.config.sample_times()?;
        info!(
            samples = times.len(),
            t0 = self.config.t_span.0,
            t1 = self.config.t_span.1,
            parallel = self.config.parallel,
            "integrating trajectories"
        );

        let (first, second) = if self.config.parallel {
            rayon::join(|| self.integrate(0, &times), || self.integrate(1, &times))
        } else {
            (self.integrate(0, &times), self.integrate(1, &times))
        };
        let trajectories = [first?, second?];

        let divergence = divergence(trajectories[0].states(), trajectories[1].states())?;
        info!(
            initial = divergence.initial().unwrap_or_default(),
            last = divergence.last().unwrap_or_default(),
            max = divergence.max().unwrap_or_default(),
            "divergence computed"
        );

        Ok(ExperimentResult {
            config: self.config.clone(),
            times,
            trajectories,
            divergence,
        })
    }

    fn integrate(&self, index: usize, times: &SampleTimes) -> Result<Trajectory, LorenzError> {
        let initial = self.config.initial_conditions[index];
        let trajectory = Trajectory::integrate(
            &LorenzState::new(initial),
            &self.config.parameters,
            self.config.t_span,
            times,
            &self.config.solver,
        )
        .map_err(|source| LorenzError::Integration {
            trajectory: index,
            initial,
            parameters: self.config.parameters,
            source,
        })?;

        let stats = trajectory.stats();
        debug!(
            trajectory = index,
            fn_evals = stats.fn_evals,
            accepted = stats.accepted_steps,
            rejected = stats.rejected_steps,
            "trajectory integrated"
        );
        Ok(trajectory)
    }
}

/// Finished, read-only output of an [`Experiment`].
#[derive(Clone, Debug)]
pub struct ExperimentResult {
    config: ExperimentConfig,
    times: SampleTimes,
    trajectories: [Trajectory; 2],
    divergence: Divergence,
}

impl ExperimentResult {
    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn trajectories(&self) -> &[Trajectory; 2] {
        &self.trajectories
    }

    pub fn divergence(&self) -> &Divergence {
        &self.divergence
    }

    /// Number of samples shared by the time grid, both trajectories and the divergence.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// (min, max) of x, y and z over both trajectories.
    pub fn bounds(&self) -> [(f64, f64); 3] {
        let [a, b] = [self.trajectories[0].bounds(), self.trajectories[1].bounds()];
        std::array::from_fn(|i| (a[i].0.min(b[i].0), a[i].1.max(b[i].1)))
    }
}
