//! Sensitive dependence on initial conditions in the Lorenz system.
//!
//! Two trajectories from nearby initial conditions are integrated on one shared
//! sample grid, and their pointwise separation is measured. Rendering happens
//! elsewhere, through [`sink::TrajectorySink`].

pub mod config;
pub mod divergence;
pub mod error;
pub mod experiment;
pub mod model;
pub mod sink;
pub mod trajectory;

pub use config::ExperimentConfig;
pub use diffeq::{saving::SampleTimes, stepping::AdaptiveStepControl};
pub use divergence::{Divergence, divergence};
pub use error::LorenzError;
pub use experiment::{Experiment, ExperimentResult};
pub use model::{LorenzModel, LorenzParameters, LorenzState, derivative};
pub use sink::{SinkError, TrajectorySink, deliver};
pub use trajectory::Trajectory;
