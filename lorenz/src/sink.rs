use std::error::Error;

use tracing::info;

use crate::experiment::ExperimentResult;

pub type SinkError = Box<dyn Error + Send + Sync>;

/// Consumer of a finished experiment, such as a plot, an animation or a file export.
///
/// Sinks only read the result. Rendering types never reach the numeric core.
pub trait TrajectorySink {
    fn name(&self) -> &str;

    fn consume(&mut self, result: &ExperimentResult) -> Result<(), SinkError>;
}

/// Hands `result` to every sink in order, stopping at the first failure.
pub fn deliver(
    result: &ExperimentResult,
    sinks: &mut [Box<dyn TrajectorySink>],
) -> Result<(), SinkError> {
    for sink in sinks.iter_mut() {
        info!(sink = sink.name(), "rendering");
        sink.consume(result)?;
    }
    Ok(())
}
