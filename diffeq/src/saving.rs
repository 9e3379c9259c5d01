use std::ops::Deref;

use crate::{DiffeqError, state::Integrable};

/// Specifies the saving strategy to be used by the solver.
///
/// - `Memory`: Save every accepted step in memory.
/// - `Dense`: Save only at the requested times, interpolating inside steps.
/// - `None`: Disables solver-side saving.
#[derive(Clone, Debug)]
pub enum SaveMethod {
    Memory,
    Dense(SampleTimes),
    None,
}

/// Strictly increasing, finite output times.
///
/// These are an output grid only. The solver chooses its own internal steps and
/// evaluates the continuous extension at each sample.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleTimes(Vec<f64>);

impl SampleTimes {
    pub fn new(times: Vec<f64>) -> Result<Self, DiffeqError> {
        if times.is_empty() {
            return Err(DiffeqError::InvalidSampleTimes(
                "at least one sample time is required".into(),
            ));
        }
        if let Some(bad) = times.iter().find(|t| !t.is_finite()) {
            return Err(DiffeqError::InvalidSampleTimes(format!(
                "non-finite sample time {bad}"
            )));
        }
        if let Some(i) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(DiffeqError::InvalidSampleTimes(format!(
                "sample times must be strictly increasing, got {} then {} at index {}",
                times[i],
                times[i + 1],
                i + 1
            )));
        }
        Ok(Self(times))
    }

    /// `n` evenly spaced times from `start` to `stop` inclusive.
    ///
    /// The last sample is exactly `stop`. A single sample is placed at `start`.
    pub fn linspace(start: f64, stop: f64, n: usize) -> Result<Self, DiffeqError> {
        let times = match n {
            0 => Vec::new(),
            1 => vec![start],
            _ => {
                let step = (stop - start) / (n - 1) as f64;
                let mut times: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
                times[n - 1] = stop;
                times
            }
        };
        Self::new(times)
    }

    /// Checks that every sample lies inside `[t0, tf]`.
    pub fn check_within(&self, t0: f64, tf: f64) -> Result<(), DiffeqError> {
        let first = self.0[0];
        let last = self.0[self.0.len() - 1];
        if first < t0 || last > tf {
            return Err(DiffeqError::InvalidSampleTimes(format!(
                "samples span [{first}, {last}] which is outside the time span [{t0}, {tf}]"
            )));
        }
        Ok(())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl Deref for SampleTimes {
    type Target = [f64];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Runtime storage for solver results, selected based on the `SaveMethod`.
#[derive(Debug)]
pub enum ResultStorage<State>
where
    State: Integrable,
{
    /// In-memory storage of `(time, state)` pairs.
    Memory(MemoryResult<State>),
    /// No output storage.
    None,
}

impl<State: Integrable> ResultStorage<State> {
    /// Save a `(time, state)` pair to the result store.
    ///
    /// No-op if storage is `None`.
    pub fn save(&mut self, t: f64, y: &State) -> Result<(), DiffeqError> {
        match self {
            ResultStorage::Memory(result) => result.insert(t, y),
            ResultStorage::None => {}
        }
        Ok(())
    }

    /// Finalize result storage, releasing unused buffer capacity.
    pub fn truncate(&mut self) {
        if let ResultStorage::Memory(result) = self {
            result.truncate();
        }
    }

    pub fn into_memory(self) -> Option<MemoryResult<State>> {
        match self {
            ResultStorage::Memory(result) => Some(result),
            ResultStorage::None => None,
        }
    }
}

/// A preallocated and growable result container used for in-memory storage
/// of ODE solver outputs. Each entry stores the time and state value at that time.
#[derive(Clone, Debug, Default)]
pub struct MemoryResult<State>
where
    State: Integrable,
{
    /// Recorded times.
    pub t: Vec<f64>,
    /// Recorded states.
    pub y: Vec<State>,
}

impl<State: Integrable> MemoryResult<State> {
    /// Constructs a new memory result buffer with an initial capacity `n`.
    pub fn new(n: usize) -> Self {
        Self {
            t: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
        }
    }

    fn insert(&mut self, t: f64, x: &State) {
        self.t.push(t);
        self.y.push(x.clone());
    }

    /// Number of saved entries.
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    fn truncate(&mut self) {
        self.t.shrink_to_fit();
        self.y.shrink_to_fit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::state_array::StateArray;

    #[test]
    fn linspace_includes_both_endpoints() {
        let times = SampleTimes::linspace(0.0, 100.0, 15000).unwrap();
        assert_eq!(times.len(), 15000);
        assert_eq!(times[0], 0.0);
        assert_eq!(times[14999], 100.0);
        assert!(times.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn linspace_single_sample_is_start() {
        let times = SampleTimes::linspace(2.0, 5.0, 1).unwrap();
        assert_eq!(times.as_slice(), &[2.0]);
    }

    #[test]
    fn rejects_empty_samples() {
        assert!(matches!(
            SampleTimes::linspace(0.0, 1.0, 0),
            Err(DiffeqError::InvalidSampleTimes(_))
        ));
    }

    #[test]
    fn rejects_non_increasing_samples() {
        let err = SampleTimes::new(vec![0.0, 1.0, 1.0, 2.0]).unwrap_err();
        assert!(err.to_string().contains("index 2"), "got: {err}");
        assert!(SampleTimes::new(vec![1.0, 0.5]).is_err());
    }

    #[test]
    fn rejects_non_finite_samples() {
        assert!(SampleTimes::new(vec![0.0, f64::NAN]).is_err());
    }

    #[test]
    fn samples_must_lie_inside_span() {
        let times = SampleTimes::new(vec![0.0, 0.5, 1.5]).unwrap();
        assert!(times.check_within(0.0, 2.0).is_ok());
        assert!(times.check_within(0.0, 1.0).is_err());
        assert!(times.check_within(0.1, 2.0).is_err());
    }

    #[test]
    fn memory_storage_records_in_order() {
        let mut storage = ResultStorage::Memory(MemoryResult::new(1));
        for i in 0..5 {
            storage.save(i as f64, &StateArray::new([i as f64])).unwrap();
        }
        storage.truncate();
        let result = storage.into_memory().unwrap();
        assert_eq!(result.len(), 5);
        assert_eq!(result.t, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(result.y[3][0], 3.0);
    }

    #[test]
    fn none_storage_discards() {
        let mut storage = ResultStorage::<StateArray<1>>::None;
        storage.save(0.0, &StateArray::new([1.0])).unwrap();
        assert!(storage.into_memory().is_none());
    }
}
