use std::ops::Deref;

use crate::{LorenzError, model::LorenzState};

/// Pointwise distance between two trajectories sampled on the same grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Divergence(Vec<f64>);

/// Euclidean norm of `a[i] - b[i]` for every sample.
///
/// Both trajectories must have the same length. Nothing is truncated or padded.
pub fn divergence(a: &[LorenzState], b: &[LorenzState]) -> Result<Divergence, LorenzError> {
    if a.len() != b.len() {
        return Err(LorenzError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(Divergence(
        a.iter().zip(b.iter()).map(|(p, q)| p.distance(q)).collect(),
    ))
}

impl Divergence {
    /// Separations below this are indistinguishable from round-off in states of
    /// attractor size.
    pub const FLOOR: f64 = 1e-16;

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn initial(&self) -> Option<f64> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<f64> {
        self.0.last().copied()
    }

    pub fn max(&self) -> Option<f64> {
        self.0.iter().copied().reduce(f64::max)
    }

    /// Divergence at the sample nearest to `t`.
    pub fn value_at(&self, times: &[f64], t: f64) -> Result<f64, LorenzError> {
        self.check_times(times)?;
        let i = times.partition_point(|s| *s < t);
        let nearest = match (i.checked_sub(1), times.get(i)) {
            (Some(prev), Some(next)) if t - times[prev] <= next - t => prev,
            (Some(prev), None) => prev,
            _ => i,
        };
        self.0
            .get(nearest)
            .copied()
            .ok_or(LorenzError::EmptyWindow { start: t, end: t })
    }

    /// Largest divergence over samples with `start <= t <= end`.
    pub fn window_max(&self, times: &[f64], start: f64, end: f64) -> Result<f64, LorenzError> {
        self.check_times(times)?;
        times
            .iter()
            .zip(self.0.iter())
            .filter(|(t, _)| (start..=end).contains(*t))
            .map(|(_, d)| *d)
            .reduce(f64::max)
            .ok_or(LorenzError::EmptyWindow { start, end })
    }

    /// Every sample raised to at least [`Divergence::FLOOR`], for log axes.
    pub fn floored(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|d| d.max(Self::FLOOR))
    }

    /// Least-squares slope of ln(divergence) against time over `[start, end]`.
    ///
    /// While the separation is small compared with the attractor this is a
    /// finite-time estimate of the largest Lyapunov exponent.
    pub fn lyapunov_estimate(
        &self,
        times: &[f64],
        start: f64,
        end: f64,
    ) -> Result<f64, LorenzError> {
        self.check_times(times)?;
        let points: Vec<(f64, f64)> = times
            .iter()
            .zip(self.0.iter())
            .filter(|(t, d)| (start..=end).contains(*t) && **d > 0.0)
            .map(|(t, d)| (*t, d.ln()))
            .collect();
        if points.len() < 2 {
            return Err(LorenzError::EmptyWindow { start, end });
        }

        let n = points.len() as f64;
        let t_mean = points.iter().map(|(t, _)| t).sum::<f64>() / n;
        let l_mean = points.iter().map(|(_, l)| l).sum::<f64>() / n;
        let (num, den) = points.iter().fold((0.0, 0.0), |(num, den), (t, l)| {
            let dt = t - t_mean;
            (num + dt * (l - l_mean), den + dt * dt)
        });
        Ok(num / den)
    }

    fn check_times(&self, times: &[f64]) -> Result<(), LorenzError> {
        if times.len() != self.0.len() {
            return Err(LorenzError::LengthMismatch {
                left: times.len(),
                right: self.0.len(),
            });
        }
        Ok(())
    }
}

impl Deref for Divergence {
    type Target = [f64];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
