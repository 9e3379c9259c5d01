use std::ops::{AddAssign, Deref, DerefMut, MulAssign};

use tolerance::{Tolerance, compute_error, rms};

use super::Integrable;

/// A fixed-size array wrapper representing a state vector with `N` f64 components.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StateArray<const N: usize>([f64; N]);

impl<const N: usize> StateArray<N> {
    pub fn new(array: [f64; N]) -> Self {
        Self(array)
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Self) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }
}

impl<const N: usize> Default for StateArray<N> {
    fn default() -> Self {
        Self([0.0; N])
    }
}

impl<const N: usize> From<[f64; N]> for StateArray<N> {
    fn from(array: [f64; N]) -> Self {
        Self(array)
    }
}

impl<const N: usize> AddAssign<&Self> for StateArray<N> {
    fn add_assign(&mut self, rhs: &Self) {
        for i in 0..N {
            self.0[i] += rhs.0[i];
        }
    }
}

impl<const N: usize> MulAssign<f64> for StateArray<N> {
    fn mul_assign(&mut self, rhs: f64) {
        for i in 0..N {
            self.0[i] *= rhs;
        }
    }
}

impl<const N: usize> Integrable for StateArray<N> {
    type Tolerance = StateArrayNorm<N>;

    fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl<const N: usize> Deref for StateArray<N> {
    type Target = [f64; N];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const N: usize> DerefMut for StateArray<N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// RMS error norm of a `StateArray`, every component weighted by the solver's
/// absolute and relative tolerances.
#[derive(Clone, Copy, Debug, Default)]
pub struct StateArrayNorm<const N: usize>;

impl<const N: usize> Tolerance for StateArrayNorm<N> {
    type State = StateArray<N>;

    /// Root-mean-square of the scaled component errors.
    fn compute_error(
        &self,
        x: &StateArray<N>,
        x_prev: &StateArray<N>,
        x_err: &StateArray<N>,
        rel_tol: f64,
        abs_tol: f64,
    ) -> f64 {
        let errors: [f64; N] = std::array::from_fn(|i| {
            compute_error(x.0[i], x_prev.0[i], x_err.0[i], rel_tol, abs_tol)
        });
        rms(&errors)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn arithmetic_is_elementwise() {
        let mut a = StateArray::new([1.0, 2.0, 3.0]);
        a *= 2.0;
        a += &StateArray::new([0.5, 0.5, 0.5]);
        assert_eq!(*a, [2.5, 4.5, 6.5]);
    }

    #[test]
    fn distance_is_euclidean() {
        let a = StateArray::new([1.0, 1.0, 1.0]);
        let b = StateArray::new([1.0001, 1.0, 1.0]);
        assert_abs_diff_eq!(a.distance(&b), 1e-4, epsilon = 1e-15);
        assert_eq!(a.distance(&a), 0.0);
    }

    #[test]
    fn finiteness_checks_every_component() {
        assert!(StateArray::new([0.0, 1.0]).is_finite());
        assert!(!StateArray::new([0.0, f64::NAN]).is_finite());
        assert!(!StateArray::new([f64::INFINITY, 0.0]).is_finite());
    }

    #[test]
    fn norm_is_rms_of_scaled_components() {
        let norm = StateArrayNorm::<2>;
        let x = StateArray::new([1.0, 1.0]);
        let err = StateArray::new([1e-3, 1e-3]);
        let e = norm.compute_error(&x, &x, &err, 1e-3, 0.0);
        assert_abs_diff_eq!(e, 1.0, epsilon = 1e-12);

        // components scaled to 1 and 0.1
        let err = StateArray::new([1e-3, 1e-4]);
        let e = norm.compute_error(&x, &x, &err, 1e-3, 0.0);
        assert_abs_diff_eq!(e, ((1.0 + 0.01) / 2.0f64).sqrt(), epsilon = 1e-12);
    }
}
