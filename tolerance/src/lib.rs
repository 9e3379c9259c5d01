//! Scaled error norms for adaptive step size control.
//!
//! A component error is the magnitude of the embedded error estimate divided by
//! `abs_tol + rel_tol * max(|x|, |x_prev|)`. A step is acceptable when the
//! combined norm of all components is below one.

/// Error norm over a whole state type.
pub trait Tolerance: Default {
    type State;

    /// Combined scaled error of `x_err`, the difference between the two solutions
    /// of an embedded pair, for a step from `x_prev` to `x`.
    fn compute_error(
        &self,
        x: &Self::State,
        x_prev: &Self::State,
        x_err: &Self::State,
        rel_tol: f64,
        abs_tol: f64,
    ) -> f64;
}

/// Scaled error of a single component.
pub fn compute_error(x: f64, x_prev: f64, x_err: f64, rel_tol: f64, abs_tol: f64) -> f64 {
    let scale = abs_tol + rel_tol * x.abs().max(x_prev.abs());
    x_err.abs() / scale
}

/// Root mean square of already scaled component errors. Zero for an empty slice.
pub fn rms(errors: &[f64]) -> f64 {
    if errors.is_empty() {
        return 0.0;
    }
    let sum: f64 = errors.iter().map(|e| e * e).sum();
    (sum / errors.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn scale_uses_larger_magnitude() {
        // scale = 1e-6 + 1e-3 * 10
        let e = compute_error(-10.0, 2.0, 0.01, 1e-3, 1e-6);
        assert_abs_diff_eq!(e, 0.01 / (1e-6 + 1e-2), epsilon = 1e-12);
    }

    #[test]
    fn absolute_tolerance_dominates_near_zero() {
        let e = compute_error(0.0, 0.0, 1e-7, 1e-3, 1e-6);
        assert_abs_diff_eq!(e, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn nan_error_is_not_finite() {
        assert!(!compute_error(1.0, 1.0, f64::NAN, 1e-3, 1e-6).is_finite());
    }

    #[test]
    fn rms_of_components() {
        assert_abs_diff_eq!(rms(&[3.0, 4.0]), (12.5f64).sqrt());
        assert_eq!(rms(&[]), 0.0);
    }
}
