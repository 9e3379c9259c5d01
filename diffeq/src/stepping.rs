use serde::{Deserialize, Serialize};

/// Adaptive step size controller.
///
/// An integral controller on the embedded error estimate. The growth factor is
/// `safety * error^(-1/order)` clamped to `[min_factor, max_factor]`, and is never
/// above one directly after a rejected step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveStepControl {
    /// Relative tolerance used for error estimation.
    pub rel_tol: f64,
    /// Absolute tolerance used for error estimation.
    pub abs_tol: f64,
    /// Optional minimum allowed step size.
    pub min_dt: Option<f64>,
    /// Optional maximum allowed step size.
    pub max_dt: Option<f64>,
    /// Optional cap on accepted steps.
    pub max_steps: Option<usize>,
    /// Factor applied to the optimal step size estimate.
    pub safety: f64,
    /// Smallest allowed ratio of the next step to the current one.
    pub min_factor: f64,
    /// Largest allowed ratio of the next step to the current one.
    pub max_factor: f64,
}

impl Default for AdaptiveStepControl {
    fn default() -> Self {
        Self {
            rel_tol: 1e-3,
            abs_tol: 1e-6,
            min_dt: None,
            max_dt: None,
            max_steps: None,
            safety: 0.9,
            min_factor: 0.2,
            max_factor: 10.0,
        }
    }
}

impl AdaptiveStepControl {
    /// Computes the next step size from the current step and its normalized error.
    ///
    /// - `dt`: current step size
    /// - `error`: normalized RMS error, accepted when below one
    /// - `order`: order of the propagated solution
    /// - `rejected`: whether a step from the current time has already been rejected
    pub fn step(&self, dt: f64, error: f64, order: usize, rejected: bool) -> f64 {
        let exponent = -1.0 / order as f64;
        if error < 1.0 {
            let mut factor = if error == 0.0 {
                self.max_factor
            } else {
                (self.safety * error.powf(exponent)).min(self.max_factor)
            };
            if rejected {
                factor = factor.min(1.0);
            }
            dt * factor
        } else {
            dt * (self.safety * error.powf(exponent)).max(self.min_factor)
        }
    }

    /// Smallest step allowed at time `t`.
    pub fn min_step(&self, t: f64) -> f64 {
        let floor = 10.0 * ulp(t);
        match self.min_dt {
            Some(min_dt) => floor.max(min_dt),
            None => floor,
        }
    }

    pub fn limit(&self, dt: f64) -> f64 {
        match self.max_dt {
            Some(max_dt) => dt.min(max_dt),
            None => dt,
        }
    }

    pub fn with_abs_tol(mut self, abs_tol: f64) -> Self {
        self.abs_tol = abs_tol;
        self
    }

    pub fn with_rel_tol(mut self, rel_tol: f64) -> Self {
        self.rel_tol = rel_tol;
        self
    }

    pub fn with_min_dt(mut self, min_dt: f64) -> Self {
        self.min_dt = Some(min_dt);
        self
    }

    pub fn with_max_dt(mut self, max_dt: f64) -> Self {
        self.max_dt = Some(max_dt);
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }
}

/// Distance from `|t|` to the next representable f64 above it.
fn ulp(t: f64) -> f64 {
    let t = t.abs();
    if !t.is_finite() {
        return f64::INFINITY;
    }
    f64::from_bits(t.to_bits() + 1) - t
}
