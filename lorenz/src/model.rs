use std::fmt;

use diffeq::{ModelError, OdeModel, state::state_array::StateArray};
use serde::{Deserialize, Serialize};

use crate::LorenzError;

/// Position (x, y, z) in phase space.
pub type LorenzState = StateArray<3>;

/// σ, β, ρ of the Lorenz system.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LorenzParameters {
    pub sigma: f64,
    pub beta: f64,
    pub rho: f64,
}

impl Default for LorenzParameters {
    /// The classic chaotic regime.
    fn default() -> Self {
        Self {
            sigma: 10.0,
            beta: 8.0 / 3.0,
            rho: 28.0,
        }
    }
}

impl fmt::Display for LorenzParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sigma={}, beta={:.6}, rho={}", self.sigma, self.beta, self.rho)
    }
}

impl LorenzParameters {
    pub fn new(sigma: f64, beta: f64, rho: f64) -> Self {
        Self { sigma, beta, rho }
    }

    pub fn validate(&self) -> Result<(), LorenzError> {
        for (name, value) in [("sigma", self.sigma), ("beta", self.beta), ("rho", self.rho)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(LorenzError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }

    /// Fixed points of the flow: the origin, plus C± when ρ > 1.
    pub fn equilibria(&self) -> Vec<LorenzState> {
        let mut points = vec![LorenzState::default()];
        if self.rho > 1.0 {
            let r = (self.beta * (self.rho - 1.0)).sqrt();
            points.push(LorenzState::new([r, r, self.rho - 1.0]));
            points.push(LorenzState::new([-r, -r, self.rho - 1.0]));
        }
        points
    }
}

/// The Lorenz vector field at `state`.
pub fn derivative(state: &LorenzState, parameters: &LorenzParameters) -> LorenzState {
    let [x, y, z] = **state;
    let LorenzParameters { sigma, beta, rho } = *parameters;
    LorenzState::new([sigma * (y - x), x * (rho - z) - y, x * y - beta * z])
}

#[derive(Clone, Copy, Debug)]
pub struct LorenzModel {
    parameters: LorenzParameters,
}

impl LorenzModel {
    pub fn new(parameters: LorenzParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &LorenzParameters {
        &self.parameters
    }
}

impl OdeModel for LorenzModel {
    type State = LorenzState;

    fn f(&mut self, _t: f64, x: &LorenzState, dx: &mut LorenzState) -> Result<(), ModelError> {
        *dx = derivative(x, &self.parameters);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn derivative_at_unit_state() {
        let dx = derivative(&LorenzState::new([1.0, 1.0, 1.0]), &LorenzParameters::default());
        assert_abs_diff_eq!(dx[0], 0.0);
        assert_abs_diff_eq!(dx[1], 26.0);
        assert_abs_diff_eq!(dx[2], 1.0 - 8.0 / 3.0, epsilon = 1e-15);
    }

    #[test]
    fn derivative_vanishes_at_equilibria() {
        let parameters = LorenzParameters::default();
        let points = parameters.equilibria();
        assert_eq!(points.len(), 3);
        for p in &points {
            let dx = derivative(p, &parameters);
            for v in dx.iter() {
                assert_abs_diff_eq!(*v, 0.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn only_origin_below_pitchfork() {
        let points = LorenzParameters::new(10.0, 8.0 / 3.0, 0.5).equilibria();
        assert_eq!(points, vec![LorenzState::default()]);
    }

    #[test]
    fn model_matches_free_function() {
        let mut model = LorenzModel::new(LorenzParameters::new(3.0, 1.0, 5.0));
        let x = LorenzState::new([0.3, -1.2, 4.0]);
        let mut dx = LorenzState::default();
        model.f(0.0, &x, &mut dx).unwrap();
        assert_eq!(dx, derivative(&x, model.parameters()));
    }

    #[test]
    fn validation_names_the_bad_parameter() {
        assert!(LorenzParameters::default().validate().is_ok());
        let err = LorenzParameters::new(10.0, -1.0, 28.0).validate().unwrap_err();
        assert!(matches!(err, LorenzError::InvalidParameter { name: "beta", .. }));
        let err = LorenzParameters::new(f64::NAN, 1.0, 28.0).validate().unwrap_err();
        assert!(matches!(err, LorenzError::InvalidParameter { name: "sigma", .. }));
    }
}
