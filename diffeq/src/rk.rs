use std::array;

use tolerance::Tolerance;
use tracing::trace;

use crate::{
    DiffeqError, OdeModel,
    saving::{ResultStorage, SampleTimes},
    state::Integrable,
    stepping::AdaptiveStepControl,
    tableau::ButcherTableau,
};

/// Work counters for a single solve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SolverStats {
    pub fn_evals: usize,
    pub accepted_steps: usize,
    pub rejected_steps: usize,
}

// preallocated buffers for intermediate calculations
struct RKBuffers<State: Integrable, const STAGES: usize> {
    k: [State; STAGES],
    state: State,
    scratch: State,
}

impl<State: Integrable, const STAGES: usize> Default for RKBuffers<State, STAGES> {
    fn default() -> Self {
        Self {
            k: array::from_fn(|_| State::default()),
            state: State::default(),
            scratch: State::default(),
        }
    }
}

/// Explicit embedded Runge-Kutta integrator driven by a [`ButcherTableau`].
pub struct RungeKutta<State: Integrable, const ORDER: usize, const STAGES: usize> {
    /// state at the start of the current step
    x: State,
    /// propagated solution at the end of the current step
    y: State,
    /// local error estimate of the current step
    error: State,
    tableau: ButcherTableau<ORDER, STAGES>,
    error_weights: [f64; STAGES],
    tolerances: State::Tolerance,
    buffers: RKBuffers<State, STAGES>,
    stats: SolverStats,
}

impl<State: Integrable, const ORDER: usize, const STAGES: usize> RungeKutta<State, ORDER, STAGES> {
    pub fn new(tableau: ButcherTableau<ORDER, STAGES>) -> Self {
        let error_weights = tableau.error_weights().unwrap_or([0.0; STAGES]);
        Self {
            x: State::default(),
            y: State::default(),
            error: State::default(),
            tableau,
            error_weights,
            tolerances: State::Tolerance::default(),
            buffers: RKBuffers::default(),
            stats: SolverStats::default(),
        }
    }

    /// Integrates `model` from `x0` across `tspan` with adaptive steps.
    ///
    /// With `samples`, only those times are saved, through the continuous
    /// extension of the tableau. Otherwise the initial state and every accepted
    /// step are saved.
    pub fn solve_adaptive<Model: OdeModel<State = State>>(
        &mut self,
        model: &mut Model,
        x0: &State,
        tspan: (f64, f64),
        control: &AdaptiveStepControl,
        samples: Option<&SampleTimes>,
        result: &mut ResultStorage<State>,
    ) -> Result<SolverStats, DiffeqError> {
        let (t0, tf) = tspan;
        if !t0.is_finite() || !tf.is_finite() || tf <= t0 {
            return Err(DiffeqError::InvalidTimeSpan { t0, tf });
        }
        if let Some(samples) = samples {
            if self.tableau.interpolant.is_none() {
                return Err(DiffeqError::DenseOutputUnsupported);
            }
            samples.check_within(t0, tf)?;
        }
        if !x0.is_finite() {
            return Err(DiffeqError::NonFiniteState { t: t0 });
        }

        self.stats = SolverStats::default();
        self.x.clone_from(x0);
        self.eval(model, t0, Stage::First)?;

        let mut next_sample = 0;
        match samples {
            Some(samples) => {
                while next_sample < samples.len() && samples[next_sample] <= t0 {
                    result.save(t0, &self.x)?;
                    next_sample += 1;
                }
            }
            None => result.save(t0, &self.x)?,
        }

        let mut t = t0;
        let mut dt = self.initial_dt(model, t0, tf, control)?;

        while t < tf {
            if let Some(max_steps) = control.max_steps {
                if self.stats.accepted_steps >= max_steps {
                    return Err(DiffeqError::MaxStepsExceeded { t, max_steps });
                }
            }

            let min_step = control.min_step(t);
            dt = control.limit(dt).max(min_step);

            let mut rejected = false;
            let mut non_finite = false;
            let t_new = loop {
                if dt < min_step {
                    return Err(if non_finite {
                        DiffeqError::NonFiniteState { t }
                    } else {
                        DiffeqError::StepSizeUnderflow { t, dt }
                    });
                }

                let t_new = (t + dt).min(tf);
                let h = t_new - t;
                self.step(model, t, h)?;

                let error = self.tolerances.compute_error(
                    &self.y,
                    &self.x,
                    &self.error,
                    control.rel_tol,
                    control.abs_tol,
                );

                if !error.is_finite() || !self.y.is_finite() {
                    trace!(t, h, "non-finite step rejected");
                    non_finite = true;
                    rejected = true;
                    self.stats.rejected_steps += 1;
                    dt = h * control.min_factor;
                    continue;
                }
                non_finite = false;

                dt = control.step(h, error, ORDER, rejected);
                if error < 1.0 {
                    break t_new;
                }
                trace!(t, h, error, "step rejected");
                rejected = true;
                self.stats.rejected_steps += 1;
            };

            self.stats.accepted_steps += 1;
            let h = t_new - t;

            match samples {
                Some(samples) => {
                    while next_sample < samples.len() && samples[next_sample] <= t_new {
                        let ts = samples[next_sample];
                        if ts == t_new {
                            result.save(ts, &self.y)?;
                        } else {
                            self.interpolate((ts - t) / h, h);
                            result.save(ts, &self.buffers.state)?;
                        }
                        next_sample += 1;
                    }
                }
                None => result.save(t_new, &self.y)?,
            }

            // first stage of the next step
            if self.tableau.fsal {
                self.buffers.k.swap(0, STAGES - 1);
            }
            self.x.clone_from(&self.y);
            if !self.tableau.fsal {
                self.eval(model, t_new, Stage::First)?;
            }
            t = t_new;
        }

        Ok(self.stats)
    }

    /// Computes the stages, the propagated solution and the error estimate for one
    /// step of size `h` from `(t, x)`. The first stage must already hold `f(t, x)`.
    fn step<Model: OdeModel<State = State>>(
        &mut self,
        model: &mut Model,
        t: f64,
        h: f64,
    ) -> Result<(), DiffeqError> {
        for s in 1..STAGES {
            let RKBuffers { k, state, scratch } = &mut self.buffers;
            combine(state, Some(&self.x), &k[..s], &self.tableau.a[s][..s], h, scratch);
            self.eval(model, t + self.tableau.c[s] * h, Stage::Index(s))?;
        }

        let RKBuffers { k, state, scratch } = &mut self.buffers;
        if self.tableau.fsal {
            // the last stage was evaluated at the new state
            self.y.clone_from(state);
        } else {
            combine(&mut self.y, Some(&self.x), k, &self.tableau.b, h, scratch);
        }
        combine(&mut self.error, None, k, &self.error_weights, h, scratch);
        Ok(())
    }

    /// Writes the continuous extension at fraction `theta` of the last accepted
    /// step into the stage state buffer.
    fn interpolate(&mut self, theta: f64, h: f64) {
        if let Some(weights) = self.tableau.dense_weights(theta) {
            let RKBuffers { k, state, scratch } = &mut self.buffers;
            combine(state, Some(&self.x), k, &weights, h, scratch);
        }
    }

    /// Initial step from the derivative scale (Hairer, Norsett & Wanner, II.4).
    fn initial_dt<Model: OdeModel<State = State>>(
        &mut self,
        model: &mut Model,
        t0: f64,
        tf: f64,
        control: &AdaptiveStepControl,
    ) -> Result<f64, DiffeqError> {
        let (rel_tol, abs_tol) = (control.rel_tol, control.abs_tol);
        let x = &self.x;
        let d0 = self.tolerances.compute_error(x, x, x, rel_tol, abs_tol);
        let d1 = self
            .tolerances
            .compute_error(x, x, &self.buffers.k[0], rel_tol, abs_tol);

        let h0 = if d0 < 1e-5 || d1 < 1e-5 {
            1e-6
        } else {
            0.01 * d0 / d1
        };
        let h0 = h0.min(tf - t0);

        // explicit Euler trial step into the stage buffers, overwritten by the first step
        let RKBuffers { k, state, scratch } = &mut self.buffers;
        combine(state, Some(&self.x), &k[..1], &[1.0], h0, scratch);
        self.eval(model, t0 + h0, Stage::Index(1))?;

        let RKBuffers { k, state, .. } = &mut self.buffers;
        state.clone_from(&k[1]);
        let mut f0 = k[0].clone();
        f0 *= -1.0;
        *state += &f0;
        let d2 = self
            .tolerances
            .compute_error(&self.x, &self.x, state, rel_tol, abs_tol)
            / h0;

        let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
            (h0 * 1e-3).max(1e-6)
        } else {
            (0.01 / d1.max(d2)).powf(1.0 / ORDER as f64)
        };

        let dt = (100.0 * h0).min(h1);
        trace!(dt, "initial step");
        Ok(dt)
    }

    fn eval<Model: OdeModel<State = State>>(
        &mut self,
        model: &mut Model,
        t: f64,
        stage: Stage,
    ) -> Result<(), DiffeqError> {
        self.stats.fn_evals += 1;
        let (input, output) = match stage {
            Stage::First => (&self.x, &mut self.buffers.k[0]),
            Stage::Index(s) => (&self.buffers.state, &mut self.buffers.k[s]),
        };
        model
            .f(t, input, output)
            .map_err(|source| DiffeqError::Model { t, source })
    }
}

/// Which state a derivative evaluation reads from.
#[derive(Clone, Copy)]
enum Stage {
    /// the step's starting state, written to the first stage
    First,
    /// the stage state buffer, written to stage `s`
    Index(usize),
}

/// `out = base + h * Σ weights[i] * k[i]`, or without `base` if it is `None`.
fn combine<State: Integrable>(
    out: &mut State,
    base: Option<&State>,
    k: &[State],
    weights: &[f64],
    h: f64,
    scratch: &mut State,
) {
    out.clone_from(&k[0]);
    *out *= weights[0];
    for (ki, &w) in k.iter().zip(weights).skip(1) {
        if w == 0.0 {
            continue;
        }
        scratch.clone_from(ki);
        *scratch *= w;
        *out += &*scratch;
    }
    *out *= h;
    if let Some(base) = base {
        *out += base;
    }
}
