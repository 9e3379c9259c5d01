/// Coefficients of an explicit embedded Runge-Kutta pair.
///
/// `ORDER` is the order of the propagated solution `b`; `b2` is the embedded
/// solution one order lower, used only for the error estimate.
pub struct ButcherTableau<const ORDER: usize, const STAGES: usize> {
    pub a: [[f64; STAGES]; STAGES],
    pub b: [f64; STAGES],
    pub b2: Option<[f64; STAGES]>,
    pub c: [f64; STAGES],
    /// Last stage is evaluated at the new state and reused as the next first stage.
    pub fsal: bool,
    /// Continuous extension: row `i` holds the coefficients of θ, θ², θ³, θ⁴ in
    /// the weight of stage `i` at fraction θ of the step.
    pub interpolant: Option<[[f64; 4]; STAGES]>,
}

impl<const ORDER: usize, const STAGES: usize> ButcherTableau<ORDER, STAGES> {
    /// Weights `b - b2` that turn the stages into the local error estimate.
    pub fn error_weights(&self) -> Option<[f64; STAGES]> {
        self.b2.map(|b2| std::array::from_fn(|i| self.b[i] - b2[i]))
    }

    /// Stage weights of the continuous extension at `theta` in [0, 1].
    pub fn dense_weights(&self, theta: f64) -> Option<[f64; STAGES]> {
        self.interpolant.map(|p| {
            std::array::from_fn(|i| {
                let row = &p[i];
                // Horner form of row[0]·θ + row[1]·θ² + row[2]·θ³ + row[3]·θ⁴
                theta * (row[0] + theta * (row[1] + theta * (row[2] + theta * row[3])))
            })
        })
    }
}

impl ButcherTableau<5, 7> {
    // usage is ButcherTableau::<5, 7>::DORMANDPRINCE45
    pub const DORMANDPRINCE45: Self = Self {
        a: [
            [0., 0., 0., 0., 0., 0., 0.],
            [1. / 5., 0., 0., 0., 0., 0., 0.],
            [3. / 40., 9. / 40., 0., 0., 0., 0., 0.],
            [44. / 45., -56. / 15., 32. / 9., 0., 0., 0., 0.],
            [
                19372. / 6561.,
                -25360. / 2187.,
                64448. / 6561.,
                -212. / 729.,
                0.,
                0.,
                0.,
            ],
            [
                9017. / 3168.,
                -355. / 33.,
                46732. / 5247.,
                49. / 176.,
                -5103. / 18656.,
                0.,
                0.,
            ],
            [
                35. / 384.,
                0.,
                500. / 1113.,
                125. / 192.,
                -2187. / 6784.,
                11. / 84.,
                0.,
            ],
        ],
        b: [
            35. / 384.,
            0.,
            500. / 1113.,
            125. / 192.,
            -2187. / 6784.,
            11. / 84.,
            0.,
        ],
        b2: Some([
            5179. / 57600.,
            0.,
            7571. / 16695.,
            393. / 640.,
            -92097. / 339200.,
            187. / 2100.,
            1. / 40.,
        ]),
        c: [0., 1. / 5., 3. / 10., 4. / 5., 8. / 9., 1.0, 1.0],
        fsal: true,
        // Shampine's 4th order free interpolant for Dormand-Prince
        interpolant: Some([
            [
                1.,
                -8048581381. / 2820520608.,
                8663915743. / 2820520608.,
                -12715105075. / 11282082432.,
            ],
            [0., 0., 0., 0.],
            [
                0.,
                131558114200. / 32700410799.,
                -68118460800. / 10900136933.,
                87487479700. / 32700410799.,
            ],
            [
                0.,
                -1754552775. / 470086768.,
                14199869525. / 1410260304.,
                -10690763975. / 1880347072.,
            ],
            [
                0.,
                127303824393. / 49829197408.,
                -318862633887. / 49829197408.,
                701980252875. / 199316789632.,
            ],
            [
                0.,
                -282668133. / 205662961.,
                2019193451. / 616988883.,
                -1453857185. / 822651844.,
            ],
            [
                0.,
                40617522. / 29380423.,
                -110615467. / 29380423.,
                69997945. / 29380423.,
            ],
        ]),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const DP: ButcherTableau<5, 7> = ButcherTableau::<5, 7>::DORMANDPRINCE45;

    #[test]
    fn rows_are_consistent_with_nodes() {
        for s in 0..7 {
            let row_sum: f64 = DP.a[s].iter().sum();
            assert_abs_diff_eq!(row_sum, DP.c[s], epsilon = 1e-14);
        }
    }

    #[test]
    fn weights_sum_to_one() {
        assert_abs_diff_eq!(DP.b.iter().sum::<f64>(), 1.0, epsilon = 1e-14);
        assert_abs_diff_eq!(DP.b2.unwrap().iter().sum::<f64>(), 1.0, epsilon = 1e-14);
        assert_abs_diff_eq!(DP.error_weights().unwrap().iter().sum::<f64>(), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn last_stage_is_the_new_state() {
        assert_eq!(DP.a[6], DP.b);
    }

    #[test]
    fn interpolant_matches_endpoints() {
        let start = DP.dense_weights(0.0).unwrap();
        assert!(start.iter().all(|w| *w == 0.0));

        let end = DP.dense_weights(1.0).unwrap();
        for (w, b) in end.iter().zip(DP.b.iter()) {
            assert_abs_diff_eq!(*w, *b, epsilon = 1e-12);
        }
    }
}
