use approx::assert_abs_diff_eq;
use lorenz::{AdaptiveStepControl, Experiment, ExperimentConfig, LorenzError, divergence};

fn reference_run() -> lorenz::ExperimentResult {
    Experiment::new(ExperimentConfig::default())
        .unwrap()
        .run()
        .unwrap()
}

#[test]
fn reference_run_shows_bounded_exponential_divergence() {
    let result = reference_run();
    let times = result.times();
    let d = result.divergence();

    assert_eq!(result.trajectories()[0].len(), 15000);
    assert_eq!(result.trajectories()[1].len(), 15000);
    assert_eq!(d.len(), 15000);

    assert_abs_diff_eq!(d.initial().unwrap(), 1e-4, epsilon = 1e-15);

    // early separation is still tiny, by t = 30 it has grown to attractor scale
    let early = d.value_at(times, 1.0).unwrap();
    let late = d.value_at(times, 30.0).unwrap();
    assert!(early < 1e-2, "divergence at t=1 already {early}");
    assert!(late / early >= 1e3, "divergence grew only from {early} to {late}");
    assert!(d.window_max(times, 28.0, 32.0).unwrap() >= late);

    // bounded by the attractor, and oscillating rather than growing forever
    assert!(d.iter().all(|v| v.is_finite()));
    assert!(d.max().unwrap() < 100.0, "divergence escaped: {}", d.max().unwrap());
    assert!(d.last().unwrap() < 100.0);
    assert!(d.windows(2).any(|w| w[1] < w[0]));
}

#[test]
fn repeated_runs_are_bit_identical() {
    let config = ExperimentConfig {
        t_span: (0.0, 30.0),
        samples: 3000,
        ..Default::default()
    };
    let a = Experiment::new(config.clone()).unwrap().run().unwrap();
    let b = Experiment::new(config).unwrap().run().unwrap();
    for i in 0..2 {
        assert_eq!(a.trajectories()[i].states(), b.trajectories()[i].states());
    }
    assert_eq!(a.divergence(), b.divergence());
}

#[test]
fn length_invariant_holds_for_any_sample_count() {
    for samples in [1, 2, 3, 250] {
        let config = ExperimentConfig {
            t_span: (0.0, 5.0),
            samples,
            parallel: false,
            ..Default::default()
        };
        let result = Experiment::new(config).unwrap().run().unwrap();
        assert_eq!(result.len(), samples);
        assert_eq!(result.trajectories()[0].len(), samples);
        assert_eq!(result.trajectories()[1].len(), samples);
        assert_eq!(result.divergence().len(), samples);
    }
}

#[test]
fn divergence_rejects_misaligned_trajectories() {
    let short = Experiment::new(ExperimentConfig {
        t_span: (0.0, 1.0),
        samples: 99,
        ..Default::default()
    })
    .unwrap()
    .run()
    .unwrap();
    let long = Experiment::new(ExperimentConfig {
        t_span: (0.0, 1.0),
        samples: 100,
        ..Default::default()
    })
    .unwrap()
    .run()
    .unwrap();

    let err = divergence(long.trajectories()[0].states(), short.trajectories()[1].states())
        .unwrap_err();
    assert!(matches!(err, LorenzError::LengthMismatch { left: 100, right: 99 }));
}

#[test]
fn growth_rate_matches_largest_lyapunov_exponent() {
    // accurate trajectories stay within ~1e-4 of each other until t ≈ 12,
    // then separate at close to the known exponent 0.906 until saturation near t ≈ 22
    let config = ExperimentConfig {
        t_span: (0.0, 25.0),
        samples: 2501,
        solver: AdaptiveStepControl::default()
            .with_rel_tol(1e-10)
            .with_abs_tol(1e-12),
        ..Default::default()
    };
    let result = Experiment::new(config).unwrap().run().unwrap();
    let rate = result
        .divergence()
        .lyapunov_estimate(result.times(), 10.0, 22.0)
        .unwrap();
    assert!(rate > 0.5 && rate < 1.3, "estimated exponent {rate}");
}
