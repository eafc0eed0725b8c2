//! Test the Unscented Kalman updater and the unscented transform.
//!
//! For linear models the unscented transform is exact, so the Unscented update must match the standard Kalman update.
//! Tests are performed with Dynamic matrices and matrices with fixed dimensions.

#![allow(non_snake_case)]

use approx::assert_relative_eq;
use na::{allocator::Allocator, DefaultAllocator, Dim, Dynamic, U1, U2, U3, U4};
use na::{DMatrix, DVector, Matrix2, Matrix4, MatrixN, Vector2, Vector4, VectorN};
use nalgebra as na;

use bayes_update::measurement_models::CartesianToBearingRange;
use bayes_update::noise::{CorrelatedNoise, UncorrelatedNoise};
use bayes_update::sigma_points::{gauss_to_sigma, unscented_transform, SigmaPoints};
use bayes_update::updaters::UnscentedPrediction;
use bayes_update::{
    ExtendedKalmanUpdater, GaussianState, Hypothesis, KalmanUpdater, Measurement, UnscentedKalmanUpdater,
    UnscentedParams, UpdateError, UpdaterConfig,
};
use fixtures::*;

mod fixtures;

fn bearing_range(bearing_sd: f64, range_sd: f64) -> CartesianToBearingRange<f64> {
    let noise = CorrelatedNoise::from_uncorrelated(&UncorrelatedNoise {
        q: Vector2::new(bearing_sd * bearing_sd, range_sd * range_sd),
    });
    CartesianToBearingRange::new(4, (0, 2), noise).unwrap()
}

fn test_params() -> Vec<UnscentedParams<f64>> {
    vec![
        UnscentedParams::default(),
        UnscentedParams::new(1., 2., 0.).unwrap(),
        UnscentedParams::new(0.1, 2., 1.).unwrap(),
        UnscentedParams::new(1., 0., 1.).unwrap(),
    ]
}

/// With a linear model the unscented measurement prediction and update are exact.
fn check_linear_model_equivalence<D: Dim, ZD: Dim>(d: D, zd: ZD)
where
    DefaultAllocator: Allocator<f64, D, D>
        + Allocator<f64, D>
        + Allocator<f64, ZD, ZD>
        + Allocator<f64, ZD>
        + Allocator<f64, ZD, D>
        + Allocator<f64, D, ZD>
        + Allocator<f64, U1, ZD>,
    <DefaultAllocator as Allocator<f64, ZD, D>>::Buffer: Send + Sync,
    <DefaultAllocator as Allocator<f64, ZD, ZD>>::Buffer: Send + Sync,
{
    let mut rng = seeded_rng();
    let kalman = KalmanUpdater::new(UpdaterConfig::new()).unwrap();

    for params in test_params() {
        let unscented = UnscentedKalmanUpdater::new(UpdaterConfig::new(), params).unwrap();
        assert_eq!(unscented.predictor().params(), &params);

        for _c in 0..10 {
            let model = random_linear_model(&mut rng, d, zd);
            let prediction = random_state(&mut rng, d);

            let kmp = kalman.predict_measurement(&prediction, Some(&model)).unwrap();
            let ump = unscented.predict_measurement(&prediction, Some(&model)).unwrap();
            assert_relative_eq!(kmp.z, ump.z, epsilon = 1e-9);
            assert_relative_eq!(kmp.S, ump.S, epsilon = 1e-9);
            assert_relative_eq!(kmp.XZ, ump.XZ, epsilon = 1e-9);

            let z = random_matrix(&mut rng, zd, U1);
            let hypothesis = Hypothesis::new(prediction, Measurement::new(z, None).with_model(shared(model)));
            let kp = kalman.update(&hypothesis).unwrap();
            let up = unscented.update(&hypothesis).unwrap();
            assert_relative_eq!(kp.x, up.x, epsilon = 1e-8);
            assert_relative_eq!(kp.X, up.X, epsilon = 1e-8);
        }
    }
}

#[test]
fn test_linear_model_equivalence() {
    init_logging();
    check_linear_model_equivalence(U4, U2);
    check_linear_model_equivalence(U3, U1);
    check_linear_model_equivalence(Dynamic::new(4), Dynamic::new(2));
}

/// The weighted sigma points reproduce the Gaussian they were drawn from.
fn check_sigma_moments<D: Dim>(d: D)
where
    DefaultAllocator: Allocator<f64, D, D> + Allocator<f64, D> + Allocator<f64, U1, D>,
{
    let mut rng = seeded_rng();
    for params in test_params() {
        let state = random_state(&mut rng, d);
        let sigma = gauss_to_sigma(&state, params.alpha, params.beta, params.kappa).unwrap();

        let n = state.ndim();
        assert_eq!(sigma.points.len(), 2 * n + 1);
        assert_eq!(sigma.points[0], state.x);
        assert_relative_eq!(sigma.mean_weights.iter().sum::<f64>(), 1., epsilon = 1e-9);
        let wc_sum: f64 = sigma.covar_weights.iter().sum();
        assert_relative_eq!(wc_sum, 1. + 1. - params.alpha * params.alpha + params.beta, epsilon = 1e-9);

        let mut mean = VectorN::<f64, D>::zeros_generic(d, U1);
        for (p, &w) in sigma.points.iter().zip(sigma.mean_weights.iter()) {
            mean += p * w;
        }
        assert_relative_eq!(mean, state.x, epsilon = 1e-9);

        let mut covar = MatrixN::<f64, D>::zeros_generic(d, d);
        for (p, &w) in sigma.points.iter().zip(sigma.covar_weights.iter()) {
            let dp = p - &state.x;
            covar += &dp * dp.transpose() * w;
        }
        assert_relative_eq!(covar, state.X, epsilon = 1e-9);
    }
}

#[test]
fn test_sigma_moments() {
    check_sigma_moments(U2);
    check_sigma_moments(U4);
    check_sigma_moments(Dynamic::new(3));
}

#[test]
fn test_unscented_transform_identity() {
    let state = GaussianState::new(Vector2::new(1., 2.), Matrix2::new(2., 0.5, 0.5, 1.), None).unwrap();
    let sigma = gauss_to_sigma(&state, 1., 2., 0.).unwrap();
    let noise = Matrix2::identity() * 0.1;
    let moments = unscented_transform(&sigma, |x| x.clone(), |_, _| {}, &noise).unwrap();

    assert_eq!(moments.points.len(), 5);
    assert_relative_eq!(moments.mean, state.x, epsilon = 1e-12);
    assert_relative_eq!(moments.covar, &state.X + noise, epsilon = 1e-12);
    assert_relative_eq!(moments.cross_covar, state.X, epsilon = 1e-12);
}

#[test]
fn test_unscented_transform_malformed_points() {
    let noise = Matrix2::<f64>::identity();
    let empty = SigmaPoints::<f64, U2> {
        points: Vec::new(),
        mean_weights: Vec::new(),
        covar_weights: Vec::new(),
    };
    assert!(matches!(
        unscented_transform(&empty, |x| x.clone(), |_, _| {}, &noise),
        Err(UpdateError::InvalidParameter(_))
    ));

    let state = GaussianState::new(Vector2::new(1., 2.), Matrix2::identity(), None).unwrap();
    let mut sigma = gauss_to_sigma(&state, 1., 2., 0.).unwrap();
    sigma.covar_weights.pop();
    assert!(matches!(
        unscented_transform(&sigma, |x| x.clone(), |_, _| {}, &noise),
        Err(UpdateError::DimensionMismatch {
            what: "sigma point covariance weights",
            expected: 5,
            found: 4
        })
    ));

    // Propagated points of differing dimension
    let state = GaussianState::new(DVector::from_vec(vec![1., 2.]), DMatrix::identity(2, 2), None).unwrap();
    let sigma = gauss_to_sigma(&state, 1., 2., 0.).unwrap();
    let h = |x: &DVector<f64>| DVector::from_element(if x[0] > 1. { 2 } else { 1 }, x[1]);
    assert!(matches!(
        unscented_transform(&sigma, h, |_, _| {}, &DMatrix::identity(1, 1)),
        Err(UpdateError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_invalid_params() {
    for &(alpha, beta, kappa) in &[
        (0., 2., 0.),
        (-1., 2., 0.),
        (f64::NAN, 2., 0.),
        (f64::INFINITY, 2., 0.),
        (0.5, f64::INFINITY, 0.),
        (0.5, 2., f64::NAN),
    ] {
        match UnscentedParams::new(alpha, beta, kappa) {
            Err(err) => assert!(err.is_configuration()),
            Ok(_) => panic!("invalid params {} {} {} accepted", alpha, beta, kappa),
        }

        let params = UnscentedParams { alpha, beta, kappa };
        let result: Result<UnscentedKalmanUpdater<f64, U2, U1>, _> =
            UnscentedKalmanUpdater::new(UpdaterConfig::new(), params);
        assert!(matches!(result, Err(UpdateError::InvalidParameter(_))));
        assert!(matches!(
            UnscentedPrediction::new(params),
            Err(UpdateError::InvalidParameter(_))
        ));
    }
}

#[test]
fn test_degenerate_spread() {
    // alpha^2 (n + kappa) = 0 for n = 4
    let params = UnscentedParams::new(0.5, 2., -4.).unwrap();
    let updater = UnscentedKalmanUpdater::new(UpdaterConfig::new(), params).unwrap();
    let model = random_linear_model(&mut seeded_rng(), U4, U2);
    let prediction = GaussianState::new(Vector4::zeros(), Matrix4::identity(), None).unwrap();

    assert!(matches!(
        updater.predict_measurement(&prediction, Some(&model)),
        Err(UpdateError::InvalidParameter(_))
    ));
}

#[test]
fn test_not_positive_definite() {
    let model = bearing_range(0.01, 0.1);
    let config = UpdaterConfig::new().with_measurement_model(shared(model));
    let updater = UnscentedKalmanUpdater::new(config, UnscentedParams::default()).unwrap();

    let indefinite = GaussianState::new(
        Vector4::new(10., 0., 10., 0.),
        Matrix4::from_diagonal(&Vector4::new(1., 1., -1., 1.)),
        None,
    )
    .unwrap();
    let correlated = GaussianState::new(
        Vector4::new(10., 0., 10., 0.),
        Matrix4::new(1., 0., 2., 0., 0., 1., 0., 0., 2., 0., 1., 0., 0., 0., 0., 1.),
        None,
    )
    .unwrap();

    for prediction in vec![indefinite, correlated] {
        let hypothesis = Hypothesis::new(prediction, Measurement::new(Vector2::new(0.8, 14.), None));
        match updater.update(&hypothesis) {
            Err(err) => {
                assert_eq!(err, UpdateError::NotPositiveDefinite("predicted state covariance"));
                assert!(!err.is_configuration());
            }
            Ok(_) => panic!("update with a covariance which is not positive definite"),
        }
    }
}

#[test]
fn test_model_errors() {
    let updater: UnscentedKalmanUpdater<f64, Dynamic, Dynamic> =
        UnscentedKalmanUpdater::new(UpdaterConfig::new(), UnscentedParams::default()).unwrap();
    let prediction = random_state(&mut seeded_rng(), Dynamic::new(2));
    assert!(matches!(
        updater.predict_measurement(&prediction, None),
        Err(UpdateError::NoMeasurementModel)
    ));

    let model = random_linear_model(&mut seeded_rng(), Dynamic::new(4), Dynamic::new(2));
    assert!(matches!(
        updater.predict_measurement(&prediction, Some(&model)),
        Err(UpdateError::DimensionMismatch { expected: 4, found: 2, .. })
    ));
}

#[test]
fn test_bearing_range_close_to_extended() {
    let model = bearing_range(0.01, 0.1);
    let extended = ExtendedKalmanUpdater::new(UpdaterConfig::new()).unwrap();
    let unscented = UnscentedKalmanUpdater::new(UpdaterConfig::new(), UnscentedParams::default()).unwrap();

    // Small uncertainty relative to the range, the model is nearly linear over the spread
    let prediction = GaussianState::new(
        Vector4::new(10., 1., 10., 0.),
        Matrix4::from_diagonal(&Vector4::new(0.1, 0.1, 0.1, 0.1)),
        None,
    )
    .unwrap();
    let z = Vector2::new(9f64.atan2(11.), (121f64 + 81.).sqrt());
    let hypothesis = Hypothesis::new(prediction, Measurement::new(z, None).with_model(shared(model)));

    let ep = extended.update(&hypothesis).unwrap();
    let up = unscented.update(&hypothesis).unwrap();
    assert_relative_eq!(ep.x, up.x, epsilon = 0.05);
    assert_relative_eq!(ep.X, up.X, epsilon = 0.05);
}

#[test]
fn test_bearing_wrap() {
    let model = bearing_range(0.01, 0.1);
    let updater = UnscentedKalmanUpdater::new(UpdaterConfig::new(), UnscentedParams::default()).unwrap();

    // Sigma points straddle the bearing discontinuity at pi
    let prediction = GaussianState::new(Vector4::new(-10., 0., 0., 0.), Matrix4::identity(), None).unwrap();
    let mp = updater.predict_measurement(&prediction, Some(&model)).unwrap();
    assert_relative_eq!(mp.z[0], std::f64::consts::PI, epsilon = 1e-3);
    assert!(mp.S[(0, 0)] < 0.1);

    let z = Vector2::new(-std::f64::consts::PI + 0.001, 10.);
    let hypothesis = Hypothesis::new(prediction, Measurement::new(z, None).with_model(shared(model)));
    let posterior = updater.update(&hypothesis).unwrap();
    assert!((posterior.x - &hypothesis.prediction.x).norm() < 0.1);
}
