//! Operation of the measurement updaters in a simple example.
//!
//! A Kalman update with one state and constant noise, then Extended and Unscented updates of a
//! 2D position from a bearing and range measurement.

use std::sync::Arc;

use na::{Matrix1, Matrix4, Vector1, Vector2, Vector4, U1, U2, U4};
use nalgebra as na;

use bayes_update::measurement_models::{CartesianToBearingRange, LinearGaussian};
use bayes_update::noise::{CorrelatedNoise, UncorrelatedNoise};
use bayes_update::{
    ExtendedKalmanUpdater, GaussianState, Hypothesis, KalmanUpdater, Measurement, SharedModel,
    UnscentedKalmanUpdater, UnscentedParams, UpdateError, UpdaterConfig,
};

fn main() -> Result<(), UpdateError> {
    env_logger::init();

    // Construct a simple linear observation model
    let my_observe_model: SharedModel<f64, U1, U1> = Arc::new(LinearGaussian::new(
        Matrix1::new(1.),
        CorrelatedNoise {
            Q: Matrix1::new(1.),
        },
    )?);
    let updater = KalmanUpdater::new(UpdaterConfig::new().with_measurement_model(my_observe_model))?;

    // Setup the predicted state and covariance
    let predicted = GaussianState::new(
        Vector1::new(10.), // predicted to be at 10
        Matrix1::new(1.),  // with some uncertainty
        None,
    )?;
    println!("Predict x{:.1} X{:.2}", predicted.x, predicted.X);

    // Make an observation that we appear to be at 11
    let hypothesis = Hypothesis::new(predicted, Measurement::new(Vector1::new(11.), None));
    let posterior = updater.update(&hypothesis)?;
    println!("Update x{:.1} X{:.2}", posterior.x, posterior.X);

    // Bearing and range of a position with velocity
    let bearing_range: SharedModel<f64, U4, U2> = Arc::new(CartesianToBearingRange::new(
        4,
        (0, 2),
        CorrelatedNoise::from_uncorrelated(&UncorrelatedNoise {
            q: Vector2::new(0.01f64.powi(2), 0.1f64.powi(2)),
        }),
    )?);
    let predicted = GaussianState::new(
        Vector4::new(10., 1., 10., 0.),
        Matrix4::from_diagonal(&Vector4::new(1., 0.1, 1., 0.1)),
        None,
    )?;
    let z = Vector2::new(9f64.atan2(11.), 202f64.sqrt());
    let hypothesis = Hypothesis::new(predicted, Measurement::new(z, None).with_model(bearing_range));

    let extended = ExtendedKalmanUpdater::new(UpdaterConfig::new())?;
    let posterior = extended.update(&hypothesis)?;
    println!("Extended x{:.2} X{:.3}", posterior.x, posterior.X);

    let unscented = UnscentedKalmanUpdater::new(UpdaterConfig::new(), UnscentedParams::default())?;
    let posterior = unscented.update(&hypothesis)?;
    println!("Unscented x{:.2} X{:.3}", posterior.x, posterior.X);

    Ok(())
}
