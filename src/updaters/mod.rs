#![allow(non_snake_case)]

//! Kalman-type measurement updaters.
//!
//! An [`Updater`] combines a measurement prediction strategy with the Kalman gain and posterior algebra
//! shared by all strategies:
//!
//! ```text
//! K = XZ.S^-1
//! x = x + K.(z - z_pred)
//! X = X - K.S.K'
//! ```
//!
//! The strategies only differ in how the predicted measurement z_pred, innovation covariance S and
//! cross covariance XZ are obtained. [`LinearPrediction`] uses the model's observation matrix,
//! [`LinearisedPrediction`] its Jacobian and [`UnscentedPrediction`] the unscented transform.

pub mod extended;
pub mod kalman;
pub mod unscented;

pub use extended::LinearisedPrediction;
pub use kalman::LinearPrediction;
pub use unscented::{UnscentedParams, UnscentedPrediction};

use na::{allocator::Allocator, DefaultAllocator, Dim, MatrixMN, MatrixN, RealField, VectorN, U1};
use nalgebra as na;

use crate::config::{NumericSettings, UpdaterConfig};
use crate::error::{check_dim, UpdateError};
use crate::linalg::{rcond, symmetrise};
use crate::models::{
    GaussianMeasurementPrediction, GaussianState, GaussianStateUpdate, Hypothesis, MeasurementModel, SharedModel,
};

/// A measurement prediction strategy.
///
/// Computes the Gaussian measurement prediction implied by a predicted state and a measurement model.
pub trait MeasurementPredictor<N: RealField, D: Dim, ZD: Dim>
where
    DefaultAllocator: Allocator<N, D, D>
        + Allocator<N, D>
        + Allocator<N, ZD, ZD>
        + Allocator<N, ZD>
        + Allocator<N, ZD, D>
        + Allocator<N, D, ZD>
        + Allocator<N, U1, ZD>,
{
    fn predict_measurement(
        &self,
        predicted: &GaussianState<N, D>,
        model: &dyn MeasurementModel<N, D, ZD>,
    ) -> Result<GaussianMeasurementPrediction<N, D, ZD>, UpdateError>;
}

/// A measurement prediction strategy using a (possibly linearised) observation matrix.
pub trait MeasurementMatrix<N: RealField, D: Dim, ZD: Dim>: MeasurementPredictor<N, D, ZD>
where
    DefaultAllocator: Allocator<N, D, D>
        + Allocator<N, D>
        + Allocator<N, ZD, ZD>
        + Allocator<N, ZD>
        + Allocator<N, ZD, D>
        + Allocator<N, D, ZD>
        + Allocator<N, U1, ZD>,
{
    /// The observation matrix H used at the predicted state.
    fn measurement_matrix(
        &self,
        predicted: &GaussianState<N, D>,
        model: &dyn MeasurementModel<N, D, ZD>,
    ) -> Result<MatrixMN<N, ZD, D>, UpdateError>;
}

/// Measurement updater.
///
/// Holds only immutable configuration, so one updater can serve concurrent updates.
pub struct Updater<N: RealField, D: Dim, ZD: Dim, P>
where
    DefaultAllocator: Allocator<N, D> + Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, ZD, D>,
{
    predictor: P,
    config: UpdaterConfig<N, D, ZD>,
}

/// The standard Kalman filter update, for linear measurement models.
pub type KalmanUpdater<N, D, ZD> = Updater<N, D, ZD, LinearPrediction>;
/// The Extended Kalman filter update, linearising the measurement model at the predicted state.
pub type ExtendedKalmanUpdater<N, D, ZD> = Updater<N, D, ZD, LinearisedPrediction>;
/// The Unscented Kalman filter update.
pub type UnscentedKalmanUpdater<N, D, ZD> = Updater<N, D, ZD, UnscentedPrediction<N>>;

impl<N: RealField, D: Dim, ZD: Dim, P> Updater<N, D, ZD, P>
where
    P: MeasurementPredictor<N, D, ZD>,
    DefaultAllocator: Allocator<N, D, D>
        + Allocator<N, D>
        + Allocator<N, ZD, ZD>
        + Allocator<N, ZD>
        + Allocator<N, ZD, D>
        + Allocator<N, D, ZD>
        + Allocator<N, U1, ZD>,
{
    /// Creates an updater with any prediction strategy, validating the configuration.
    pub fn with_predictor(predictor: P, config: UpdaterConfig<N, D, ZD>) -> Result<Self, UpdateError> {
        config.validate()?;
        Ok(Updater { predictor, config })
    }

    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    pub fn config(&self) -> &UpdaterConfig<N, D, ZD> {
        &self.config
    }

    /// Predict the measurement implied by the predicted state.
    ///
    /// The explicit model takes precedence over the updater's default model.
    pub fn predict_measurement(
        &self,
        predicted: &GaussianState<N, D>,
        model: Option<&dyn MeasurementModel<N, D, ZD>>,
    ) -> Result<GaussianMeasurementPrediction<N, D, ZD>, UpdateError> {
        let model = resolve_model(model, as_model(&self.config.measurement_model))?;
        self.predictor.predict_measurement(predicted, model)
    }

    /// Update the hypothesis's predicted state with its measurement.
    ///
    /// The measurement's own model takes precedence over the updater's default model.
    pub fn update<'h>(
        &self,
        hypothesis: &'h Hypothesis<N, D, ZD>,
    ) -> Result<GaussianStateUpdate<'h, N, D, ZD>, UpdateError> {
        let model = resolve_model(
            as_model(&hypothesis.measurement.measurement_model),
            as_model(&self.config.measurement_model),
        )?;
        let predicted = &hypothesis.prediction;
        log::trace!(
            "update: state dimension {}, measurement dimension {}",
            predicted.ndim(),
            hypothesis.measurement.z.nrows()
        );

        let prediction = self.predictor.predict_measurement(predicted, model)?;
        let (x, X) = kalman_posterior(
            predicted,
            &hypothesis.measurement.z,
            &prediction,
            model,
            &self.config.numeric,
        )?;

        Ok(GaussianStateUpdate {
            x,
            X,
            timestamp: hypothesis.measurement.timestamp,
            hypothesis,
        })
    }
}

impl<N: RealField, D: Dim, ZD: Dim, P> Updater<N, D, ZD, P>
where
    P: MeasurementMatrix<N, D, ZD>,
    DefaultAllocator: Allocator<N, D, D>
        + Allocator<N, D>
        + Allocator<N, ZD, ZD>
        + Allocator<N, ZD>
        + Allocator<N, ZD, D>
        + Allocator<N, D, ZD>
        + Allocator<N, U1, ZD>,
{
    /// The observation matrix H at the predicted state.
    ///
    /// The explicit model takes precedence over the updater's default model.
    pub fn measurement_matrix(
        &self,
        predicted: &GaussianState<N, D>,
        model: Option<&dyn MeasurementModel<N, D, ZD>>,
    ) -> Result<MatrixMN<N, ZD, D>, UpdateError> {
        let model = resolve_model(model, as_model(&self.config.measurement_model))?;
        check_model(predicted, model)?;
        self.predictor.measurement_matrix(predicted, model)
    }
}

/// Resolve the measurement model to use.
///
/// The explicit model, else the default model, else [`UpdateError::NoMeasurementModel`].
pub fn resolve_model<'a, N: RealField, D: Dim, ZD: Dim>(
    explicit: Option<&'a dyn MeasurementModel<N, D, ZD>>,
    default: Option<&'a dyn MeasurementModel<N, D, ZD>>,
) -> Result<&'a dyn MeasurementModel<N, D, ZD>, UpdateError>
where
    DefaultAllocator: Allocator<N, D> + Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, ZD, D>,
{
    match (explicit, default) {
        (Some(model), _) => Ok(model),
        (None, Some(model)) => {
            log::trace!("no explicit measurement model, using the updater default");
            Ok(model)
        }
        (None, None) => Err(UpdateError::NoMeasurementModel),
    }
}

fn as_model<N: RealField, D: Dim, ZD: Dim>(
    model: &Option<SharedModel<N, D, ZD>>,
) -> Option<&dyn MeasurementModel<N, D, ZD>>
where
    DefaultAllocator: Allocator<N, D> + Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, ZD, D>,
{
    model.as_ref().map(|m| &**m as &dyn MeasurementModel<N, D, ZD>)
}

/// Kalman gain K = XZ.S^-1.
///
/// S is inverted through its Cholesky factor. Fails with [`UpdateError::SingularMatrix`] if S is not
/// positive definite or the reciprocal condition number of S scaled to a unit diagonal does not exceed
/// rcond_limit. The scaling keeps measurements in very different units from being taken as singular.
pub fn kalman_gain<N: RealField, D: Dim, ZD: Dim>(
    prediction: &GaussianMeasurementPrediction<N, D, ZD>,
    rcond_limit: N,
) -> Result<MatrixMN<N, D, ZD>, UpdateError>
where
    DefaultAllocator: Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, D, ZD>,
{
    let cholesky = prediction
        .S
        .clone()
        .cholesky()
        .ok_or(UpdateError::SingularMatrix("innovation covariance"))?;
    let rcond = rcond::rcond_cholesky_scaled(cholesky.l_dirty(), &prediction.S);
    if !(rcond > rcond_limit) {
        log::debug!("innovation covariance rcond {:?} not above limit {:?}", rcond, rcond_limit);
        return Err(UpdateError::SingularMatrix("innovation covariance"));
    }

    // Inverse innovation covariance
    let SI = cholesky.inverse();
    Ok(&prediction.XZ * SI)
}

/// Posterior state from a predicted state, its measurement prediction and the observed measurement.
///
/// The algebra is independent of how the measurement prediction was obtained.
/// The observed measurement is normalised against the predicted measurement before forming the innovation.
pub fn kalman_posterior<N: RealField, D: Dim, ZD: Dim>(
    predicted: &GaussianState<N, D>,
    z: &VectorN<N, ZD>,
    prediction: &GaussianMeasurementPrediction<N, D, ZD>,
    model: &dyn MeasurementModel<N, D, ZD>,
    settings: &NumericSettings<N>,
) -> Result<(VectorN<N, D>, MatrixN<N, D>), UpdateError>
where
    DefaultAllocator: Allocator<N, D, D>
        + Allocator<N, D>
        + Allocator<N, ZD, ZD>
        + Allocator<N, ZD>
        + Allocator<N, ZD, D>
        + Allocator<N, D, ZD>,
{
    predicted.check_dims()?;
    let zdim = prediction.z.nrows();
    check_dim("measurement", zdim, z.nrows())?;
    check_dim("innovation covariance rows", zdim, prediction.S.nrows())?;
    check_dim("innovation covariance columns", zdim, prediction.S.ncols())?;
    check_dim("cross covariance rows", predicted.ndim(), prediction.XZ.nrows())?;
    check_dim("cross covariance columns", zdim, prediction.XZ.ncols())?;

    // Kalman gain, XZ*SI
    let W = kalman_gain(prediction, settings.rcond_limit)?;

    // Innovation
    let mut zn = z.clone();
    model.normalise(&mut zn, &prediction.z);
    let s = zn - &prediction.z;

    // State update
    let x = &predicted.x + &W * s;
    // X -= W.S.W'
    let mut X = &predicted.X - &W * &prediction.S * W.transpose();
    if settings.symmetrise {
        X = symmetrise(&X);
    }

    Ok((x, X))
}

/// Checks the predicted state is consistent and has the dimension the model observes.
pub(crate) fn check_model<N: RealField, D: Dim, ZD: Dim>(
    predicted: &GaussianState<N, D>,
    model: &dyn MeasurementModel<N, D, ZD>,
) -> Result<(), UpdateError>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D> + Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, ZD, D>,
{
    predicted.check_dims()?;
    check_dim("measurement model state dimension", model.ndim_state(), predicted.ndim())
}

/// Checks the noise covariance and the noiseless prediction have the model's measurement dimension.
pub(crate) fn check_measurement<N: RealField, ZD: Dim>(
    ndim_meas: usize,
    z: &VectorN<N, ZD>,
    R: &MatrixN<N, ZD>,
) -> Result<(), UpdateError>
where
    DefaultAllocator: Allocator<N, ZD> + Allocator<N, ZD, ZD>,
{
    check_dim("predicted measurement", ndim_meas, z.nrows())?;
    check_dim("measurement noise covariance rows", ndim_meas, R.nrows())?;
    check_dim("measurement noise covariance columns", ndim_meas, R.ncols())
}
