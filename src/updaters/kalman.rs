#![allow(non_snake_case)]

//! Linear Kalman measurement prediction.
//!
//! The measurement model must be linear, z = Hx + v, and provide its observation matrix H.

use na::{allocator::Allocator, DefaultAllocator, Dim, MatrixMN, RealField, U1};
use nalgebra as na;

use super::{check_measurement, check_model, MeasurementMatrix, MeasurementPredictor, Updater};
use crate::config::UpdaterConfig;
use crate::error::{check_dim, UpdateError};
use crate::linalg::symmetrise;
use crate::models::{GaussianMeasurementPrediction, GaussianState, MeasurementModel};

/// Measurement prediction with the model's fixed observation matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LinearPrediction;

impl<N: RealField, D: Dim, ZD: Dim> MeasurementMatrix<N, D, ZD> for LinearPrediction
where
    DefaultAllocator: Allocator<N, D, D>
        + Allocator<N, D>
        + Allocator<N, ZD, ZD>
        + Allocator<N, ZD>
        + Allocator<N, ZD, D>
        + Allocator<N, D, ZD>
        + Allocator<N, U1, ZD>,
{
    fn measurement_matrix(
        &self,
        _predicted: &GaussianState<N, D>,
        model: &dyn MeasurementModel<N, D, ZD>,
    ) -> Result<MatrixMN<N, ZD, D>, UpdateError> {
        model.matrix().ok_or(UpdateError::ModelNotLinear)
    }
}

impl<N: RealField, D: Dim, ZD: Dim> MeasurementPredictor<N, D, ZD> for LinearPrediction
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
    ) -> Result<GaussianMeasurementPrediction<N, D, ZD>, UpdateError> {
        predict_with_matrix(self, predicted, model)
    }
}

/// Measurement prediction through an observation matrix.
///
/// z = h(x), S = H.X.H' + R, XZ = X.H'.
/// The predicted measurement is the noiseless model function, which for a linearised model need not be Hx.
pub(crate) fn predict_with_matrix<N: RealField, D: Dim, ZD: Dim>(
    predictor: &impl MeasurementMatrix<N, D, ZD>,
    predicted: &GaussianState<N, D>,
    model: &dyn MeasurementModel<N, D, ZD>,
) -> Result<GaussianMeasurementPrediction<N, D, ZD>, UpdateError>
where
    DefaultAllocator: Allocator<N, D, D>
        + Allocator<N, D>
        + Allocator<N, ZD, ZD>
        + Allocator<N, ZD>
        + Allocator<N, ZD, D>
        + Allocator<N, D, ZD>
        + Allocator<N, U1, ZD>,
{
    check_model(predicted, model)?;

    let z = model.function(&predicted.x);
    let Hx = predictor.measurement_matrix(predicted, model)?;
    let R = model.covar();
    let ndim_meas = model.ndim_meas();
    check_measurement(ndim_meas, &z, &R)?;
    check_dim("measurement matrix rows", ndim_meas, Hx.nrows())?;
    check_dim("measurement matrix columns", predicted.ndim(), Hx.ncols())?;

    let XHt = &predicted.X * Hx.transpose();
    // S = Hx.X.Hx' + R
    let S = &Hx * &XHt + R;

    Ok(GaussianMeasurementPrediction {
        z,
        S: symmetrise(&S),
        XZ: XHt,
        timestamp: predicted.timestamp,
    })
}

impl<N: RealField, D: Dim, ZD: Dim> Updater<N, D, ZD, LinearPrediction>
where
    DefaultAllocator: Allocator<N, D, D>
        + Allocator<N, D>
        + Allocator<N, ZD, ZD>
        + Allocator<N, ZD>
        + Allocator<N, ZD, D>
        + Allocator<N, D, ZD>
        + Allocator<N, U1, ZD>,
{
    /// Creates a Kalman updater.
    pub fn new(config: UpdaterConfig<N, D, ZD>) -> Result<Self, UpdateError> {
        Updater::with_predictor(LinearPrediction, config)
    }
}
