#![allow(non_snake_case)]

//! Extended Kalman measurement prediction.
//!
//! The measurement model may be non-linear but must be differentiable. It is linearised at the predicted
//! state using its Jacobian, unless it has a fixed observation matrix in which case this is identical to
//! [`LinearPrediction`](super::LinearPrediction).

use na::{allocator::Allocator, DefaultAllocator, Dim, MatrixMN, RealField, U1};
use nalgebra as na;

use super::kalman::predict_with_matrix;
use super::{MeasurementMatrix, MeasurementPredictor, Updater};
use crate::config::UpdaterConfig;
use crate::error::UpdateError;
use crate::models::{GaussianMeasurementPrediction, GaussianState, MeasurementModel};

/// Measurement prediction with the model linearised at the predicted state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LinearisedPrediction;

impl<N: RealField, D: Dim, ZD: Dim> MeasurementMatrix<N, D, ZD> for LinearisedPrediction
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
        predicted: &GaussianState<N, D>,
        model: &dyn MeasurementModel<N, D, ZD>,
    ) -> Result<MatrixMN<N, ZD, D>, UpdateError> {
        Ok(match model.matrix() {
            Some(Hx) => Hx,
            None => model.jacobian(&predicted.x),
        })
    }
}

impl<N: RealField, D: Dim, ZD: Dim> MeasurementPredictor<N, D, ZD> for LinearisedPrediction
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

impl<N: RealField, D: Dim, ZD: Dim> Updater<N, D, ZD, LinearisedPrediction>
where
    DefaultAllocator: Allocator<N, D, D>
        + Allocator<N, D>
        + Allocator<N, ZD, ZD>
        + Allocator<N, ZD>
        + Allocator<N, ZD, D>
        + Allocator<N, D, ZD>
        + Allocator<N, U1, ZD>,
{
    /// Creates an Extended Kalman updater.
    pub fn new(config: UpdaterConfig<N, D, ZD>) -> Result<Self, UpdateError> {
        Updater::with_predictor(LinearisedPrediction, config)
    }
}
