#![allow(non_snake_case)]

//! Unscented Kalman measurement prediction.
//!
//! The measurement model may be non-linear and need not be differentiable.
//! The predicted state is represented by sigma points which are propagated through the model's function,
//! the measurement prediction is recombined from the propagated points.

use na::{allocator::Allocator, DefaultAllocator, Dim, RealField, U1};
use nalgebra as na;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use super::{check_measurement, check_model, MeasurementPredictor, Updater};
use crate::config::UpdaterConfig;
use crate::error::UpdateError;
use crate::linalg::symmetrise;
use crate::models::{GaussianMeasurementPrediction, GaussianState, MeasurementModel};
use crate::sigma_points::{gauss_to_sigma, unscented_transform};

/// Sigma point parameters of the scaled unscented transform.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct UnscentedParams<N> {
    /// Primary sigma point spread scaling
    pub alpha: N,
    /// Prior knowledge of the distribution, 2 is optimal for a Gaussian
    pub beta: N,
    /// Secondary spread scaling
    pub kappa: N,
}

impl<N: RealField> UnscentedParams<N> {
    pub fn new(alpha: N, beta: N, kappa: N) -> Result<Self, UpdateError> {
        let params = UnscentedParams { alpha, beta, kappa };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), UpdateError> {
        if !(self.alpha > N::zero()) || !self.alpha.is_finite() {
            return Err(UpdateError::InvalidParameter(format!(
                "alpha {:?} must be positive and finite",
                self.alpha
            )));
        }
        if !self.beta.is_finite() || !self.kappa.is_finite() {
            return Err(UpdateError::InvalidParameter(format!(
                "beta {:?} and kappa {:?} must be finite",
                self.beta, self.kappa
            )));
        }
        Ok(())
    }
}

impl<N: RealField> Default for UnscentedParams<N> {
    fn default() -> Self {
        UnscentedParams {
            alpha: na::convert(0.5),
            beta: na::convert(2.0),
            kappa: N::zero(),
        }
    }
}

/// Measurement prediction with the unscented transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnscentedPrediction<N> {
    params: UnscentedParams<N>,
}

impl<N: RealField> UnscentedPrediction<N> {
    pub fn new(params: UnscentedParams<N>) -> Result<Self, UpdateError> {
        params.validate()?;
        Ok(UnscentedPrediction { params })
    }

    pub fn params(&self) -> &UnscentedParams<N> {
        &self.params
    }
}

impl<N: RealField> Default for UnscentedPrediction<N> {
    fn default() -> Self {
        UnscentedPrediction {
            params: UnscentedParams::default(),
        }
    }
}

impl<N: RealField, D: Dim, ZD: Dim> MeasurementPredictor<N, D, ZD> for UnscentedPrediction<N>
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
        check_model(predicted, model)?;
        let R = model.covar();
        let ndim_meas = model.ndim_meas();

        let UnscentedParams { alpha, beta, kappa } = self.params;
        let sigma = gauss_to_sigma(predicted, alpha, beta, kappa)?;
        log::trace!("unscented: {} sigma points", sigma.points.len());

        // The centre point is the predicted mean, check it observes to the model's dimension before
        // propagating all points.
        check_measurement(ndim_meas, &model.function(&predicted.x), &R)?;

        let moments = unscented_transform(
            &sigma,
            |x| model.function(x),
            |z, reference| model.normalise(z, reference),
            &R,
        )?;

        Ok(GaussianMeasurementPrediction {
            z: moments.mean,
            S: symmetrise(&moments.covar),
            XZ: moments.cross_covar,
            timestamp: predicted.timestamp,
        })
    }
}

impl<N: RealField, D: Dim, ZD: Dim> Updater<N, D, ZD, UnscentedPrediction<N>>
where
    DefaultAllocator: Allocator<N, D, D>
        + Allocator<N, D>
        + Allocator<N, ZD, ZD>
        + Allocator<N, ZD>
        + Allocator<N, ZD, D>
        + Allocator<N, D, ZD>
        + Allocator<N, U1, ZD>,
{
    /// Creates an Unscented Kalman updater.
    pub fn new(config: UpdaterConfig<N, D, ZD>, params: UnscentedParams<N>) -> Result<Self, UpdateError> {
        Updater::with_predictor(UnscentedPrediction::new(params)?, config)
    }
}
