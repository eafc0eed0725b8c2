#![allow(non_snake_case)]

//! Bayesian measurement update models.
//!
//! State, measurement and prediction representations are modeled as structs.
//! The measurement model consumed by the updaters is defined as a trait.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use na::storage::Storage;
use na::{allocator::Allocator, ComplexField, DefaultAllocator, Dim, MatrixMN, MatrixN, RealField, VectorN, U1};
use nalgebra as na;

use crate::error::{check_dim, UpdateError};

/// Time of validity of states and measurements.
pub type Timestamp = DateTime<Utc>;

/// A measurement model shared between measurements, updaters and threads.
pub type SharedModel<N, D, ZD> = Arc<dyn MeasurementModel<N, D, ZD> + Send + Sync>;

/// Gaussian State.
///
/// Linear representation as a state vector and the state covariance (symmetric positive semi-definite) matrix.
#[derive(PartialEq, Clone, Debug)]
pub struct GaussianState<N: RealField, D: Dim>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    /// State vector
    pub x: VectorN<N, D>,
    /// State covariance matrix (symmetric positive semi-definite)
    pub X: MatrixN<N, D>,
    pub timestamp: Option<Timestamp>,
}

impl<N: RealField, D: Dim> GaussianState<N, D>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    pub fn new(x: VectorN<N, D>, X: MatrixN<N, D>, timestamp: Option<Timestamp>) -> Result<Self, UpdateError> {
        let state = GaussianState { x, X, timestamp };
        state.check_dims()?;
        Ok(state)
    }

    pub fn new_zero(d: D) -> Self {
        GaussianState {
            x: VectorN::zeros_generic(d, U1),
            X: MatrixN::zeros_generic(d, d),
            timestamp: None,
        }
    }

    /// State dimension.
    pub fn ndim(&self) -> usize {
        self.x.nrows()
    }

    /// Checks the covariance is square and matches the state vector.
    pub fn check_dims(&self) -> Result<(), UpdateError> {
        check_dim("state covariance rows", self.x.nrows(), self.X.nrows())?;
        check_dim("state covariance columns", self.x.nrows(), self.X.ncols())
    }
}

/// Measurement.
///
/// An observation vector, optionally carrying the model which generated it.
pub struct Measurement<N: RealField, D: Dim, ZD: Dim>
where
    DefaultAllocator: Allocator<N, D> + Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, ZD, D>,
{
    /// Observation vector
    pub z: VectorN<N, ZD>,
    pub timestamp: Option<Timestamp>,
    /// Takes precedence over an updater's default model.
    pub measurement_model: Option<SharedModel<N, D, ZD>>,
}

impl<N: RealField, D: Dim, ZD: Dim> Measurement<N, D, ZD>
where
    DefaultAllocator: Allocator<N, D> + Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, ZD, D>,
{
    pub fn new(z: VectorN<N, ZD>, timestamp: Option<Timestamp>) -> Self {
        Measurement {
            z,
            timestamp,
            measurement_model: None,
        }
    }

    pub fn with_model(mut self, model: SharedModel<N, D, ZD>) -> Self {
        self.measurement_model = Some(model);
        self
    }
}

impl<N: RealField, D: Dim, ZD: Dim> Clone for Measurement<N, D, ZD>
where
    DefaultAllocator: Allocator<N, D> + Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, ZD, D>,
{
    fn clone(&self) -> Self {
        Measurement {
            z: self.z.clone(),
            timestamp: self.timestamp,
            measurement_model: self.measurement_model.clone(),
        }
    }
}

impl<N: RealField, D: Dim, ZD: Dim> fmt::Debug for Measurement<N, D, ZD>
where
    DefaultAllocator: Allocator<N, D> + Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, ZD, D>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Measurement")
            .field("z", &self.z)
            .field("timestamp", &self.timestamp)
            .field("measurement_model", &self.measurement_model.is_some())
            .finish()
    }
}

/// Hypothesis.
///
/// Associates a predicted state with a measurement, prior to update.
#[derive(Clone, Debug)]
pub struct Hypothesis<N: RealField, D: Dim, ZD: Dim>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D> + Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, ZD, D>,
{
    pub prediction: GaussianState<N, D>,
    pub measurement: Measurement<N, D, ZD>,
}

impl<N: RealField, D: Dim, ZD: Dim> Hypothesis<N, D, ZD>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D> + Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, ZD, D>,
{
    pub fn new(prediction: GaussianState<N, D>, measurement: Measurement<N, D, ZD>) -> Self {
        Hypothesis { prediction, measurement }
    }
}

/// Gaussian measurement prediction.
///
/// The predicted measurement, its innovation covariance and the state-measurement cross covariance.
#[derive(PartialEq, Clone, Debug)]
pub struct GaussianMeasurementPrediction<N: RealField, D: Dim, ZD: Dim>
where
    DefaultAllocator: Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, D, ZD>,
{
    /// Predicted measurement
    pub z: VectorN<N, ZD>,
    /// Innovation covariance
    pub S: MatrixN<N, ZD>,
    /// Cross covariance of state with measurement
    pub XZ: MatrixMN<N, D, ZD>,
    /// Timestamp of the predicted state
    pub timestamp: Option<Timestamp>,
}

/// Gaussian state update.
///
/// The posterior state, referencing the hypothesis from which it was computed.
#[derive(Clone, Debug)]
pub struct GaussianStateUpdate<'h, N: RealField, D: Dim, ZD: Dim>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D> + Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, ZD, D>,
{
    /// Posterior state vector
    pub x: VectorN<N, D>,
    /// Posterior state covariance
    pub X: MatrixN<N, D>,
    /// Timestamp of the measurement
    pub timestamp: Option<Timestamp>,
    pub hypothesis: &'h Hypothesis<N, D, ZD>,
}

impl<'h, N: RealField, D: Dim, ZD: Dim> GaussianStateUpdate<'h, N, D, ZD>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D> + Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, ZD, D>,
{
    /// The posterior as a GaussianState, ready for the next prediction.
    pub fn state(&self) -> GaussianState<N, D> {
        GaussianState {
            x: self.x.clone(),
            X: self.X.clone(),
            timestamp: self.timestamp,
        }
    }
}

/// A measurement model with additive Gaussian noise.
///
/// z = h(x) + v, v ~ N(0, R).
/// Linear models expose their fixed observation matrix H through [`matrix`](MeasurementModel::matrix).
/// Differentiable models should override [`jacobian`](MeasurementModel::jacobian),
/// the provided implementation uses central differences.
pub trait MeasurementModel<N: RealField, D: Dim, ZD: Dim>
where
    DefaultAllocator: Allocator<N, D> + Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, ZD, D>,
{
    /// Dimension of the state the model observes.
    fn ndim_state(&self) -> usize;

    /// Dimension of the measurement.
    fn ndim_meas(&self) -> usize;

    /// Noiseless observation h(x).
    fn function(&self, x: &VectorN<N, D>) -> VectorN<N, ZD>;

    /// Observation with additive noise h(x) + v.
    fn function_with_noise(&self, x: &VectorN<N, D>, noise: &VectorN<N, ZD>) -> VectorN<N, ZD> {
        self.function(x) + noise
    }

    /// Measurement noise covariance R.
    fn covar(&self) -> MatrixN<N, ZD>;

    /// The observation matrix H of a linear model.
    fn matrix(&self) -> Option<MatrixMN<N, ZD, D>> {
        None
    }

    /// The observation function linearised at x.
    fn jacobian(&self, x: &VectorN<N, D>) -> MatrixMN<N, ZD, D> {
        numerical_jacobian(|x| self.function(x), x)
    }

    /// Normalise z in place so it is comparable with reference, for example by wrapping angles.
    fn normalise(&self, _z: &mut VectorN<N, ZD>, _reference: &VectorN<N, ZD>) {}
}

/// Central difference Jacobian of h at x.
///
/// The step for each state element is cbrt(epsilon) scaled by the element's magnitude (at least 1).
pub fn numerical_jacobian<N: RealField, D: Dim, ZD: Dim>(
    h: impl Fn(&VectorN<N, D>) -> VectorN<N, ZD>,
    x: &VectorN<N, D>,
) -> MatrixMN<N, ZD, D>
where
    DefaultAllocator: Allocator<N, D> + Allocator<N, ZD> + Allocator<N, ZD, D>,
{
    let two: N = na::convert(2.0);
    let delta: N = na::convert(f64::EPSILON.cbrt());

    let z0 = h(x);
    let mut J = MatrixMN::zeros_generic(z0.data.shape().0, x.data.shape().0);
    for i in 0..x.nrows() {
        let step = delta * RealField::max(ComplexField::abs(x[i]), N::one());

        let mut xp = x.clone();
        xp[i] += step;
        let mut xm = x.clone();
        xm[i] -= step;

        let dz = (h(&xp) - h(&xm)) / (two * step);
        J.set_column(i, &dz);
    }
    J
}
