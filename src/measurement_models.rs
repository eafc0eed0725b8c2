#![allow(non_snake_case)]

//! Measurement models with additive Gaussian noise.
//!
//! [`LinearGaussian`] has a fixed observation matrix and can be used by all updaters.
//! [`NonlinearGaussian`] and [`CartesianToBearingRange`] are for the Extended and Unscented updaters.

use na::storage::Storage;
use na::{allocator::Allocator, DefaultAllocator, Dim, MatrixMN, MatrixN, RealField, VectorN, U2};
use nalgebra as na;

use crate::error::{check_dim, UpdateError};
use crate::models::{numerical_jacobian, MeasurementModel};
use crate::noise::CorrelatedNoise;

/// Linear observation model.
///
/// Observation is represented by an observation matrix, z = Hx + v.
pub struct LinearGaussian<N: RealField, D: Dim, ZD: Dim>
where
    DefaultAllocator: Allocator<N, ZD, D> + Allocator<N, ZD, ZD>,
{
    /// Observation matrix
    pub H: MatrixMN<N, ZD, D>,
    pub noise: CorrelatedNoise<N, ZD>,
}

impl<N: RealField, D: Dim, ZD: Dim> LinearGaussian<N, D, ZD>
where
    DefaultAllocator: Allocator<N, ZD, D> + Allocator<N, ZD, ZD> + Allocator<N, ZD>,
{
    pub fn new(H: MatrixMN<N, ZD, D>, noise: CorrelatedNoise<N, ZD>) -> Result<Self, UpdateError> {
        check_dim("noise covariance", H.nrows(), noise.Q.nrows())?;
        check_dim("noise covariance", H.nrows(), noise.Q.ncols())?;
        Ok(LinearGaussian { H, noise })
    }

    /// Observe the state elements listed in mapping, one per measurement element.
    pub fn from_mapping(ndim_state: D, mapping: &[usize], noise: CorrelatedNoise<N, ZD>) -> Result<Self, UpdateError> {
        let zd = noise.Q.data.shape().0;
        check_dim("mapping", zd.value(), mapping.len())?;
        let mut H = MatrixMN::zeros_generic(zd, ndim_state);
        for (row, &col) in mapping.iter().enumerate() {
            if col >= ndim_state.value() {
                return Err(UpdateError::InvalidParameter(format!(
                    "mapping index {} outside state of dimension {}",
                    col,
                    ndim_state.value()
                )));
            }
            H[(row, col)] = N::one();
        }
        LinearGaussian::new(H, noise)
    }
}

impl<N: RealField, D: Dim, ZD: Dim> MeasurementModel<N, D, ZD> for LinearGaussian<N, D, ZD>
where
    DefaultAllocator: Allocator<N, D> + Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, ZD, D>,
{
    fn ndim_state(&self) -> usize {
        self.H.ncols()
    }

    fn ndim_meas(&self) -> usize {
        self.H.nrows()
    }

    fn function(&self, x: &VectorN<N, D>) -> VectorN<N, ZD> {
        &self.H * x
    }

    fn covar(&self) -> MatrixN<N, ZD> {
        self.noise.Q.clone()
    }

    fn matrix(&self) -> Option<MatrixMN<N, ZD, D>> {
        Some(self.H.clone())
    }

    fn jacobian(&self, _x: &VectorN<N, D>) -> MatrixMN<N, ZD, D> {
        self.H.clone()
    }
}

type ObserveFn<N, D, ZD> = Box<dyn Fn(&VectorN<N, D>) -> VectorN<N, ZD> + Send + Sync>;
type JacobianFn<N, D, ZD> = Box<dyn Fn(&VectorN<N, D>) -> MatrixMN<N, ZD, D> + Send + Sync>;

/// Functional observation model.
///
/// Observation is represented by a function h, z = h(x) + v.
/// Without an analytic Jacobian the model is linearised numerically.
pub struct NonlinearGaussian<N: RealField, D: Dim, ZD: Dim>
where
    DefaultAllocator: Allocator<N, D> + Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, ZD, D>,
{
    ndim_state: usize,
    h: ObserveFn<N, D, ZD>,
    hx: Option<JacobianFn<N, D, ZD>>,
    pub noise: CorrelatedNoise<N, ZD>,
}

impl<N: RealField, D: Dim, ZD: Dim> NonlinearGaussian<N, D, ZD>
where
    DefaultAllocator: Allocator<N, D> + Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, ZD, D>,
{
    pub fn new(
        ndim_state: usize,
        h: impl Fn(&VectorN<N, D>) -> VectorN<N, ZD> + Send + Sync + 'static,
        noise: CorrelatedNoise<N, ZD>,
    ) -> Self {
        NonlinearGaussian {
            ndim_state,
            h: Box::new(h),
            hx: None,
            noise,
        }
    }

    /// Use an analytic Jacobian instead of numerical linearisation.
    pub fn with_jacobian(
        mut self,
        hx: impl Fn(&VectorN<N, D>) -> MatrixMN<N, ZD, D> + Send + Sync + 'static,
    ) -> Self {
        self.hx = Some(Box::new(hx));
        self
    }
}

impl<N: RealField, D: Dim, ZD: Dim> MeasurementModel<N, D, ZD> for NonlinearGaussian<N, D, ZD>
where
    DefaultAllocator: Allocator<N, D> + Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, ZD, D>,
{
    fn ndim_state(&self) -> usize {
        self.ndim_state
    }

    fn ndim_meas(&self) -> usize {
        self.noise.Q.nrows()
    }

    fn function(&self, x: &VectorN<N, D>) -> VectorN<N, ZD> {
        (self.h)(x)
    }

    fn covar(&self) -> MatrixN<N, ZD> {
        self.noise.Q.clone()
    }

    fn jacobian(&self, x: &VectorN<N, D>) -> MatrixMN<N, ZD, D> {
        match &self.hx {
            Some(hx) => hx(x),
            None => numerical_jacobian(|x| (self.h)(x), x),
        }
    }
}

/// Bearing and range observation of a 2D position.
///
/// The position is at state elements `mapping` (x, y). The measurement is (bearing, range)
/// with the bearing measured from the x axis towards the y axis.
pub struct CartesianToBearingRange<N: RealField> {
    ndim_state: usize,
    mapping: (usize, usize),
    pub noise: CorrelatedNoise<N, U2>,
}

impl<N: RealField> CartesianToBearingRange<N> {
    pub fn new(ndim_state: usize, mapping: (usize, usize), noise: CorrelatedNoise<N, U2>) -> Result<Self, UpdateError> {
        if mapping.0 >= ndim_state || mapping.1 >= ndim_state || mapping.0 == mapping.1 {
            return Err(UpdateError::InvalidParameter(format!(
                "mapping {:?} invalid for state of dimension {}",
                mapping, ndim_state
            )));
        }
        Ok(CartesianToBearingRange {
            ndim_state,
            mapping,
            noise,
        })
    }
}

impl<N: RealField, D: Dim> MeasurementModel<N, D, U2> for CartesianToBearingRange<N>
where
    DefaultAllocator: Allocator<N, D> + Allocator<N, U2> + Allocator<N, U2, U2> + Allocator<N, U2, D>,
{
    fn ndim_state(&self) -> usize {
        self.ndim_state
    }

    fn ndim_meas(&self) -> usize {
        2
    }

    fn function(&self, x: &VectorN<N, D>) -> VectorN<N, U2> {
        let px = x[self.mapping.0];
        let py = x[self.mapping.1];
        VectorN::<N, U2>::new(py.atan2(px), (px * px + py * py).sqrt())
    }

    fn covar(&self) -> MatrixN<N, U2> {
        self.noise.Q.clone()
    }

    fn jacobian(&self, x: &VectorN<N, D>) -> MatrixMN<N, U2, D> {
        let px = x[self.mapping.0];
        let py = x[self.mapping.1];
        let r2 = px * px + py * py;
        let r = r2.sqrt();

        let mut Hx = MatrixMN::zeros_generic(U2, x.data.shape().0);
        // Undefined at the origin, leave zero
        if r2 > N::zero() {
            Hx[(0, self.mapping.0)] = -py / r2;
            Hx[(0, self.mapping.1)] = px / r2;
            Hx[(1, self.mapping.0)] = px / r;
            Hx[(1, self.mapping.1)] = py / r;
        }
        Hx
    }

    /// Wrap the bearing to within pi of the reference bearing.
    fn normalise(&self, z: &mut VectorN<N, U2>, reference: &VectorN<N, U2>) {
        if !z[0].is_finite() || !reference[0].is_finite() {
            return;
        }
        let pi = N::pi();
        let two_pi = N::two_pi();
        while z[0] - reference[0] > pi {
            z[0] -= two_pi;
        }
        while z[0] - reference[0] < -pi {
            z[0] += two_pi;
        }
    }
}
