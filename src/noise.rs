#![allow(non_snake_case)]

//! Bayesian estimation noise models.
//!
//! Linear additive Gaussian noise models are represented as structs.

use na::storage::Storage;
use na::{allocator::Allocator, DefaultAllocator, Dim, MatrixN, RealField, VectorN, U1};
use nalgebra as na;
use rand_core::RngCore;
use rand_distr::{Distribution, StandardNormal};

use crate::error::UpdateError;

/// Additive noise.
///
/// Noise represented as a the noise variance vector.
#[derive(PartialEq, Clone, Debug)]
pub struct UncorrelatedNoise<N: RealField, QD: Dim>
where
    DefaultAllocator: Allocator<N, QD>,
{
    /// Noise variance
    pub q: VectorN<N, QD>,
}

/// Additive noise.
///
/// Noise represented as a the noise covariance matrix.
#[derive(PartialEq, Clone, Debug)]
pub struct CorrelatedNoise<N: RealField, D: Dim>
where
    DefaultAllocator: Allocator<N, D, D>,
{
    /// Noise covariance
    pub Q: MatrixN<N, D>,
}

impl<N: RealField, D: Dim> CorrelatedNoise<N, D>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    /// Creates a CorrelatedNoise from an UncorrelatedNoise.
    pub fn from_uncorrelated(uncorrelated: &UncorrelatedNoise<N, D>) -> Self {
        let z_size = uncorrelated.q.data.shape().0;
        let mut correlated = CorrelatedNoise {
            Q: MatrixN::zeros_generic(z_size, z_size),
        };
        for i in 0..uncorrelated.q.nrows() {
            correlated.Q[(i, i)] = uncorrelated.q[i];
        }

        correlated
    }

    /// Noise dimension.
    pub fn ndim(&self) -> usize {
        self.Q.nrows()
    }

    /// Draw a zero mean noise vector with covariance Q.
    ///
    /// Q must be positive definite, it is factorised as LL' and the sample is L.u for u standard normal.
    pub fn sample<R: RngCore + ?Sized>(&self, rng: &mut R) -> Result<VectorN<N, D>, UpdateError> {
        let L = self
            .Q
            .clone()
            .cholesky()
            .ok_or(UpdateError::NotPositiveDefinite("noise covariance"))?
            .unpack();
        let d = self.Q.data.shape().0;
        let u = VectorN::<N, D>::from_fn_generic(d, U1, |_, _| {
            let s: f64 = StandardNormal.sample(&mut *rng);
            na::convert(s)
        });

        Ok(L * u)
    }
}
