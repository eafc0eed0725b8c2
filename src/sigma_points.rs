#![allow(non_snake_case)]

//! Julier-Uhlmann 'Unscented' transform.
//!
//! A Gaussian is represented by a deterministic set of sigma points with the same sample mean and covariance.
//! Propagating the points through a non-linear function and recombining them interpolates the function
//! without linearising it.
//! Implements the scaled transform with alpha, beta and kappa parameters.

use na::storage::Storage;
use na::{allocator::Allocator, DefaultAllocator, Dim, MatrixMN, MatrixN, RealField, VectorN, U1};
use nalgebra as na;

use crate::error::{check_dim, UpdateError};
use crate::models::GaussianState;

/// Sigma points with their mean and covariance weights.
#[derive(Clone, Debug)]
pub struct SigmaPoints<N: RealField, D: Dim>
where
    DefaultAllocator: Allocator<N, D>,
{
    /// The centre point followed by the n positive and then the n negative points
    pub points: Vec<VectorN<N, D>>,
    pub mean_weights: Vec<N>,
    pub covar_weights: Vec<N>,
}

/// Moments of the distribution of the propagated sigma points.
#[derive(Clone, Debug)]
pub struct UnscentedMoments<N: RealField, D: Dim, ZD: Dim>
where
    DefaultAllocator: Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, D, ZD>,
{
    pub mean: VectorN<N, ZD>,
    /// Covariance including the additive noise
    pub covar: MatrixN<N, ZD>,
    pub cross_covar: MatrixMN<N, D, ZD>,
    /// The propagated sigma points
    pub points: Vec<VectorN<N, ZD>>,
}

/// Create the 2n+1 sigma points of a Gaussian state.
///
/// lambda = alpha^2 (n + kappa) - n, the points are spread by sqrt(n + lambda) along the columns of
/// the lower Cholesky factor of the covariance.
pub fn gauss_to_sigma<N: RealField, D: Dim>(
    state: &GaussianState<N, D>,
    alpha: N,
    beta: N,
    kappa: N,
) -> Result<SigmaPoints<N, D>, UpdateError>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    let ndim = state.x.nrows();
    let n: N = na::convert(ndim as f64);
    let lambda = alpha * alpha * (n + kappa) - n;
    let scale = n + lambda;
    if !(scale > N::zero()) {
        return Err(UpdateError::InvalidParameter(format!(
            "sigma point spread alpha^2 (n + kappa) = {:?} must be positive for n = {}",
            scale, ndim
        )));
    }

    let sigma = state
        .X
        .clone()
        .cholesky()
        .ok_or(UpdateError::NotPositiveDefinite("predicted state covariance"))?
        .unpack()
        * scale.sqrt();

    let mut UU: Vec<VectorN<N, D>> = Vec::with_capacity(2 * ndim + 1);
    UU.push(state.x.clone());
    for c in 0..ndim {
        UU.push(&state.x + sigma.column(c));
    }
    for c in 0..ndim {
        UU.push(&state.x - sigma.column(c));
    }

    let two: N = na::convert(2.0);
    let w0 = lambda / scale;
    let wi = N::one() / (two * scale);
    let mut mean_weights = vec![wi; 2 * ndim + 1];
    let mut covar_weights = mean_weights.clone();
    mean_weights[0] = w0;
    covar_weights[0] = w0 + (N::one() - alpha * alpha + beta);

    Ok(SigmaPoints {
        points: UU,
        mean_weights,
        covar_weights,
    })
}

/// Propagate sigma points through h and recombine them.
///
/// Each propagated point after the centre one is normalised against the propagated centre point.
/// The cross covariance is with respect to the centre sigma point, which is the state mean.
/// Fails if there are no points, the weights do not match the points or the propagated points and noise
/// differ in dimension.
pub fn unscented_transform<N: RealField, D: Dim, ZD: Dim>(
    sigma: &SigmaPoints<N, D>,
    h: impl Fn(&VectorN<N, D>) -> VectorN<N, ZD>,
    h_normalise: impl Fn(&mut VectorN<N, ZD>, &VectorN<N, ZD>),
    noise: &MatrixN<N, ZD>,
) -> Result<UnscentedMoments<N, D, ZD>, UpdateError>
where
    DefaultAllocator: Allocator<N, D> + Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, D, ZD> + Allocator<N, U1, ZD>,
{
    let UU = &sigma.points;
    if UU.is_empty() {
        return Err(UpdateError::InvalidParameter("no sigma points to transform".to_string()));
    }
    check_dim("sigma point mean weights", UU.len(), sigma.mean_weights.len())?;
    check_dim("sigma point covariance weights", UU.len(), sigma.covar_weights.len())?;

    // Predict points of ZZ using supplied observation model
    let mut ZZ: Vec<VectorN<N, ZD>> = Vec::with_capacity(UU.len());
    ZZ.push(h(&UU[0]));
    for i in 1..UU.len() {
        let mut zi = h(&UU[i]);
        h_normalise(&mut zi, &ZZ[0]);
        ZZ.push(zi);
    }

    let x_dim = UU[0].data.shape().0;
    let z_dim = ZZ[0].data.shape().0;
    for (xi, zi) in UU.iter().zip(ZZ.iter()) {
        check_dim("sigma point", UU[0].nrows(), xi.nrows())?;
        check_dim("propagated sigma point", ZZ[0].nrows(), zi.nrows())?;
    }
    check_dim("measurement noise rows", ZZ[0].nrows(), noise.nrows())?;
    check_dim("measurement noise columns", ZZ[0].nrows(), noise.ncols())?;

    let mut mean = VectorN::zeros_generic(z_dim, U1);
    for (zi, &w) in ZZ.iter().zip(sigma.mean_weights.iter()) {
        mean += zi * w;
    }

    let mut covar = MatrixN::zeros_generic(z_dim, z_dim);
    let mut cross_covar = MatrixMN::zeros_generic(x_dim, z_dim);
    for ((xi, zi), &w) in UU.iter().zip(ZZ.iter()).zip(sigma.covar_weights.iter()) {
        let dz = zi - &mean;
        let dzt = dz.transpose();
        let dx = xi - &UU[0];
        covar += &dz * &dzt * w;
        cross_covar += dx * dzt * w;
    }
    covar += noise;

    Ok(UnscentedMoments {
        mean,
        covar,
        cross_covar,
        points: ZZ,
    })
}
