//! Fixtures shared by the updater tests.
//!
//! Random states and linear models are generated from a seeded rng so the tests are repeatable.
//! Helpers are generic over dimensions so the same test runs with Dynamic matrices and matrices with
//! fixed dimensions.

#![allow(dead_code)]
#![allow(non_snake_case)]

use std::sync::Arc;

use na::base::storage::Storage;
use na::{allocator::Allocator, DefaultAllocator, Dim, Matrix, MatrixMN, MatrixN, RealField, VectorN, U1};
use nalgebra as na;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use bayes_update::measurement_models::LinearGaussian;
use bayes_update::noise::CorrelatedNoise;
use bayes_update::{GaussianState, MeasurementModel, SharedModel};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn seeded_rng() -> StdRng {
    SeedableRng::seed_from_u64(1u64)
}

/// Share a model between measurements and updaters.
pub fn shared<D: Dim, ZD: Dim, M>(model: M) -> SharedModel<f64, D, ZD>
where
    M: MeasurementModel<f64, D, ZD> + Send + Sync + 'static,
    DefaultAllocator: Allocator<f64, D> + Allocator<f64, ZD> + Allocator<f64, ZD, ZD> + Allocator<f64, ZD, D>,
{
    Arc::new(model)
}

/// Create a Dynamic or Static copy.
pub fn new_copy<N: RealField, R: Dim, C: Dim, R1: Dim, C1: Dim, S1: Storage<N, R1, C1>>(
    r: R,
    c: C,
    m: Matrix<N, R1, C1, S1>,
) -> MatrixMN<N, R, C>
where
    DefaultAllocator: Allocator<N, R, C>,
{
    MatrixMN::<N, R, C>::from_iterator_generic(r, c, m.iter().cloned())
}

pub fn random_matrix<R: Dim, C: Dim>(rng: &mut StdRng, r: R, c: C) -> MatrixMN<f64, R, C>
where
    DefaultAllocator: Allocator<f64, R, C>,
{
    MatrixMN::from_fn_generic(r, c, |_, _| rng.gen_range(-1.0..1.0))
}

/// A random positive definite covariance.
pub fn random_covariance<D: Dim>(rng: &mut StdRng, d: D) -> MatrixN<f64, D>
where
    DefaultAllocator: Allocator<f64, D, D>,
{
    let A = random_matrix(rng, d, d);
    &A * A.transpose() + MatrixN::<f64, D>::identity_generic(d, d) * 0.1
}

pub fn random_state<D: Dim>(rng: &mut StdRng, d: D) -> GaussianState<f64, D>
where
    DefaultAllocator: Allocator<f64, D, D> + Allocator<f64, D>,
{
    let x: VectorN<f64, D> = random_matrix(rng, d, U1) * 10.;
    GaussianState::new(x, random_covariance(rng, d), None).unwrap()
}

pub fn random_linear_model<D: Dim, ZD: Dim>(rng: &mut StdRng, d: D, zd: ZD) -> LinearGaussian<f64, D, ZD>
where
    DefaultAllocator: Allocator<f64, ZD, D> + Allocator<f64, ZD, ZD> + Allocator<f64, ZD>,
{
    let H = random_matrix(rng, zd, d);
    let noise = CorrelatedNoise {
        Q: random_covariance(rng, zd),
    };
    LinearGaussian::new(H, noise).unwrap()
}
