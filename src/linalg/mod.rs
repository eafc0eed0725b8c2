//! Linear algebra support for the updaters.

pub mod rcond;

use nalgebra as na;
use na::{allocator::Allocator, DefaultAllocator, Dim, MatrixN, RealField};

/// The symmetric part (M + M') / 2 of a square matrix.
pub fn symmetrise<N: RealField, D: Dim>(m: &MatrixN<N, D>) -> MatrixN<N, D>
where
    DefaultAllocator: Allocator<N, D, D>,
{
    let half: N = na::convert(0.5);
    (m + m.transpose()) * half
}

/// Largest element of |M - M'| relative to the largest element of |M|.
///
/// Zero for an empty or zero matrix.
pub fn asymmetry<N: RealField, D: Dim>(m: &MatrixN<N, D>) -> N
where
    DefaultAllocator: Allocator<N, D, D>,
{
    if m.is_empty() {
        return N::zero();
    }
    let scale = m.amax();
    if scale == N::zero() {
        N::zero()
    } else {
        (m - m.transpose()).amax() / scale
    }
}
