use nalgebra::{allocator::Allocator, ComplexField, DefaultAllocator, Dim, MatrixMN, MatrixN, RealField};

/**
 * Numerical comparison of reciprocal condition numbers
 *  Required for the inversion of innovation covariances
 */

/* Estimate the reciprocal condition number of a matrix for inversion from its diagonal.
 * Only the diagonal of the matrix is used; for a triangular factor this is the factor's rcond.
 *
 * The Condition Number is defined from a matrix norm.
 *  Choose max element of the diagonal as the norm of the original matrix.
 *  Assume this norm for inverse matrix is the min element.
 *  Therefore rcond = min/max
 *
 * Note:
 *  Defined to be 0 for semi-definite and 0 for an empty matrix
 *  Defined to be 0 for max and min infinite
 *  Defined to be <0 for negative matrix (diagonal element < 0)
 *  Defined to be <0 with any NaN element
 *  By definition rcond <= 1 as min<=max
 */
pub fn rcond_diagonal<N: RealField, R: Dim, C: Dim>(sm: &MatrixMN<N, R, C>) -> N
where
    DefaultAllocator: Allocator<N, R, C>,
{
    let n = sm.nrows().min(sm.ncols());
    if n == 0 {
        return N::zero();
    }

    let mut mind = sm[(0, 0)];
    let mut maxd = mind;
    for i in 0..n {
        let d = sm[(i, i)];
        if d != d {
            // NaN
            return -N::one();
        }
        if d < mind {
            mind = d;
        }
        if d > maxd {
            maxd = d;
        }
    }

    rcond_min_max(mind, maxd)
}

/// Reciprocal condition number of a PD matrix from the lower triangular Cholesky factor `L` with `LL' = M`.
///
/// The rcond of the original matrix is the square of the rcond of diagonal(L), the sign is propagated.
pub fn rcond_cholesky<N: RealField, D: Dim>(l: &MatrixMN<N, D, D>) -> N
where
    DefaultAllocator: Allocator<N, D, D>,
{
    let rcond = rcond_diagonal(l);
    if rcond < N::zero() {
        -(rcond * rcond)
    } else {
        rcond * rcond
    }
}

/// Reciprocal condition number of the PD matrix `M = LL'` after scaling `M` to a unit diagonal.
///
/// With `D = diag(M)` the factor of `D^-1/2.M.D^-1/2` is `D^-1/2.L`, so no further factorisation is needed.
/// The result does not depend on the units of each measurement element.
pub fn rcond_cholesky_scaled<N: RealField, D: Dim>(l: &MatrixN<N, D>, m: &MatrixN<N, D>) -> N
where
    DefaultAllocator: Allocator<N, D, D>,
{
    let mut scaled = l.clone();
    for i in 0..scaled.nrows() {
        // NaN for a non positive diagonal, which rcond_diagonal reports as negative
        let s = ComplexField::sqrt(m[(i, i)]);
        for j in 0..scaled.ncols() {
            scaled[(i, j)] /= s;
        }
    }
    rcond_cholesky(&scaled)
}

fn rcond_min_max<N: RealField>(mind: N, maxd: N) -> N {
    if mind < N::zero() {
        // matrix is negative, mind does not represent a rcond
        return mind;
    }
    let rcond = mind / maxd;
    if rcond != rcond {
        // NaN, singular due to (mind == maxd) == (zero or infinity)
        N::zero()
    } else {
        rcond
    }
}
