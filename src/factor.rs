//! Validation and lower-triangular Cholesky factorization of covariance
//! matrices, including positive semi-definite ones.

use nalgebra::{allocator::Allocator, linalg::Cholesky, DefaultAllocator, Dim, OMatrix, RealField};

use crate::error::{Error, Factorization};

/// Numerical tolerance applied when checking and factoring a covariance matrix
///
/// Both values are relative to the diagonal entries involved, so coordinates
/// of very different scale are judged on their own variance.
///
/// * `symmetry`: entries `(i, j)` and `(j, i)` may differ by at most
///   `symmetry * sqrt(|a_ii * a_jj|)`.
/// * `pivot`: the pivot of column `j` is treated as exactly zero when it lies
///   in `[-pivot * |a_jj|, pivot * |a_jj|]`, so that singular covariance
///   matrices which pick up a little round-off still factor. Anything below
///   that range is a negative eigenvalue and is rejected.
///
/// Both must be finite and non-negative, otherwise construction fails with
/// [`Factorization::InvalidTolerance`].
///
/// The default (`1e-8` for both) suits `f64` input. `f32` callers dealing with
/// singular covariances may want a looser `pivot`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerance {
    pub symmetry: f64,
    pub pivot: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            symmetry: 1e-8,
            pivot: 1e-8,
        }
    }
}

impl Tolerance {
    /// Exact symmetry and no negative pivots at all.
    ///
    /// Zero pivots are still accepted, so exactly singular covariances remain
    /// valid.
    pub fn strict() -> Self {
        Self {
            symmetry: 0.0,
            pivot: 0.0,
        }
    }

    pub fn with_symmetry(mut self, symmetry: f64) -> Self {
        self.symmetry = symmetry;
        self
    }

    pub fn with_pivot(mut self, pivot: f64) -> Self {
        self.pivot = pivot;
        self
    }

    fn check(&self) -> Result<(), Error> {
        let valid = |t: f64| t.is_finite() && t >= 0.0;
        if valid(self.symmetry) && valid(self.pivot) {
            Ok(())
        } else {
            Err(Error::factorization(Factorization::InvalidTolerance))
        }
    }
}

/// `sqrt(|a_ii * a_jj|)`, the bound on `|a_ij|` for a semi-definite matrix
fn diagonal_scale<Real, N>(a: &OMatrix<Real, N, N>, i: usize, j: usize) -> Real
where
    Real: RealField + Copy,
    N: Dim,
    DefaultAllocator: Allocator<N, N>,
{
    (a[(i, i)] * a[(j, j)]).abs().sqrt()
}

/// Check that a square matrix is finite and symmetric.
///
/// The caller has already checked the matrix is square.
pub(crate) fn validate<Real, N>(matrix: &OMatrix<Real, N, N>, tolerance: &Tolerance) -> Result<(), Error>
where
    Real: RealField + Copy,
    N: Dim,
    DefaultAllocator: Allocator<N, N>,
{
    tolerance.check()?;

    let n = matrix.nrows();
    for j in 0..n {
        for i in 0..n {
            if !matrix[(i, j)].is_finite() {
                return Err(Error::factorization(Factorization::NotFinite { row: i, col: j }));
            }
        }
    }

    let symmetry = nalgebra::convert::<f64, Real>(tolerance.symmetry);
    for i in 0..n {
        for j in 0..i {
            let threshold = symmetry * diagonal_scale(matrix, i, j);
            if (matrix[(i, j)] - matrix[(j, i)]).abs() > threshold {
                return Err(Error::factorization(Factorization::NotSymmetric { row: i, col: j }));
            }
        }
    }
    Ok(())
}

/// Compute `L` with `L * L^T == covariance`, `L` lower triangular.
pub(crate) fn lower_cholesky<Real, N>(
    covariance: &OMatrix<Real, N, N>,
    tolerance: &Tolerance,
) -> Result<OMatrix<Real, N, N>, Error>
where
    Real: RealField + Copy,
    N: Dim,
    DefaultAllocator: Allocator<N, N>,
{
    validate(covariance, tolerance)?;

    if let Some(chol) = Cholesky::new(covariance.clone()) {
        log::debug!("{0}x{0} covariance is positive definite", covariance.nrows());
        return Ok(chol.unpack());
    }

    log::debug!(
        "{0}x{0} covariance is not positive definite, trying semi-definite factorization",
        covariance.nrows()
    );
    semidefinite_cholesky(covariance, tolerance)
}

/// Cholesky-Banachiewicz without pivoting, allowing zero pivots.
///
/// A zero pivot leaves its column of `L` zero. That is only consistent if
/// every remaining entry of the column has been eliminated as well. Each
/// pivot is compared against its own diagonal entry, so a coordinate with a
/// small variance is never judged against a larger one.
fn semidefinite_cholesky<Real, N>(
    a: &OMatrix<Real, N, N>,
    tolerance: &Tolerance,
) -> Result<OMatrix<Real, N, N>, Error>
where
    Real: RealField + Copy,
    N: Dim,
    DefaultAllocator: Allocator<N, N>,
{
    let n = a.nrows();
    let (dim, _) = a.shape_generic();
    let pivot = nalgebra::convert::<f64, Real>(tolerance.pivot);
    let pivot_sqrt = nalgebra::convert::<f64, Real>(tolerance.pivot.sqrt());

    let mut l = OMatrix::<Real, N, N>::zeros_generic(dim, dim);
    let mut clamped = 0;

    for j in 0..n {
        let mut d = a[(j, j)];
        for k in 0..j {
            d -= l[(j, k)] * l[(j, k)];
        }
        let pivot_tol = pivot * a[(j, j)].abs();

        if d < -pivot_tol {
            return Err(Error::factorization(Factorization::NegativePivot { index: j }));
        }

        if d <= pivot_tol {
            if d != nalgebra::zero::<Real>() {
                clamped += 1;
            }
            for i in (j + 1)..n {
                let column_tol = pivot_sqrt * diagonal_scale(a, i, j);
                if residual(a, &l, i, j).abs() > column_tol {
                    return Err(Error::factorization(Factorization::InconsistentRank {
                        row: i,
                        col: j,
                    }));
                }
            }
            continue;
        }

        let ljj = d.sqrt();
        l[(j, j)] = ljj;
        for i in (j + 1)..n {
            l[(i, j)] = residual(a, &l, i, j) / ljj;
        }
    }

    if clamped > 0 {
        log::warn!(
            "{} pivot(s) within tolerance of zero were clamped, covariance treated as singular",
            clamped
        );
    }
    Ok(l)
}

/// `a_ij - sum_{k<j} l_ik * l_jk`
fn residual<Real, N>(a: &OMatrix<Real, N, N>, l: &OMatrix<Real, N, N>, i: usize, j: usize) -> Real
where
    Real: RealField + Copy,
    N: Dim,
    DefaultAllocator: Allocator<N, N>,
{
    let mut s = a[(i, j)];
    for k in 0..j {
        s -= l[(i, k)] * l[(j, k)];
    }
    s
}

/// Accept a caller supplied lower-triangular factor.
///
/// Entries above the diagonal are ignored. The diagonal must be non-negative.
pub(crate) fn adopt_lower<Real, N>(l: &OMatrix<Real, N, N>) -> Result<OMatrix<Real, N, N>, Error>
where
    Real: RealField + Copy,
    N: Dim,
    DefaultAllocator: Allocator<N, N>,
{
    let l = l.lower_triangle();
    let n = l.nrows();
    for j in 0..n {
        for i in j..n {
            if !l[(i, j)].is_finite() {
                return Err(Error::factorization(Factorization::NotFinite { row: i, col: j }));
            }
        }
        if l[(j, j)] < nalgebra::zero::<Real>() {
            return Err(Error::factorization(Factorization::NegativePivot { index: j }));
        }
    }
    Ok(l)
}

/// Invert a precision matrix into a covariance matrix.
///
/// The precision must be positive definite. The result is symmetrized to
/// remove round-off from the inversion.
pub(crate) fn precision_to_covariance<Real, N>(
    precision: &OMatrix<Real, N, N>,
    tolerance: &Tolerance,
) -> Result<OMatrix<Real, N, N>, Error>
where
    Real: RealField + Copy,
    N: Dim,
    DefaultAllocator: Allocator<N, N>,
{
    validate(precision, tolerance)?;
    let inverse = Cholesky::new(precision.clone())
        .ok_or_else(|| Error::factorization(Factorization::PrecisionNotPositiveDefinite))?
        .inverse();
    let half = nalgebra::convert::<f64, Real>(0.5);
    Ok((&inverse + inverse.transpose()) * half)
}
