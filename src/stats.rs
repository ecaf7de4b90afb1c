//! Empirical moments of samples stored as row vectors vertically stacked.

use nalgebra::{allocator::Allocator, DefaultAllocator, Dim, OMatrix, OVector, RealField, U1};

/// Calculate the mean of R x C matrix along the rows and return C dim vector
///
/// Returns `None` if `arr` has no rows.
pub fn sample_mean<Real, R, C>(arr: &OMatrix<Real, R, C>) -> Option<OVector<Real, C>>
where
    Real: RealField + Copy,
    R: Dim,
    C: Dim,
    DefaultAllocator: Allocator<R, C>,
    DefaultAllocator: Allocator<C>,
{
    if arr.nrows() == 0 {
        return None;
    }
    let (_, ncols) = arr.shape_generic();
    let scale = nalgebra::one::<Real>() / nalgebra::convert::<f64, Real>(arr.nrows() as f64);
    Some(OVector::<Real, C>::from_fn_generic(ncols, U1, |j, _| {
        arr.column(j)
            .iter()
            .fold(nalgebra::zero::<Real>(), |acc, &x| acc + x)
            * scale
    }))
}

/// Calculate the sample covariance
///
/// Calculates the sample covariances among K variables based on N observations
/// each. Calculates K x K covariance matrix from observations in `arr`, which
/// is N rows of K columns used to store N vectors of dimension K. Uses the
/// unbiased `N - 1` denominator, so at least two observations are required.
pub fn sample_covariance<Real, N, K>(arr: &OMatrix<Real, N, K>) -> Option<OMatrix<Real, K, K>>
where
    Real: RealField + Copy,
    N: Dim,
    K: Dim,
    DefaultAllocator: Allocator<N, K>,
    DefaultAllocator: Allocator<K, N>,
    DefaultAllocator: Allocator<K, K>,
    DefaultAllocator: Allocator<K>,
{
    if arr.nrows() < 2 {
        return None;
    }
    let mu = sample_mean(arr)?;
    let (nrows, ncols) = arr.shape_generic();
    let y = OMatrix::<Real, N, K>::from_fn_generic(nrows, ncols, |i, j| arr[(i, j)] - mu[j]);
    let n1 = nalgebra::convert::<f64, Real>((arr.nrows() - 1) as f64);
    Some((y.transpose() * y) / n1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, Matrix2, Matrix3x2, Matrix2x4, Matrix4x2, Vector2, Vector4};

    #[test]
    fn test_covar() {
        let arr = Matrix3x2::<f64>::new(
            1.0, 0.1,
            2.0, 0.2,
            3.0, 0.3,
        );

        let c = sample_covariance(&arr).unwrap();

        let expected = Matrix2::<f64>::new(
            1.0, 0.1,
            0.1, 0.01,
        );

        assert_relative_eq!(c, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_mean_axis0() {
        let a1 = Matrix2x4::<f64>::new(
            1.0, 2.0, 3.0, 4.0,
            5.0, 6.0, 7.0, 8.0,
        );
        let actual1 = sample_mean(&a1).unwrap();
        assert_eq!(actual1, Vector4::new(3.0, 4.0, 5.0, 6.0));

        let a2 = Matrix4x2::<f64>::new(
            1.0, 2.0,
            3.0, 4.0,
            5.0, 6.0,
            7.0, 8.0,
        );
        let actual2 = sample_mean(&a2).unwrap();
        assert_eq!(actual2, Vector2::new(4.0, 5.0));
    }

    #[test]
    fn test_too_few_rows() {
        let empty = DMatrix::<f64>::zeros(0, 3);
        assert!(sample_mean(&empty).is_none());
        assert!(sample_covariance(&empty).is_none());

        let single = DMatrix::<f64>::from_row_slice(1, 2, &[1.0, 2.0]);
        assert_eq!(sample_mean(&single).unwrap().as_slice(), &[1.0, 2.0]);
        assert!(sample_covariance(&single).is_none());
    }
}
