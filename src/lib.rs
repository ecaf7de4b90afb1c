//! Sampling from multivariate normal distributions using
//! [nalgebra](https://nalgebra.org).
//!
//! The covariance matrix is factored once into its lower-triangular Cholesky
//! factor `L` (so that `L * L^T` equals the covariance). Each draw then takes
//! a vector `Z` of independent standard normal variates and returns
//! `L * Z + mu`. Positive semi-definite (singular) covariance matrices are
//! accepted, see [`Tolerance`] for how round-off is handled.
//!
//! # Example of usage
//!
//! ```
//! use nalgebra::{Matrix2, Vector2};
//! use nalgebra_mvn_sampler::MultivariateNormal;
//! use rand::SeedableRng;
//! use rand_distr::Distribution;
//!
//! // specify mean and covariance of our multi-variate normal
//! let mu = Vector2::new(5.0, -3.0);
//! let sigma = Matrix2::new(
//!     2.0, 1.0,
//!     1.0, 2.0);
//!
//! let mvn = MultivariateNormal::from_mean_and_covariance(&mu, &sigma).unwrap();
//!
//! // the random number generator is always supplied by the caller
//! let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(0);
//!
//! // a single draw
//! let x: Vector2<f64> = mvn.sample(&mut rng);
//! assert!(x.iter().all(|v| v.is_finite()));
//!
//! // many draws, one sample per row
//! let xs = mvn.sample_batch(&mut rng, 1000);
//! assert_eq!(xs.shape(), (1000, 2));
//! ```
//!
//! # Threads
//!
//! A [`MultivariateNormal`] never owns a random number generator and is not
//! mutated by sampling. It can be shared between threads freely as long as
//! each thread draws with its own generator.
//!
//! # License
//! Licensed under either of
//!
//! * Apache License, Version 2.0,
//!   (./LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0)
//! * MIT license (./LICENSE-MIT or http://opensource.org/licenses/MIT)
//!
//! at your option.

use nalgebra::{allocator::Allocator, DefaultAllocator, Dim, Dyn, OMatrix, OVector, RealField, U1};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

mod error;
mod factor;
pub mod stats;

pub use crate::error::{Error, ErrorKind, Factorization};
pub use crate::factor::Tolerance;

/// An `N`-dimensional multivariate normal distribution
///
/// See the [crate-level docs](index.html) for example usage.
#[derive(Debug, Clone)]
pub struct MultivariateNormal<Real, N>
where
    Real: RealField + Copy,
    N: Dim,
    DefaultAllocator: Allocator<N>,
    DefaultAllocator: Allocator<N, N>,
{
    /// Mean of the distribution
    mu: OVector<Real, N>,
    /// Lower-triangular Cholesky factor of the covariance
    chol: OMatrix<Real, N, N>,
    /// Log of the density normalisation constant, `None` if the covariance
    /// is singular
    log_fac: Option<Real>,
}

impl<Real, N> MultivariateNormal<Real, N>
where
    Real: RealField + Copy,
    N: Dim,
    DefaultAllocator: Allocator<N>,
    DefaultAllocator: Allocator<N, N>,
{
    /// Create a multivariate normal distribution from a mean and covariance
    ///
    /// The mean vector `mu` is N dimensional and the `covariance` matrix is
    /// N x N. Uses [`Tolerance::default`].
    ///
    /// This fails if the covariance matrix is not symmetric positive
    /// semi-definite, or (for dynamically sized input) if the shapes of `mu`
    /// and `covariance` disagree.
    pub fn from_mean_and_covariance(
        mu: &OVector<Real, N>,
        covariance: &OMatrix<Real, N, N>,
    ) -> Result<Self, Error> {
        Self::from_mean_and_covariance_with_tolerance(mu, covariance, &Tolerance::default())
    }

    /// Create a multivariate normal distribution from a mean and covariance,
    /// using an explicit numerical tolerance.
    pub fn from_mean_and_covariance_with_tolerance(
        mu: &OVector<Real, N>,
        covariance: &OMatrix<Real, N, N>,
        tolerance: &Tolerance,
    ) -> Result<Self, Error> {
        check_dimensions(mu, covariance)?;
        let chol = factor::lower_cholesky(covariance, tolerance)?;
        Ok(Self::from_parts(mu.clone(), chol))
    }

    /// Create a multivariate normal distribution from a mean and precision
    ///
    /// The mean vector `mu` is N dimensional and the `precision` matrix is
    /// N x N.
    ///
    /// The covariance matrix is calculated by inverting the precision matrix
    /// using a Cholesky decomposition. This can fail if the precision matrix
    /// is not definite positive.
    pub fn from_mean_and_precision(
        mu: &OVector<Real, N>,
        precision: &OMatrix<Real, N, N>,
    ) -> Result<Self, Error> {
        check_dimensions(mu, precision)?;
        let tolerance = Tolerance::default();
        let covariance = factor::precision_to_covariance(precision, &tolerance)?;
        Self::from_mean_and_covariance_with_tolerance(mu, &covariance, &tolerance)
    }

    /// Create a multivariate normal distribution from a mean and a
    /// lower-triangular Cholesky factor of the covariance.
    ///
    /// Entries above the diagonal of `l` are ignored. The diagonal must be
    /// non-negative.
    pub fn from_mean_and_cholesky(
        mu: &OVector<Real, N>,
        l: &OMatrix<Real, N, N>,
    ) -> Result<Self, Error> {
        check_dimensions(mu, l)?;
        let chol = factor::adopt_lower(l)?;
        Ok(Self::from_parts(mu.clone(), chol))
    }

    fn from_parts(mu: OVector<Real, N>, chol: OMatrix<Real, N, N>) -> Self {
        let ndim = mu.nrows();
        let zero = nalgebra::zero::<Real>();

        // log of 1 / sqrt((2 pi)^k det(sigma)), where det(sigma) is the
        // squared product of the diagonal of L
        let log_fac = if chol.diagonal().iter().all(|d| *d > zero) {
            let log_det_l = chol.diagonal().iter().fold(zero, |acc, d| acc + d.ln());
            let half = nalgebra::convert::<f64, Real>(0.5);
            let k: Real = nalgebra::convert(ndim as f64);
            Some(-(half * k * Real::two_pi().ln()) - log_det_l)
        } else {
            None
        };

        let result = Self { mu, chol, log_fac };
        log::debug!(
            "multivariate normal ready: dim {}, rank {}",
            result.dim(),
            result.rank()
        );
        result
    }

    /// Number of dimensions
    pub fn dim(&self) -> usize {
        self.mu.nrows()
    }

    /// Mean of the distribution
    pub fn mean(&self) -> &OVector<Real, N> {
        &self.mu
    }

    /// Lower-triangular Cholesky factor `L` of the covariance
    pub fn cholesky_factor(&self) -> &OMatrix<Real, N, N> {
        &self.chol
    }

    /// Covariance of the distribution, recomputed as `L * L^T`
    pub fn covariance(&self) -> OMatrix<Real, N, N> {
        &self.chol * self.chol.transpose()
    }

    /// Rank of the covariance matrix
    pub fn rank(&self) -> usize {
        let zero = nalgebra::zero::<Real>();
        self.chol.diagonal().iter().filter(|d| **d != zero).count()
    }

    /// True if the covariance is singular, in which case all samples lie in
    /// a proper affine subspace and there is no density.
    pub fn is_degenerate(&self) -> bool {
        self.log_fac.is_none()
    }

    /// Draw `n` independent samples
    ///
    /// The result has one sample per row. Row `k` is built from the same
    /// standard normal variates as the `k`-th of `n` consecutive calls to
    /// [`Distribution::sample`] with the same generator. `n == 0` returns an
    /// empty `0 x N` matrix.
    pub fn sample_batch<R>(&self, rng: &mut R, n: usize) -> OMatrix<Real, Dyn, N>
    where
        R: Rng + ?Sized,
        StandardNormal: Distribution<Real>,
        DefaultAllocator: Allocator<N, Dyn>,
        DefaultAllocator: Allocator<Dyn, N>,
    {
        let (dim, _) = self.mu.shape_generic();
        // column-major fill: column k holds the variates of sample k
        let zs = OMatrix::<Real, N, Dyn>::from_fn_generic(dim, Dyn(n), |_, _| {
            StandardNormal.sample(&mut *rng)
        });
        let xs = (&self.chol * zs).transpose();
        broadcast_add(&xs, &self.mu)
    }

    /// Log of the probability density function
    ///
    /// Evaluate the log probability density at locations `xs`, given as row
    /// vectors vertically stacked.
    pub fn logpdf<Count>(&self, xs: &OMatrix<Real, Count, N>) -> Result<OVector<Real, Count>, Error>
    where
        Count: Dim,
        DefaultAllocator: Allocator<Count>,
        DefaultAllocator: Allocator<N, Count>,
        DefaultAllocator: Allocator<Count, N>,
    {
        if xs.ncols() != self.dim() {
            return Err(Error::new(ErrorKind::SampleDimension {
                expected: self.dim(),
                found: xs.ncols(),
            }));
        }
        let log_fac = self.log_fac.ok_or_else(|| Error::new(ErrorKind::Degenerate))?;

        let dvs = broadcast_add(xs, &-&self.mu);
        // whitened = L^-1 (x - mu), one column per location
        let whitened = self
            .chol
            .solve_lower_triangular(&dvs.transpose())
            .ok_or_else(|| Error::new(ErrorKind::Degenerate))?;

        let (count, _) = xs.shape_generic();
        let half = nalgebra::convert::<f64, Real>(0.5);
        Ok(OVector::<Real, Count>::from_iterator_generic(
            count,
            U1,
            whitened
                .column_iter()
                .map(|w| log_fac - half * w.norm_squared()),
        ))
    }

    /// Probability density function
    ///
    /// Evaluate the probability density at locations `xs`.
    pub fn pdf<Count>(&self, xs: &OMatrix<Real, Count, N>) -> Result<OVector<Real, Count>, Error>
    where
        Count: Dim,
        DefaultAllocator: Allocator<Count>,
        DefaultAllocator: Allocator<N, Count>,
        DefaultAllocator: Allocator<Count, N>,
    {
        Ok(self.logpdf(xs)?.map(|y| y.exp()))
    }
}

impl<Real> MultivariateNormal<Real, Dyn>
where
    Real: RealField + Copy,
{
    /// Create a dynamically sized distribution from plain slices
    ///
    /// `covariance` is given as rows. Ragged rows, or a row count that
    /// differs from the length of `mean`, are a dimension mismatch.
    pub fn from_slices<Row>(mean: &[Real], covariance: &[Row]) -> Result<Self, Error>
    where
        Row: AsRef<[Real]>,
    {
        let covariance: Vec<&[Real]> = covariance.iter().map(|row| row.as_ref()).collect();
        let rows = covariance.len();
        if let Some(row) = covariance.iter().find(|row| row.len() != rows) {
            return Err(Error::dimension_mismatch(mean.len(), rows, row.len()));
        }
        let mu = OVector::<Real, Dyn>::from_column_slice(mean);
        let sigma = OMatrix::<Real, Dyn, Dyn>::from_fn(rows, rows, |i, j| covariance[i][j]);
        Self::from_mean_and_covariance(&mu, &sigma)
    }
}

impl<Real, N> Distribution<OVector<Real, N>> for MultivariateNormal<Real, N>
where
    Real: RealField + Copy,
    N: Dim,
    DefaultAllocator: Allocator<N>,
    DefaultAllocator: Allocator<N, N>,
    StandardNormal: Distribution<Real>,
{
    /// Draw one sample, consuming `N` standard normal variates from `rng`.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> OVector<Real, N> {
        let (dim, _) = self.mu.shape_generic();
        let z = OVector::<Real, N>::from_fn_generic(dim, U1, |_, _| StandardNormal.sample(&mut *rng));
        &self.chol * z + &self.mu
    }
}

fn check_dimensions<Real, N>(mu: &OVector<Real, N>, matrix: &OMatrix<Real, N, N>) -> Result<(), Error>
where
    Real: RealField + Copy,
    N: Dim,
    DefaultAllocator: Allocator<N>,
    DefaultAllocator: Allocator<N, N>,
{
    let (rows, cols) = matrix.shape();
    if rows != cols || rows != mu.nrows() {
        return Err(Error::dimension_mismatch(mu.nrows(), rows, cols));
    }
    Ok(())
}

/// Add `vec` to each row of `arr`, returning the result with shape of `arr`.
///
/// Inputs `arr` has shape R x C and `vec` is C dimensional. Result
/// has shape R x C.
fn broadcast_add<Real, R, C>(arr: &OMatrix<Real, R, C>, vec: &OVector<Real, C>) -> OMatrix<Real, R, C>
where
    Real: RealField + Copy,
    R: Dim,
    C: Dim,
    DefaultAllocator: Allocator<R, C>,
    DefaultAllocator: Allocator<C>,
{
    let (nrows, ncols) = arr.shape_generic();
    OMatrix::from_fn_generic(nrows, ncols, |i, j| arr[(i, j)] + vec[j])
}
