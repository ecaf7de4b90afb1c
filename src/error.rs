/// An error
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }

    pub(crate) fn factorization(reason: Factorization) -> Self {
        Self::new(ErrorKind::Factorization(reason))
    }

    pub(crate) fn dimension_mismatch(mean: usize, rows: usize, cols: usize) -> Self {
        Self::new(ErrorKind::DimensionMismatch { mean, rows, cols })
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.kind {
            ErrorKind::DimensionMismatch { mean, rows, cols } => write!(
                f,
                "dimension mismatch: mean has {} entries but matrix is {}x{}",
                mean, rows, cols
            ),
            ErrorKind::Factorization(reason) => write!(f, "factorization failed: {}", reason),
            ErrorKind::SampleDimension { expected, found } => write!(
                f,
                "samples have {} columns but the distribution has {} dimensions",
                found, expected
            ),
            ErrorKind::Degenerate => {
                write!(f, "covariance is singular, the distribution has no density")
            }
        }
    }
}

/// Kind of error
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    /// The mean and the matrix disagree in size, or the matrix is not square.
    DimensionMismatch {
        mean: usize,
        rows: usize,
        cols: usize,
    },
    /// The matrix is not a valid covariance (or precision) matrix.
    Factorization(Factorization),
    /// Density requested at samples whose width is not the dimension.
    SampleDimension { expected: usize, found: usize },
    /// Density requested from a distribution with a rank deficient covariance.
    Degenerate,
}

/// Why a matrix could not be factored
#[derive(Debug, Clone, PartialEq)]
pub enum Factorization {
    NotFinite { row: usize, col: usize },
    NotSymmetric { row: usize, col: usize },
    /// A pivot fell below the negative tolerance: the matrix has a negative
    /// eigenvalue.
    NegativePivot { index: usize },
    /// A zero pivot with a non-zero entry below it. Such a matrix is
    /// indefinite even though every pivot so far was non-negative.
    InconsistentRank { row: usize, col: usize },
    PrecisionNotPositiveDefinite,
    /// A tolerance was negative or not finite.
    InvalidTolerance,
}

impl std::fmt::Display for Factorization {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Factorization::NotFinite { row, col } => {
                write!(f, "entry ({}, {}) is not finite", row, col)
            }
            Factorization::NotSymmetric { row, col } => {
                write!(f, "entries ({0}, {1}) and ({1}, {0}) differ", row, col)
            }
            Factorization::NegativePivot { index } => {
                write!(f, "negative pivot at index {}, matrix is not positive semi-definite", index)
            }
            Factorization::InconsistentRank { row, col } => write!(
                f,
                "zero pivot in column {} but entry ({}, {}) is non-zero, matrix is indefinite",
                col, row, col
            ),
            Factorization::PrecisionNotPositiveDefinite => {
                write!(f, "precision matrix is not positive definite")
            }
            Factorization::InvalidTolerance => {
                write!(f, "tolerances must be finite and non-negative")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = Error::dimension_mismatch(3, 2, 2);
        assert_eq!(
            e.to_string(),
            "dimension mismatch: mean has 3 entries but matrix is 2x2"
        );

        let e = Error::factorization(Factorization::NegativePivot { index: 1 });
        assert!(e.to_string().starts_with("factorization failed: negative pivot at index 1"));
        assert_eq!(
            e.kind(),
            &ErrorKind::Factorization(Factorization::NegativePivot { index: 1 })
        );

        let e = Error::new(ErrorKind::SampleDimension { expected: 2, found: 3 });
        assert_eq!(
            e.to_string(),
            "samples have 3 columns but the distribution has 2 dimensions"
        );
    }
}
