use crate::dense_matrix::DenseMatrix;
use crate::error::{CramerCoreError, Result};
use crate::traits::{Matrix, Vector};

/// The immutable input of a solve: `A x = b` with `A` square and non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSystem {
    a: DenseMatrix<f64>,
    b: Vec<f64>,
}

impl LinearSystem {
    /// Validates and wraps a coefficient matrix and right-hand side.
    ///
    /// # Errors
    /// `InvalidInput` for an empty system, `InvalidDimensions` when `A` is not
    /// square or `b` does not have one entry per row.
    pub fn new(a: DenseMatrix<f64>, b: Vec<f64>) -> Result<Self> {
        let (rows, cols) = a.dims();
        if rows == 0 || Vector::is_empty(&b) {
            return Err(CramerCoreError::InvalidInput(
                "System dimension must be positive (n = 0)".to_string(),
            ));
        }
        if !a.is_square() {
            return Err(CramerCoreError::InvalidDimensions(format!(
                "Matrix A must be square (dims: {}x{})",
                rows, cols
            )));
        }
        if rows != b.len() {
            return Err(CramerCoreError::InvalidDimensions(format!(
                "Matrix A rows ({}) must match RHS vector b length ({})",
                rows,
                b.len()
            )));
        }
        Ok(Self { a, b })
    }

    /// Convenience constructor from nested rows.
    pub fn from_rows(a: &[Vec<f64>], b: Vec<f64>) -> Result<Self> {
        Self::new(DenseMatrix::from_rows(a)?, b)
    }

    /// Dimension of the system.
    pub fn n(&self) -> usize {
        self.a.rows()
    }

    pub fn a(&self) -> &DenseMatrix<f64> {
        &self.a
    }

    pub fn b(&self) -> &[f64] {
        &self.b
    }

    /// Returns a fresh copy of `A` with column `index` replaced by `b`.
    pub fn substituted(&self, index: usize) -> Result<DenseMatrix<f64>> {
        let mut m = self.a.try_clone()?;
        m.replace_column(&self.b, index)?;
        Ok(m)
    }

    /// Largest absolute entry of `A x - b`.
    pub fn max_residual(&self, x: &[f64]) -> Result<f64> {
        let ax = self.a.mul_vec(x)?;
        Ok(ax
            .iter()
            .zip(&self.b)
            .map(|(l, r)| (l - r).abs())
            .fold(0.0, f64::max))
    }
}

/// Outcome of a solve.
///
/// When `singular` is set, `x` and `per_index_ok` are empty. Otherwise both
/// have one entry per unknown; an index whose computation failed has
/// `per_index_ok[i] == false` and `x[i]` is NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub x: Vec<f64>,
    pub singular: bool,
    pub per_index_ok: Vec<bool>,
    /// Determinant of `A` as computed by the elimination.
    pub determinant: f64,
}

impl Solution {
    pub fn singular(determinant: f64) -> Self {
        Self {
            x: Vec::new(),
            singular: true,
            per_index_ok: Vec::new(),
            determinant,
        }
    }

    pub fn computed(x: Vec<f64>, per_index_ok: Vec<bool>, determinant: f64) -> Self {
        debug_assert_eq!(x.len(), per_index_ok.len());
        Self {
            x,
            singular: false,
            per_index_ok,
            determinant,
        }
    }

    pub fn is_singular(&self) -> bool {
        self.singular
    }

    /// True when the system is non-singular and every index was computed.
    pub fn is_complete(&self) -> bool {
        !self.singular && self.per_index_ok.iter().all(|&ok| ok)
    }

    /// Value of unknown `index`, or None if it was not computed.
    pub fn value(&self, index: usize) -> Option<f64> {
        match self.per_index_ok.get(index) {
            Some(true) => self.x.get(index).copied(),
            _ => None,
        }
    }

    pub fn failed_indices(&self) -> Vec<usize> {
        self.per_index_ok
            .iter()
            .enumerate()
            .filter(|(_, &ok)| !ok)
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_system_is_invalid_input() {
        let err = LinearSystem::new(DenseMatrix::zeros(0, 0), vec![]).unwrap_err();
        assert!(matches!(err, CramerCoreError::InvalidInput(_)));
    }

    #[test]
    fn test_mismatched_rhs_is_rejected() {
        let err = LinearSystem::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0]], vec![1.0]).unwrap_err();
        assert!(matches!(err, CramerCoreError::InvalidDimensions(_)));
    }

    #[test]
    fn test_non_square_is_rejected() {
        let a = DenseMatrix::new(2, 3, vec![0.0; 6]).unwrap();
        let err = LinearSystem::new(a, vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, CramerCoreError::InvalidDimensions(_)));
    }

    #[test]
    fn test_substituted_leaves_original_untouched() {
        let system =
            LinearSystem::from_rows(&[vec![2.0, 1.0], vec![1.0, 3.0]], vec![3.0, 5.0]).unwrap();
        let m = system.substituted(1).unwrap();
        assert_eq!(m.data(), &[2.0, 3.0, 1.0, 5.0]);
        assert_eq!(system.a().data(), &[2.0, 1.0, 1.0, 3.0]);
    }

    #[test]
    fn test_solution_accessors() {
        let s = Solution::computed(vec![1.0, f64::NAN, 3.0], vec![true, false, true], 2.0);
        assert!(!s.is_singular());
        assert!(!s.is_complete());
        assert_eq!(s.value(0), Some(1.0));
        assert_eq!(s.value(1), None);
        assert_eq!(s.value(5), None);
        assert_eq!(s.failed_indices(), vec![1]);

        let singular = Solution::singular(0.0);
        assert!(singular.is_singular());
        assert!(!singular.is_complete());
        assert!(singular.x.is_empty());
    }
}
