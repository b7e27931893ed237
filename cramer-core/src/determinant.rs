//! Determinant of a dense square matrix by forward Gaussian elimination.
//!
//! No row or column exchanges are performed. A pivot whose magnitude falls
//! below [`PIVOT_EPSILON`] ends the elimination and the determinant is reported
//! as exactly zero, even when a row exchange would have produced a usable
//! pivot. Callers rely on this exact-zero result to detect singular systems.
//!
//! The elimination runs inside forked workers, so it does not log; reporting a
//! singular system is left to the caller.

use crate::dense_matrix::DenseMatrix;
use crate::error::{CramerCoreError, Result};
use crate::traits::Matrix;
use num_traits::{Float, NumCast};

/// Pivots with a smaller magnitude are treated as zero.
pub const PIVOT_EPSILON: f64 = 1e-9;

/// Computes the determinant of `matrix`, consuming it.
///
/// The elimination destroys the matrix contents; clone first if the original
/// values are still needed.
pub fn compute_determinant<T>(mut matrix: DenseMatrix<T>) -> Result<T>
where
    T: Float + Send + Sync + std::fmt::Debug + Default + bytemuck::Pod,
{
    eliminate_in_place(&mut matrix)
}

/// Reduces `matrix` to upper-triangular form in place and returns the product
/// of its diagonal.
///
/// Returns zero as soon as a pivot below [`PIVOT_EPSILON`] is met; the matrix is
/// left partially eliminated in that case.
pub fn eliminate_in_place<T>(matrix: &mut DenseMatrix<T>) -> Result<T>
where
    T: Float + Send + Sync + std::fmt::Debug + Default + bytemuck::Pod,
{
    if !matrix.is_square() {
        let (rows, cols) = matrix.dims();
        return Err(CramerCoreError::InvalidDimensions(format!(
            "Determinant requires a square matrix (dims: {}x{})",
            rows, cols
        )));
    }
    let n = matrix.rows();
    let epsilon = <T as NumCast>::from(PIVOT_EPSILON).ok_or_else(|| {
        CramerCoreError::Internal("Pivot threshold is not representable".to_string())
    })?;
    let data = matrix.data_mut();
    let mut result = T::one();

    for i in 0..n {
        let (upper, lower) = data.split_at_mut((i + 1) * n);
        let pivot_row = &upper[i * n..];
        let pivot = pivot_row[i];
        if pivot.abs() < epsilon {
            return Ok(T::zero());
        }

        // The full row is updated, including the columns left of the pivot.
        for row in lower.chunks_exact_mut(n) {
            let factor = row[i] / pivot;
            for (value, &p) in row.iter_mut().zip(pivot_row) {
                *value = *value - factor * p;
            }
        }
        result = result * pivot;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(rows: &[Vec<f64>]) -> f64 {
        compute_determinant(DenseMatrix::from_rows(rows).unwrap()).unwrap()
    }

    #[test]
    fn test_identity_determinant_is_one() {
        for n in 1..=12 {
            let d = compute_determinant(DenseMatrix::<f64>::identity(n)).unwrap();
            assert_eq!(d, 1.0, "identity of size {}", n);
        }
    }

    #[test]
    fn test_two_by_two() {
        assert!((det(&[vec![2.0, 1.0], vec![1.0, 3.0]]) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_three_by_three() {
        let d = det(&[
            vec![2.0, -3.0, 1.0],
            vec![2.0, 0.0, -1.0],
            vec![1.0, 4.0, 5.0],
        ]);
        assert!((d - 49.0).abs() < 1e-9, "got {}", d);
    }

    #[test]
    fn test_zero_row_gives_zero() {
        let d = det(&[
            vec![1.0, 2.0, 3.0],
            vec![0.0, 0.0, 0.0],
            vec![4.0, 5.0, 7.0],
        ]);
        assert_eq!(d, 0.0);
    }

    #[test]
    fn test_identical_rows_give_zero() {
        let d = det(&[
            vec![3.0, 1.0, 4.0],
            vec![1.0, 5.0, 9.0],
            vec![3.0, 1.0, 4.0],
        ]);
        assert_eq!(d, 0.0);
    }

    #[test]
    fn test_random_matrices_with_zero_row_or_duplicate_rows() {
        let mut rng = fastrand::Rng::with_seed(7);
        for n in 2..10 {
            let mut rows: Vec<Vec<f64>> = (0..n)
                .map(|_| (0..n).map(|_| rng.f64() * 10.0 + 1.0).collect())
                .collect();
            let target = rng.usize(1..n);
            rows[target] = rows[0].clone();
            assert_eq!(det(&rows), 0.0, "duplicate rows, n = {}", n);

            rows[target] = vec![0.0; n];
            assert_eq!(det(&rows), 0.0, "zero row, n = {}", n);
        }
    }

    #[test]
    fn test_zero_leading_pivot_is_reported_singular() {
        // Non-singular, but the first pivot is zero and no row exchange happens.
        let d = det(&[vec![0.0, 1.0], vec![1.0, 0.0]]);
        assert_eq!(d, 0.0);
    }

    #[test]
    fn test_non_square_is_rejected() {
        let m = DenseMatrix::<f64>::zeros(2, 3);
        assert!(matches!(
            compute_determinant(m),
            Err(CramerCoreError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_works_for_f32() {
        let m = DenseMatrix::<f32>::from_rows(&[vec![4.0, 3.0], vec![6.0, 3.0]]).unwrap();
        assert!((compute_determinant(m).unwrap() + 6.0).abs() < 1e-5);
    }

    #[test]
    fn test_singular_elimination_emits_no_log_records() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingLogger(AtomicUsize);

        impl log::Log for CountingLogger {
            fn enabled(&self, _: &log::Metadata) -> bool {
                true
            }
            fn log(&self, _: &log::Record) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
            fn flush(&self) {}
        }

        static LOGGER: CountingLogger = CountingLogger(AtomicUsize::new(0));
        log::set_logger(&LOGGER).unwrap();
        log::set_max_level(log::LevelFilter::Trace);

        assert_eq!(det(&[vec![0.0, 1.0], vec![1.0, 0.0]]), 0.0);
        assert_eq!(det(&[vec![1.0, 2.0], vec![2.0, 4.0]]), 0.0);
        assert_eq!(LOGGER.0.load(Ordering::SeqCst), 0);
    }
}
