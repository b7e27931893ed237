use crate::error::{CramerCoreError, Result};
use crate::traits::Matrix;
use num_traits::Float;

/// Represents a dense matrix stored in row-major order on the CPU.
///
/// The dimensions are fixed at construction. Elimination routines mutate the
/// storage in place, so anything that needs the original values later must
/// work on a [`DenseMatrix::try_clone`] copy.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix<T: Copy + Send + Sync + std::fmt::Debug + Default + bytemuck::Pod> {
    rows: usize,
    cols: usize,
    data: Vec<T>, // Data stored row-major: data[row * cols + col]
}

impl<T: Copy + Send + Sync + std::fmt::Debug + Default + bytemuck::Pod> DenseMatrix<T> {
    /// Creates a new DenseMatrix from raw data, dimensions, assuming row-major order.
    pub fn new(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(CramerCoreError::InvalidDimensions(format!(
                "Data length ({}) does not match dimensions ({}x{})",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Builds a matrix from a slice of rows. Every row must have the same length.
    pub fn from_rows(rows: &[Vec<T>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(CramerCoreError::InvalidDimensions(format!(
                    "Row {} has length {} but row 0 has length {}",
                    i,
                    row.len(),
                    cols
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Creates a new DenseMatrix filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![T::default(); rows * cols],
        }
    }

    /// Allocates a square `n x n` matrix filled with `T::default()`.
    ///
    /// Unlike [`DenseMatrix::zeros`], a failed allocation is reported as
    /// [`CramerCoreError::ResourceExhaustion`] instead of aborting the process.
    pub fn allocate(n: usize) -> Result<Self> {
        let len = n.checked_mul(n).ok_or_else(|| {
            CramerCoreError::ResourceExhaustion(format!("{}x{} matrix overflows usize", n, n))
        })?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|e| {
            CramerCoreError::ResourceExhaustion(format!(
                "Cannot allocate {}x{} matrix: {}",
                n, n, e
            ))
        })?;
        data.resize(len, T::default());
        Ok(Self {
            rows: n,
            cols: n,
            data,
        })
    }

    /// Returns an independent copy of this matrix.
    ///
    /// Same as `clone()`, but allocation failure surfaces as an error.
    pub fn try_clone(&self) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(self.data.len()).map_err(|e| {
            CramerCoreError::ResourceExhaustion(format!(
                "Cannot clone {}x{} matrix: {}",
                self.rows, self.cols, e
            ))
        })?;
        data.extend_from_slice(&self.data);
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    /// Releases the matrix storage. Equivalent to dropping it.
    pub fn release(self) {}

    /// Overwrites column `index` with `column`, in place.
    pub fn replace_column(&mut self, column: &[T], index: usize) -> Result<()> {
        if index >= self.cols {
            return Err(CramerCoreError::InvalidDimensions(format!(
                "Column index {} out of bounds for {}x{} matrix",
                index, self.rows, self.cols
            )));
        }
        if column.len() != self.rows {
            return Err(CramerCoreError::InvalidDimensions(format!(
                "Column length ({}) does not match matrix rows ({})",
                column.len(),
                self.rows
            )));
        }
        for (row, &value) in self.data.chunks_exact_mut(self.cols).zip(column) {
            row[index] = value;
        }
        Ok(())
    }

    /// Returns a slice view of the underlying data vector.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Returns a mutable slice view of the underlying data vector.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Returns row `row` as a slice, or None if out of bounds.
    pub fn row(&self, row: usize) -> Option<&[T]> {
        if row < self.rows {
            Some(&self.data[row * self.cols..(row + 1) * self.cols])
        } else {
            None
        }
    }

    /// Gets the element at the specified row and column (immutable).
    /// Returns None if indices are out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// Gets the element at the specified row and column (mutable).
    /// Returns None if indices are out of bounds.
    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut T> {
        if row < self.rows && col < self.cols {
            self.data.get_mut(row * self.cols + col)
        } else {
            None
        }
    }
}

impl<T: Float + Send + Sync + std::fmt::Debug + Default + bytemuck::Pod> DenseMatrix<T> {
    /// Creates the `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i * n + i] = T::one();
        }
        m
    }

    /// Computes `y = self * x`.
    pub fn mul_vec(&self, x: &[T]) -> Result<Vec<T>> {
        if x.len() != self.cols {
            return Err(CramerCoreError::InvalidDimensions(format!(
                "Vector length ({}) does not match matrix columns ({})",
                x.len(),
                self.cols
            )));
        }
        Ok(self
            .data
            .chunks_exact(self.cols.max(1))
            .take(self.rows)
            .map(|row| {
                row.iter()
                    .zip(x)
                    .fold(T::zero(), |acc, (&a, &b)| acc + a * b)
            })
            .collect())
    }
}

// Implement the generic Matrix trait
impl<T: Copy + Send + Sync + std::fmt::Debug + Default + bytemuck::Pod> Matrix for DenseMatrix<T> {
    type Value = T;

    fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
}
