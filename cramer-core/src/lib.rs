//! # Cramer Core Library
//!
//! Provides the dense matrix model, the determinant engine and the execution
//! devices shared by the Cramer's Rule solvers.

pub mod dense_matrix;
pub mod determinant;
pub mod device;
pub mod error;
pub mod linear_system;
pub mod traits;

pub use dense_matrix::DenseMatrix;
pub use determinant::{compute_determinant, PIVOT_EPSILON};
pub use device::{CpuDevice, Device, ProcessDevice, WorkerFault};
pub use error::CramerCoreError;
pub use linear_system::{LinearSystem, Solution};

pub use traits::{Matrix, Vector};
