//! `cramer-solver`: solves dense linear systems with Cramer's Rule.
//!
//! The same algorithm runs either sequentially on the calling thread or
//! fanned out to forked worker processes, one per unknown, each reporting
//! back through its own pipe.

// Core modules
pub mod algorithms;
#[cfg(unix)]
pub mod process;

use algorithms::{CramersRule, SolveAlgorithm};

// Re-export from cramer_core
pub use cramer_core::{
    CpuDevice, CramerCoreError, DenseMatrix, LinearSystem, Matrix, ProcessDevice, Solution,
    Vector, WorkerFault,
};

/// Solves `system` on the calling thread.
pub fn solve_sequential(system: &LinearSystem) -> Result<Solution, CramerCoreError> {
    Ok(CramersRule::new().solve(&CpuDevice::default(), system)?.solution)
}

/// Solves `system` with one worker process per unknown, at most
/// `device.max_concurrent_workers` at a time.
pub fn solve_parallel(
    system: &LinearSystem,
    device: &ProcessDevice,
) -> Result<Solution, CramerCoreError> {
    Ok(CramersRule::new().solve(device, system)?.solution)
}
