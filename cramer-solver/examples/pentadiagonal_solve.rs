use cramer_solver::{
    algorithms::{CramersRule, SolveAlgorithm},
    CpuDevice, DenseMatrix, LinearSystem, ProcessDevice,
};
use std::time::Instant;

/// Creates a pentadiagonal dense matrix A of size n x n.
/// Diagonals:
/// - Main: 4.0
/// - Adjacent (+1, -1): -1.0
/// - Outer (+2, -2): -0.5
fn create_pentadiagonal_matrix(n: usize) -> DenseMatrix<f64> {
    let mut a = DenseMatrix::zeros(n, n);
    for i in 0..n {
        for (offset, value) in [(-2i64, -0.5), (-1, -1.0), (0, 4.0), (1, -1.0), (2, -0.5)] {
            let j = i as i64 + offset;
            if j >= 0 && (j as usize) < n {
                if let Some(entry) = a.get_mut(i, j as usize) {
                    *entry = value;
                }
            }
        }
    }
    a
}

/// Creates a vector b of size n with b[i] = sin(i / n).
fn create_sin_vector(n: usize) -> Vec<f64> {
    (0..n).map(|i| (i as f64 / n as f64).sin()).collect()
}

fn main() {
    // Initialize logging based on RUST_LOG environment variable
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let n = 120;
    log::info!(
        "Setting up {}x{} pentadiagonal matrix A and sin vector b...",
        n,
        n
    );
    let system = LinearSystem::new(create_pentadiagonal_matrix(n), create_sin_vector(n))
        .expect("Failed to build linear system");

    let algorithm = CramersRule::new();

    let start_time = Instant::now();
    let sequential = algorithm.solve(&CpuDevice::default(), &system);
    let sequential_time = start_time.elapsed();

    let device = ProcessDevice::default();
    log::info!("Running with {} worker processes at a time", device.max_concurrent_workers);
    let start_time = Instant::now();
    let parallel = algorithm.solve(&device, &system);
    let parallel_time = start_time.elapsed();

    match (sequential, parallel) {
        (Ok(seq), Ok(par)) => {
            log::info!("\nSolver finished successfully!");
            log::info!(
                "  Sequential: {:?} ({} determinants)",
                sequential_time,
                seq.metadata.determinants_evaluated
            );
            log::info!(
                "  Parallel:   {:?} ({} workers in {} waves, {} failed)",
                parallel_time,
                par.metadata.workers_spawned,
                par.metadata.waves,
                par.metadata.failed_workers
            );
            match system.max_residual(&par.solution.x) {
                Ok(residual) => log::info!("  Max residual |Ax - b|: {:.6e}", residual),
                Err(e) => log::error!("Residual check failed: {:?}", e),
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            log::error!("\nSolver failed: {:?}", e);
        }
    }
}
