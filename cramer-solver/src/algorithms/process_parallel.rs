use cramer_core::{error::Result, LinearSystem, ProcessDevice, Solution};
use log::{info, warn};

use super::{main_determinant, CramersRule, SolveAlgorithm, SolveResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelMetadata {
    pub workers_spawned: usize,
    pub waves: usize,
    /// Workers that crashed, misbehaved or were killed on timeout.
    pub failed_workers: usize,
}

impl SolveAlgorithm<ProcessDevice> for CramersRule {
    type Metadata = ParallelMetadata;

    fn solve(
        &self,
        device: &ProcessDevice,
        system: &LinearSystem,
    ) -> Result<SolveResult<Self::Metadata>> {
        device.validate()?;
        let n = system.n();
        info!(
            "Process-parallel Cramer solve, n = {}, max_concurrent_workers = {}, timeout = {:?}",
            n, device.max_concurrent_workers, device.timeout_per_worker
        );

        let det_a = main_determinant(system)?;
        if det_a == 0.0 {
            warn!("det(A) is zero, system has no unique solution");
            return Ok(SolveResult {
                solution: Solution::singular(det_a),
                metadata: ParallelMetadata::default(),
            });
        }

        let (x, per_index_ok, metadata) = run_workers(device, system, det_a)?;
        if metadata.failed_workers > 0 {
            warn!(
                "{} of {} workers failed; their unknowns are marked as not computed",
                metadata.failed_workers, n
            );
        }
        info!(
            "Process-parallel Cramer solve finished in {} waves, det(A) = {}",
            metadata.waves, det_a
        );
        Ok(SolveResult {
            solution: Solution::computed(x, per_index_ok, det_a),
            metadata,
        })
    }
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        fn run_workers(
            device: &ProcessDevice,
            system: &LinearSystem,
            det_a: f64,
        ) -> Result<(Vec<f64>, Vec<bool>, ParallelMetadata)> {
            let (results, metadata) = crate::process::run_workers(device, system, det_a)?;
            let (x, per_index_ok) = results.iter().map(|r| (r.value, r.ok)).unzip();
            Ok((x, per_index_ok, metadata))
        }
    } else {
        fn run_workers(
            _device: &ProcessDevice,
            _system: &LinearSystem,
            _det_a: f64,
        ) -> Result<(Vec<f64>, Vec<bool>, ParallelMetadata)> {
            Err(cramer_core::CramerCoreError::UnsupportedOperation(
                "Process-parallel solving requires fork() (unix only)".to_string(),
            ))
        }
    }
}
