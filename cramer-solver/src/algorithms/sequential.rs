use cramer_core::{error::Result, CpuDevice, CramerCoreError, LinearSystem, Solution};
use log::{info, warn};

use super::{cramer_ratio, main_determinant, CramersRule, SolveAlgorithm, SolveResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialMetadata {
    /// Eliminations performed, including the one for `det(A)`.
    pub determinants_evaluated: usize,
}

impl SolveAlgorithm<CpuDevice> for CramersRule {
    type Metadata = SequentialMetadata;

    fn solve(
        &self,
        _device: &CpuDevice,
        system: &LinearSystem,
    ) -> Result<SolveResult<Self::Metadata>> {
        let n = system.n();
        info!("Sequential Cramer solve, n = {}", n);

        let det_a = main_determinant(system)?;
        let mut metadata = SequentialMetadata {
            determinants_evaluated: 1,
        };
        if det_a == 0.0 {
            warn!("det(A) is zero, system has no unique solution");
            return Ok(SolveResult {
                solution: Solution::singular(det_a),
                metadata,
            });
        }

        let mut x = Vec::new();
        x.try_reserve_exact(n).map_err(|e| {
            CramerCoreError::ResourceExhaustion(format!("Cannot allocate solution vector: {}", e))
        })?;
        for i in 0..n {
            x.push(cramer_ratio(system, i, det_a)?);
            metadata.determinants_evaluated += 1;
        }

        info!("Sequential Cramer solve finished, det(A) = {}", det_a);
        Ok(SolveResult {
            solution: Solution::computed(x, vec![true; n], det_a),
            metadata,
        })
    }
}
