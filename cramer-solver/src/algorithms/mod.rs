use cramer_core::{
    compute_determinant, device::Device, error::Result, LinearSystem, Solution,
};

pub struct SolveResult<M> {
    pub solution: Solution, // Solution vector, singular flag, per-index status
    pub metadata: M,        // Metadata about the solve process
}

// --- Algorithm Trait Definition ---
/// Trait representing a specific linear system solving algorithm.
/// Generic over the Device (in-process CPU or worker processes) it runs on.
pub trait SolveAlgorithm<D: Device> {
    type Metadata: std::fmt::Debug;

    /// Solves the linear system Ax = b for x.
    ///
    /// # Arguments
    ///
    /// * `device` - The execution device.
    /// * `system` - The validated system `A x = b`.
    ///
    /// # Returns
    ///
    /// A `Result` containing the solution or a `CramerCoreError`. A singular
    /// system is a successful outcome with `solution.singular` set.
    fn solve(&self, device: &D, system: &LinearSystem) -> Result<SolveResult<Self::Metadata>>;
}

// --- Algorithm Implementations ---

pub mod process_parallel; // One forked worker per unknown, bounded waves
pub mod sequential; // Everything on the calling thread

pub use process_parallel::ParallelMetadata;
pub use sequential::SequentialMetadata;

// --- Algorithm Struct Definitions ---

/// Cramer's Rule: `x[i] = det(A_i) / det(A)`, where `A_i` is `A` with column
/// `i` replaced by `b`.
///
/// The strategy is picked by the device: [`cramer_core::CpuDevice`] evaluates
/// the determinants one after another, [`cramer_core::ProcessDevice`] hands
/// each unknown to its own worker process.
#[derive(Debug, Clone, Default)]
pub struct CramersRule {}

impl CramersRule {
    /// Creates a new instance of the Cramer's Rule algorithm.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Determinant of `A`, computed on a copy.
pub(crate) fn main_determinant(system: &LinearSystem) -> Result<f64> {
    compute_determinant(system.a().try_clone()?)
}

/// `det(A_index) / det_a`. Shared by both strategies so they cannot diverge.
pub(crate) fn cramer_ratio(system: &LinearSystem, index: usize, det_a: f64) -> Result<f64> {
    let det_i = compute_determinant(system.substituted(index)?)?;
    Ok(det_i / det_a)
}
