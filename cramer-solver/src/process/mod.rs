//! Process-level fan-out for the parallel strategy.
//!
//! The coordinator runs the unknowns in waves of at most
//! `max_concurrent_workers` forked processes. Every worker owns a dedicated
//! pipe; results are stored by the index carried in the message.

mod channel;
mod worker;

pub use channel::WorkerResult;

use crate::algorithms::{cramer_ratio, ParallelMetadata};
use cramer_core::{error::Result, LinearSystem, ProcessDevice, WorkerFault};
use log::debug;
use std::time::Duration;
use worker::WorkerHandle;

/// Computes every unknown of `system` in worker processes.
///
/// Returns one [`WorkerResult`] per unknown, ordered by index, plus the
/// bookkeeping of the run.
pub(crate) fn run_workers(
    device: &ProcessDevice,
    system: &LinearSystem,
    det_a: f64,
) -> Result<(Vec<WorkerResult>, ParallelMetadata)> {
    let n = system.n();
    let mut results: Vec<WorkerResult> = (0..n).map(WorkerResult::failed).collect();
    let mut metadata = ParallelMetadata::default();
    let indices: Vec<usize> = (0..n).collect();

    for (wave, chunk) in indices.chunks(device.max_concurrent_workers).enumerate() {
        debug!(
            "Wave {}: spawning {} workers for indices {}..={}",
            wave,
            chunk.len(),
            chunk[0],
            chunk[chunk.len() - 1]
        );
        let mut handles = Vec::with_capacity(chunk.len());
        for &index in chunk {
            let fault = device.fault.filter(|f| f.index() == index);
            // On error the handles spawned so far are dropped, which kills and reaps them.
            let handle =
                WorkerHandle::spawn(index, || worker_body(system, index, det_a, fault))?;
            handles.push(handle);
            metadata.workers_spawned += 1;
        }
        metadata.waves += 1;

        for handle in handles {
            debug!("Waiting for worker of index {}", handle.index());
            let deadline = deadline_for(&handle, device.timeout_per_worker);
            let result = handle.collect(deadline);
            if !result.ok {
                metadata.failed_workers += 1;
            }
            results[result.index] = result;
        }
    }
    Ok((results, metadata))
}

fn deadline_for(handle: &WorkerHandle, timeout: Option<Duration>) -> Option<std::time::Instant> {
    timeout.and_then(|t| handle.spawned_at().checked_add(t))
}

/// Runs inside the forked child.
fn worker_body(
    system: &LinearSystem,
    index: usize,
    det_a: f64,
    fault: Option<WorkerFault>,
) -> Result<f64> {
    match fault {
        Some(WorkerFault::Crash { .. }) => unsafe {
            libc::raise(libc::SIGKILL);
            libc::_exit(1)
        },
        Some(WorkerFault::Hang { .. }) => loop {
            unsafe {
                libc::pause();
            }
        },
        None => cramer_ratio(system, index, det_a),
    }
}
