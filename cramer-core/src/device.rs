use crate::error::{CramerCoreError, Result};
use std::time::Duration;

/// Marker trait for execution devices (in-process CPU, worker processes).
pub trait Device: std::fmt::Debug {}

/// Runs every computation on the calling thread.
#[derive(Debug, Clone, Default)]
pub struct CpuDevice {}
impl Device for CpuDevice {}

/// Upper bound on simultaneous worker processes when none is given.
pub const DEFAULT_MAX_WORKERS: usize = 8;

/// Makes one worker misbehave so the failure paths of the coordinator can be
/// exercised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerFault {
    /// The worker for `index` dies before writing its result.
    Crash { index: usize },
    /// The worker for `index` never finishes; only a timeout reclaims it.
    Hang { index: usize },
}

impl WorkerFault {
    pub fn index(&self) -> usize {
        match *self {
            WorkerFault::Crash { index } | WorkerFault::Hang { index } => index,
        }
    }
}

/// Runs each unknown of a solve in its own forked OS process.
#[derive(Debug, Clone)]
pub struct ProcessDevice {
    /// Maximum number of worker processes alive at the same time.
    pub max_concurrent_workers: usize,
    /// A worker still running this long after it was spawned is killed.
    pub timeout_per_worker: Option<Duration>,
    pub fault: Option<WorkerFault>,
}

impl Default for ProcessDevice {
    fn default() -> Self {
        Self {
            max_concurrent_workers: DEFAULT_MAX_WORKERS,
            timeout_per_worker: None,
            fault: None,
        }
    }
}

impl Device for ProcessDevice {}

impl ProcessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(max_concurrent_workers: usize, timeout_per_worker: Option<Duration>) -> Self {
        Self {
            max_concurrent_workers,
            timeout_per_worker,
            fault: None,
        }
    }

    pub fn with_fault(mut self, fault: WorkerFault) -> Self {
        self.fault = Some(fault);
        self
    }

    /// Rejects a zero worker bound.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_workers == 0 {
            return Err(CramerCoreError::InvalidInput(
                "max_concurrent_workers must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
