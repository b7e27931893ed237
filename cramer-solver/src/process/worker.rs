//! Forked worker processes.
//!
//! A worker is a `fork()` of the coordinator that runs one closure, sends the
//! outcome through its own [`ResultSender`](super::channel::ResultSender) and
//! leaves with `_exit`. The child never returns into the caller's stack, never
//! runs destructors and never logs.

use super::channel::{result_channel, Received, ResultReceiver, WorkerResult};
use cramer_core::error::{CramerCoreError, Result};
use log::{debug, warn};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;
use std::time::Instant;

/// Held from pipe creation until the parent has closed its copy of the write
/// end. A fork from another thread in that window would inherit the write end
/// and keep the channel open after this worker exits.
static SPAWN_LOCK: Mutex<()> = Mutex::new(());

/// Exit status of a worker whose closure returned an error.
const EXIT_COMPUTE_ERROR: libc::c_int = 2;
/// Exit status of a worker whose closure panicked.
const EXIT_PANIC: libc::c_int = 3;
/// Exit status of a worker that could not write to its channel.
const EXIT_SEND_FAILED: libc::c_int = 4;

/// How a reaped worker ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExitStatus {
    Exited(i32),
    Signaled(i32),
    Unknown,
}

/// Coordinator-side handle of one running worker.
///
/// Dropping a handle that was not collected kills and reaps the process, so
/// an early return from the coordinator never leaks children.
#[derive(Debug)]
pub(crate) struct WorkerHandle {
    index: usize,
    pid: libc::pid_t,
    receiver: ResultReceiver,
    spawned_at: Instant,
    reaped: bool,
}

impl WorkerHandle {
    /// Forks a worker computing the value of unknown `index` with `body`.
    pub(crate) fn spawn<F>(index: usize, body: F) -> Result<Self>
    where
        F: FnOnce() -> Result<f64>,
    {
        let guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let (receiver, sender) = result_channel()?;

        let pid = unsafe { libc::fork() };
        if pid < 0 {
            return Err(CramerCoreError::ResourceExhaustion(format!(
                "Cannot spawn worker for index {}: {}",
                index,
                io::Error::last_os_error()
            )));
        }

        if pid == 0 {
            drop(receiver);
            let code = match panic::catch_unwind(AssertUnwindSafe(body)) {
                Ok(Ok(value)) => match sender.send(WorkerResult::computed(index, value)) {
                    Ok(()) => 0,
                    Err(_) => EXIT_SEND_FAILED,
                },
                Ok(Err(_)) => EXIT_COMPUTE_ERROR,
                Err(_) => EXIT_PANIC,
            };
            // SAFETY: terminates the child without unwinding into the parent's frames.
            unsafe { libc::_exit(code) }
        }

        drop(sender);
        drop(guard);
        debug!("Spawned worker pid {} for index {}", pid, index);
        Ok(Self {
            index,
            pid,
            receiver,
            spawned_at: Instant::now(),
            reaped: false,
        })
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn spawned_at(&self) -> Instant {
        self.spawned_at
    }

    /// Waits for the worker's result until `deadline`, then reaps the process.
    ///
    /// Never fails: anything other than a well-formed result for this index
    /// becomes [`WorkerResult::failed`].
    pub(crate) fn collect(mut self, deadline: Option<Instant>) -> WorkerResult {
        let index = self.index;
        let result = match self.receiver.receive(deadline) {
            Ok(Received::Delivered(msg)) if msg.index == index && msg.ok => msg,
            Ok(Received::Delivered(msg)) => {
                warn!(
                    "Worker pid {} sent a malformed result for index {}: {:?}",
                    self.pid, index, msg
                );
                WorkerResult::failed(index)
            }
            Ok(Received::Closed) => {
                warn!(
                    "Worker pid {} for index {} terminated without a result",
                    self.pid, index
                );
                WorkerResult::failed(index)
            }
            Ok(Received::TimedOut) => {
                warn!(
                    "Worker pid {} for index {} timed out, killing it",
                    self.pid, index
                );
                self.kill();
                WorkerResult::failed(index)
            }
            Err(e) => {
                warn!(
                    "Reading the channel of worker pid {} (index {}) failed: {}",
                    self.pid, index, e
                );
                self.kill();
                WorkerResult::failed(index)
            }
        };

        match self.reap() {
            ExitStatus::Exited(0) => {}
            status if result.ok => {
                warn!(
                    "Worker pid {} for index {} delivered a result but ended with {:?}",
                    self.pid, index, status
                );
            }
            status => debug!("Worker pid {} for index {} ended with {:?}", self.pid, index, status),
        }
        result
    }

    fn kill(&self) {
        if !self.reaped {
            unsafe {
                libc::kill(self.pid, libc::SIGKILL);
            }
        }
    }

    /// Blocks until the process has exited and collects its status.
    fn reap(&mut self) -> ExitStatus {
        if self.reaped {
            return ExitStatus::Unknown;
        }
        let mut status: libc::c_int = 0;
        loop {
            let rc = unsafe { libc::waitpid(self.pid, &mut status, 0) };
            if rc == self.pid {
                break;
            }
            let err = io::Error::last_os_error();
            if rc < 0 && err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            warn!("waitpid({}) failed: {}", self.pid, err);
            self.reaped = true;
            return ExitStatus::Unknown;
        }
        self.reaped = true;
        if libc::WIFEXITED(status) {
            ExitStatus::Exited(libc::WEXITSTATUS(status))
        } else if libc::WIFSIGNALED(status) {
            ExitStatus::Signaled(libc::WTERMSIG(status))
        } else {
            ExitStatus::Unknown
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        if !self.reaped {
            self.kill();
            self.reap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_worker_delivers_value() {
        let handle = WorkerHandle::spawn(4, || Ok(2.5)).unwrap();
        assert_eq!(handle.index(), 4);
        assert_eq!(handle.collect(None), WorkerResult::computed(4, 2.5));
    }

    #[test]
    fn test_worker_error_is_a_failed_result() {
        let handle = WorkerHandle::spawn(1, || {
            Err(CramerCoreError::Internal("boom".to_string()))
        })
        .unwrap();
        let result = handle.collect(None);
        assert!(!result.ok);
        assert_eq!(result.index, 1);
        assert!(result.value.is_nan());
    }

    #[test]
    fn test_worker_panic_is_a_failed_result() {
        let handle = WorkerHandle::spawn(0, || -> Result<f64> { panic!("worker panic") }).unwrap();
        assert!(!handle.collect(None).ok);
    }

    #[test]
    fn test_hung_worker_is_killed_at_deadline() {
        let handle = WorkerHandle::spawn(0, || loop {
            std::thread::sleep(Duration::from_secs(60));
        })
        .unwrap();
        let deadline = handle.spawned_at() + Duration::from_millis(100);
        let started = Instant::now();
        let result = handle.collect(Some(deadline));
        assert!(!result.ok);
        assert!(started.elapsed() < Duration::from_secs(30));
    }

    #[test]
    fn test_dropping_uncollected_handle_reaps_worker() {
        let handle = WorkerHandle::spawn(0, || loop {
            std::thread::sleep(Duration::from_secs(60));
        })
        .unwrap();
        let pid = handle.pid;
        drop(handle);
        // The child is gone: signalling it fails with ESRCH.
        let rc = unsafe { libc::kill(pid, 0) };
        assert_eq!(rc, -1);
    }

    #[test]
    fn test_concurrent_spawns_do_not_hold_each_others_channels() {
        let spawner = std::thread::spawn(|| {
            (0..16)
                .map(|i| {
                    WorkerHandle::spawn(i, || loop {
                        std::thread::sleep(Duration::from_secs(60));
                    })
                    .unwrap()
                })
                .collect::<Vec<_>>()
        });

        // A crashed worker must read as closed right away. If a sleeping
        // worker had inherited its write end, this would block until the
        // deadline.
        for i in 0..16 {
            let handle = WorkerHandle::spawn(i, || unsafe {
                libc::raise(libc::SIGKILL);
                Ok(0.0)
            })
            .unwrap();
            let started = Instant::now();
            let result = handle.collect(Some(Instant::now() + Duration::from_secs(5)));
            assert!(!result.ok);
            assert!(started.elapsed() < Duration::from_secs(2), "iteration {}", i);
        }

        drop(spawner.join().unwrap());
    }
}
