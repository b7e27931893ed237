//! One-shot result channel between a worker process and the coordinator.
//!
//! Each worker gets its own anonymous pipe. The worker writes a single
//! fixed-size [`WireResult`] and exits; the coordinator is the only reader.

use bytemuck::{Pod, Zeroable};
use cramer_core::error::{CramerCoreError, Result};
use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::time::Instant;

/// The value one worker computed for one unknown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkerResult {
    pub index: usize,
    pub value: f64,
    pub ok: bool,
}

impl WorkerResult {
    pub fn computed(index: usize, value: f64) -> Self {
        Self {
            index,
            value,
            ok: true,
        }
    }

    /// Placeholder for a worker that ended without delivering a value.
    pub fn failed(index: usize) -> Self {
        Self {
            index,
            value: f64::NAN,
            ok: false,
        }
    }
}

/// Byte layout of a [`WorkerResult`] on the pipe.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub(crate) struct WireResult {
    index: u64,
    value: f64,
    ok: u32,
    _pad: u32,
}

pub(crate) const WIRE_SIZE: usize = std::mem::size_of::<WireResult>();

impl From<WorkerResult> for WireResult {
    fn from(r: WorkerResult) -> Self {
        Self {
            index: r.index as u64,
            value: r.value,
            ok: u32::from(r.ok),
            _pad: 0,
        }
    }
}

impl From<WireResult> for WorkerResult {
    fn from(w: WireResult) -> Self {
        Self {
            index: w.index as usize,
            value: w.value,
            ok: w.ok == 1,
        }
    }
}

/// What the coordinator observed on a channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Received {
    Delivered(WorkerResult),
    /// The write end closed before a full message arrived.
    Closed,
    TimedOut,
}

/// Creates a connected (receiver, sender) pair.
pub(crate) fn result_channel() -> Result<(ResultReceiver, ResultSender)> {
    let mut fds = [0 as libc::c_int; 2];
    if unsafe { libc::pipe(fds.as_mut_ptr()) } < 0 {
        return Err(CramerCoreError::ResourceExhaustion(format!(
            "Cannot create result channel: {}",
            io::Error::last_os_error()
        )));
    }
    // SAFETY: pipe() succeeded, so both descriptors are open and owned by us.
    let (read_end, write_end) = unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };
    Ok((
        ResultReceiver {
            file: File::from(read_end),
            buf: [0; WIRE_SIZE],
            filled: 0,
        },
        ResultSender {
            file: File::from(write_end),
        },
    ))
}

/// Write end, owned by the worker.
#[derive(Debug)]
pub(crate) struct ResultSender {
    file: File,
}

impl ResultSender {
    pub(crate) fn send(mut self, result: WorkerResult) -> io::Result<()> {
        let wire = WireResult::from(result);
        self.file.write_all(bytemuck::bytes_of(&wire))
    }
}

/// Read end, owned by the coordinator.
#[derive(Debug)]
pub(crate) struct ResultReceiver {
    file: File,
    buf: [u8; WIRE_SIZE],
    filled: usize,
}

impl ResultReceiver {
    /// Blocks until a full message arrives, the sender goes away, or `deadline`
    /// passes.
    ///
    /// Once the deadline has passed the channel is still drained without
    /// blocking, so a result written in time is delivered even when it is
    /// collected late.
    pub(crate) fn receive(&mut self, deadline: Option<Instant>) -> io::Result<Received> {
        loop {
            let (timeout_ms, expired) = match deadline {
                None => (-1, false),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        (0, true)
                    } else {
                        // Round up so poll never wakes just before the deadline.
                        let remaining = deadline - now;
                        let ms = remaining.as_millis()
                            + u128::from(remaining.subsec_nanos() % 1_000_000 != 0);
                        (ms.min(libc::c_int::MAX as u128) as libc::c_int, false)
                    }
                }
            };

            let mut pfd = libc::pollfd {
                fd: self.file.as_raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            };
            let rc = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
            if rc < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            if rc == 0 {
                if expired {
                    return Ok(Received::TimedOut);
                }
                continue;
            }

            match self.file.read(&mut self.buf[self.filled..]) {
                Ok(0) => return Ok(Received::Closed),
                Ok(n) => {
                    self.filled += n;
                    if self.filled == WIRE_SIZE {
                        let wire: WireResult = bytemuck::pod_read_unaligned(&self.buf);
                        return Ok(Received::Delivered(wire.into()));
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}
